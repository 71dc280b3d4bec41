//! Schedule rule parsing and evaluation

use regex::Regex;
use std::fmt;
use std::path::Path;
use time::OffsetDateTime;

use super::cache::MatcherCache;
use crate::cache::{CachedFile, Reloading};
use crate::error::{Error, Result};
use crate::lines::content_lines;

/// The calendar values a rule's five schedule fields are checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleTime {
    pub minute: i32,
    pub hour: i32,
    pub day_of_month: i32,
    pub month: i32,
    /// 0 = Sunday
    pub day_of_week: i32,
}

impl From<OffsetDateTime> for ScheduleTime {
    fn from(at: OffsetDateTime) -> Self {
        Self {
            minute: i32::from(at.minute()),
            hour: i32::from(at.hour()),
            day_of_month: i32::from(at.day()),
            month: i32::from(u8::from(at.month())),
            day_of_week: i32::from(at.weekday().number_days_from_sunday()),
        }
    }
}

/// One line of a schedule file
///
/// The schedule fields are kept as text and resolved through the shared
/// [`MatcherCache`] when evaluated.
#[derive(Debug, Clone)]
pub struct Rule {
    line: usize,
    minute: String,
    hour: String,
    day_of_month: String,
    month: String,
    day_of_week: String,
    host_pattern: String,
    host_regex: Regex,
}

impl Rule {
    /// Parse `minute hour day-of-month month day-of-week host-regex`.
    ///
    /// The host regex is whatever follows the fifth field.
    pub fn parse(line: usize, text: &str) -> Result<Self> {
        let (minute, rest) = next_token(text);
        let (hour, rest) = next_token(rest);
        let (day_of_month, rest) = next_token(rest);
        let (month, rest) = next_token(rest);
        let (day_of_week, host_pattern) = next_token(rest);

        let fields = [minute, hour, day_of_month, month, day_of_week, host_pattern];
        if fields.iter().any(|f| f.is_empty()) {
            return Err(Error::invalid_rule(
                line,
                format!("expected 5 schedule fields and a host pattern in {:?}", text),
            ));
        }

        for field in &fields[..5] {
            MatcherCache::global()
                .get(field)
                .map_err(|e| Error::invalid_rule(line, format!("field {:?}: {}", field, e)))?;
        }

        let host_regex = Regex::new(host_pattern).map_err(|e| {
            Error::invalid_rule(line, format!("host pattern {:?}: {}", host_pattern, e))
        })?;

        Ok(Self {
            line,
            minute: minute.to_string(),
            hour: hour.to_string(),
            day_of_month: day_of_month.to_string(),
            month: month.to_string(),
            day_of_week: day_of_week.to_string(),
            host_pattern: host_pattern.to_string(),
            host_regex,
        })
    }

    /// Line number in the file this rule came from
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn host_pattern(&self) -> &str {
        &self.host_pattern
    }

    /// Check the schedule fields against `at`
    pub fn matches_schedule(&self, at: &ScheduleTime) -> Result<bool> {
        let cache = MatcherCache::global();
        Ok(cache.get(&self.minute)?.matches(at.minute)
            && cache.get(&self.hour)?.matches(at.hour)
            && cache.get(&self.day_of_month)?.matches(at.day_of_month)
            && cache.get(&self.month)?.matches(at.month)
            && cache.get(&self.day_of_week)?.matches(at.day_of_week))
    }

    /// Unanchored search of the host pattern in `host`
    pub fn matches_host(&self, host: &str) -> bool {
        self.host_regex.is_match(host)
    }

    pub fn matches(&self, at: &ScheduleTime, host: &str) -> Result<bool> {
        Ok(self.matches_schedule(at)? && self.matches_host(host))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.minute,
            self.hour,
            self.day_of_month,
            self.month,
            self.day_of_week,
            self.host_pattern
        )
    }
}

/// Split off the first space- or tab-delimited token, trimming the rest
fn next_token(input: &str) -> (&str, &str) {
    match input.split_once([' ', '\t']) {
        Some((token, rest)) => (token, rest.trim()),
        None => (input, ""),
    }
}

/// Parse a whole schedule file, keeping rules in file order
pub fn parse_rules(data: &[u8]) -> Result<Vec<Rule>> {
    let text = std::str::from_utf8(data)
        .map_err(|e| Error::config(format!("rule file is not valid UTF-8: {}", e)))?;
    content_lines(text)
        .map(|(line, content)| Rule::parse(line, content))
        .collect()
}

/// An ordered, hot-reloaded list of schedule rules
pub struct RuleSet {
    rules: Reloading<Vec<Rule>>,
}

impl RuleSet {
    /// Load a schedule file with the default reload interval
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(CachedFile::open(path)?)
    }

    /// Build a rule set on an already opened file
    pub fn new(file: CachedFile) -> Result<Self> {
        let rules = Reloading::new(file, parse_rules)?;
        tracing::info!(
            path = %rules.file().path().display(),
            rules = rules.get()?.len(),
            "Loaded schedule rules"
        );
        Ok(Self { rules })
    }

    pub fn path(&self) -> &Path {
        self.rules.file().path()
    }

    /// Number of rules after picking up any file change
    pub fn rule_count(&self) -> Result<usize> {
        Ok(self.rules.get()?.len())
    }

    /// Find the first rule, in file order, matching both `now` and `host`.
    ///
    /// The file is checked for changes before evaluating.
    pub fn matches_time(&self, now: OffsetDateTime, host: &str) -> Result<Option<Rule>> {
        let at = ScheduleTime::from(now);
        let rules = self.rules.get()?;
        for rule in rules.iter() {
            if rule.matches(&at, host)? {
                return Ok(Some(rule.clone()));
            }
        }
        Ok(None)
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("path", &self.path())
            .finish()
    }
}
