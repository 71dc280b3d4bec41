//! Allow/deny decisions from a blacklist, a whitelist and a default
//!
//! # Evaluation order
//!
//! 1. Blacklist: the first matching rule denies
//! 2. Whitelist: the first matching rule allows
//! 3. Otherwise the default applies
//!
//! With only a blacklist configured the default is forced to allow; with only
//! a whitelist it is forced to deny. The same decision serves plain HTTP
//! requests and CONNECT tunnels; only the host and the time matter.

use std::fmt;
use time::OffsetDateTime;

use crate::error::Result;
use crate::schedule::{Rule, RuleSet};

/// Which list a matched rule came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Blacklist,
    Whitelist,
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListKind::Blacklist => f.write_str("blacklist"),
            ListKind::Whitelist => f.write_str("whitelist"),
        }
    }
}

/// A rule that decided a request
#[derive(Debug, Clone)]
pub struct MatchedRule {
    pub list: ListKind,
    pub rule: Rule,
}

/// Outcome of [`AccessPolicy::decide`]
#[derive(Debug, Clone)]
pub struct Decision {
    pub allowed: bool,
    /// `None` when the default applied
    pub matched: Option<MatchedRule>,
}

impl Decision {
    pub fn is_default(&self) -> bool {
        self.matched.is_none()
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.allowed { "Accepted" } else { "Denied" };
        match &self.matched {
            Some(m) => write!(f, "{} by {} rule `{}`", verdict, m.list, m.rule),
            None => write!(f, "{} by default", verdict),
        }
    }
}

/// Which decisions are written to the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionLogging {
    pub allowed: bool,
    pub blocked: bool,
}

impl Default for DecisionLogging {
    fn default() -> Self {
        Self {
            allowed: true,
            blocked: true,
        }
    }
}

/// Combines the optional lists and the default into one verdict
#[derive(Debug)]
pub struct AccessPolicy {
    blacklist: Option<RuleSet>,
    whitelist: Option<RuleSet>,
    default_allow: bool,
    logging: DecisionLogging,
}

impl AccessPolicy {
    /// Build a policy, inferring the default when only one list is present.
    ///
    /// `default_allow` is used as given when both lists or neither are set.
    pub fn new(blacklist: Option<RuleSet>, whitelist: Option<RuleSet>, default_allow: bool) -> Self {
        let default_allow = match (&blacklist, &whitelist) {
            (Some(_), None) => true,
            (None, Some(_)) => false,
            _ => default_allow,
        };

        Self {
            blacklist,
            whitelist,
            default_allow,
            logging: DecisionLogging::default(),
        }
    }

    pub fn with_logging(mut self, logging: DecisionLogging) -> Self {
        self.logging = logging;
        self
    }

    /// The verdict when no rule matches
    pub fn default_allow(&self) -> bool {
        self.default_allow
    }

    pub fn blacklist(&self) -> Option<&RuleSet> {
        self.blacklist.as_ref()
    }

    pub fn whitelist(&self) -> Option<&RuleSet> {
        self.whitelist.as_ref()
    }

    /// Decide whether `host` may be reached at `now`.
    ///
    /// Errors only when a rule file changed on disk and can no longer be
    /// loaded; the caller must treat that as fatal.
    pub fn decide(&self, now: OffsetDateTime, host: &str) -> Result<Decision> {
        let decision = self.evaluate(now, host)?;
        self.log(host, &decision);
        Ok(decision)
    }

    /// [`decide`](Self::decide) at the current local time (UTC if the local
    /// offset is unknown)
    pub fn decide_now(&self, host: &str) -> Result<Decision> {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        self.decide(now, host)
    }

    fn evaluate(&self, now: OffsetDateTime, host: &str) -> Result<Decision> {
        if let Some(blacklist) = &self.blacklist {
            if let Some(rule) = blacklist.matches_time(now, host)? {
                return Ok(Decision {
                    allowed: false,
                    matched: Some(MatchedRule {
                        list: ListKind::Blacklist,
                        rule,
                    }),
                });
            }
        }

        if let Some(whitelist) = &self.whitelist {
            if let Some(rule) = whitelist.matches_time(now, host)? {
                return Ok(Decision {
                    allowed: true,
                    matched: Some(MatchedRule {
                        list: ListKind::Whitelist,
                        rule,
                    }),
                });
            }
        }

        Ok(Decision {
            allowed: self.default_allow,
            matched: None,
        })
    }

    fn log(&self, host: &str, decision: &Decision) {
        let enabled = if decision.allowed {
            self.logging.allowed
        } else {
            self.logging.blocked
        };
        if enabled {
            tracing::info!(host = %host, "{}", decision);
        }
    }
}
