//! Cron-style schedule field matching

use crate::error::{Error, Result};

/// A compiled predicate over one schedule field value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// `*`, accepts every value
    Wildcard,
    /// A bare number
    Single(i32),
    /// `low-high`, both bounds inclusive. An inverted range matches nothing.
    Range { low: i32, high: i32 },
    And(Box<Matcher>, Box<Matcher>),
    Or(Box<Matcher>, Box<Matcher>),
}

impl Matcher {
    /// Compile a schedule field.
    ///
    /// Grammar:
    /// - `*` matches any value
    /// - `5` matches exactly 5
    /// - `9-17` matches 9 through 17
    /// - `1,3,5-7` matches the union of its comma-separated parts
    pub fn parse(field: &str) -> Result<Self> {
        if field == "*" {
            return Ok(Matcher::Wildcard);
        }

        field
            .split(',')
            .map(Self::parse_token)
            .try_fold(None, |acc, next| -> Result<Option<Matcher>> {
                let next = next?;
                Ok(Some(match acc {
                    None => next,
                    Some(acc) => acc.or(next),
                }))
            })?
            .ok_or_else(|| Error::schedule(format!("empty field {:?}", field)))
    }

    fn parse_token(token: &str) -> Result<Self> {
        match token.split_once('-') {
            None => Ok(Matcher::Single(parse_number(token)?)),
            Some((low, high)) => {
                if high.contains('-') {
                    return Err(Error::schedule(format!("invalid range {:?}", token)));
                }
                Ok(Matcher::Range {
                    low: parse_number(low)?,
                    high: parse_number(high)?,
                })
            }
        }
    }

    /// Combine with another matcher; both must accept
    pub fn and(self, other: Matcher) -> Self {
        Matcher::And(Box::new(self), Box::new(other))
    }

    /// Combine with another matcher; either may accept
    pub fn or(self, other: Matcher) -> Self {
        Matcher::Or(Box::new(self), Box::new(other))
    }

    /// Check whether the value is accepted
    pub fn matches(&self, value: i32) -> bool {
        match self {
            Matcher::Wildcard => true,
            Matcher::Single(expected) => *expected == value,
            Matcher::Range { low, high } => *low <= value && value <= *high,
            Matcher::And(left, right) => left.matches(value) && right.matches(value),
            Matcher::Or(left, right) => left.matches(value) || right.matches(value),
        }
    }
}

fn parse_number(text: &str) -> Result<i32> {
    text.parse()
        .map_err(|_| Error::schedule(format!("invalid number {:?}", text)))
}
