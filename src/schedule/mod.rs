//! Time-scheduled host rules

mod cache;
pub mod matcher;
mod rules;

pub use cache::MatcherCache;
pub use matcher::Matcher;
pub use rules::{parse_rules, Rule, RuleSet, ScheduleTime};
