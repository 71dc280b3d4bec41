//! Error types for curfew

/// Main error type for the decision core
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid schedule field: {0}")]
    Schedule(String),

    #[error("Invalid rule on line {line}: {reason}")]
    InvalidRule { line: usize, reason: String },
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub fn schedule(msg: impl Into<String>) -> Self {
        Error::Schedule(msg.into())
    }

    pub fn invalid_rule(line: usize, reason: impl Into<String>) -> Self {
        Error::InvalidRule {
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
