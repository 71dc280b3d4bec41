//! Curfew - time-scheduled access control for a forward proxy
//!
//! This crate is the decision core a forward proxy consults for every
//! request: whether a host may be reached right now, and whether a client's
//! proxy credentials are valid. Networking stays with the proxy engine.
//!
//! # Features
//!
//! - **Scheduled host rules**: cron-style `minute hour day month weekday`
//!   fields bound to a host regex, one rule per line
//! - **Blacklist and whitelist**: the blacklist always wins, the default
//!   verdict is inferred when only one list is configured
//! - **Proxy authentication**: `user:password` list checked against Basic auth
//! - **Hot reload**: every file is re-read shortly after it changes on disk
//!
//! # Example
//!
//! ```no_run
//! use curfew::{AccessGate, Config};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("curfew.toml")?;
//!     let gate = AccessGate::from_config(&config)?;
//!     let decision = gate.decide_now("www.youtube.com")?;
//!     println!("{}", decision);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gate;
mod lines;
pub mod policy;
pub mod schedule;

pub use cache::{CachedFile, Reloading, Snapshot, DEFAULT_RELOAD_INTERVAL};
pub use config::Config;
pub use credentials::CredentialStore;
pub use error::{Error, Result};
pub use gate::{AccessGate, GateSummary};
pub use policy::{AccessPolicy, Decision, DecisionLogging, ListKind, MatchedRule};
pub use schedule::{Matcher, MatcherCache, Rule, RuleSet, ScheduleTime};
