//! The entry point a proxy engine holds on to
//!
//! [`AccessGate`] bundles the access policy with the optional user list. The
//! engine calls [`AccessGate::authorize`] once per Basic auth challenge and
//! [`AccessGate::decide`] once per HTTP request or CONNECT attempt. Every
//! method is safe to call from many threads at once.

use std::fmt;
use std::path::PathBuf;
use time::OffsetDateTime;

use crate::config::Config;
use crate::credentials::CredentialStore;
use crate::error::Result;
use crate::policy::{AccessPolicy, Decision};
use crate::schedule::RuleSet;

pub struct AccessGate {
    policy: AccessPolicy,
    credentials: Option<CredentialStore>,
}

impl AccessGate {
    pub fn new(policy: AccessPolicy, credentials: Option<CredentialStore>) -> Self {
        Self {
            policy,
            credentials,
        }
    }

    /// Load every configured list file.
    ///
    /// Fails if an explicitly configured file is missing or any loaded file
    /// does not parse.
    pub fn from_config(config: &Config) -> Result<Self> {
        let lists = config.lists.resolve()?;

        let blacklist = lists.blacklist.as_ref().map(RuleSet::load).transpose()?;
        let whitelist = lists.whitelist.as_ref().map(RuleSet::load).transpose()?;
        let credentials = lists
            .userlist
            .as_ref()
            .map(CredentialStore::load)
            .transpose()?;

        let policy = AccessPolicy::new(blacklist, whitelist, lists.default_allow)
            .with_logging(config.logging.decisions());

        tracing::info!(
            default = if policy.default_allow() { "accept" } else { "reject" },
            authentication = credentials.is_some(),
            "Access gate ready"
        );

        Ok(Self::new(policy, credentials))
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn credentials(&self) -> Option<&CredentialStore> {
        self.credentials.as_ref()
    }

    /// Check a `Proxy-Authorization` header; always passes without a user list
    pub fn authorize(&self, header: Option<&str>) -> Result<bool> {
        match &self.credentials {
            Some(store) => store.authorize(header),
            None => Ok(true),
        }
    }

    pub fn decide(&self, now: OffsetDateTime, host: &str) -> Result<Decision> {
        self.policy.decide(now, host)
    }

    pub fn decide_now(&self, host: &str) -> Result<Decision> {
        self.policy.decide_now(host)
    }

    /// Current state of every loaded file
    pub fn summary(&self) -> Result<GateSummary> {
        let userlist = match &self.credentials {
            Some(store) => Some((store.path().to_path_buf(), store.user_count()?)),
            None => None,
        };

        Ok(GateSummary {
            blacklist: rule_set_entry(self.policy.blacklist())?,
            whitelist: rule_set_entry(self.policy.whitelist())?,
            userlist,
            default_allow: self.policy.default_allow(),
        })
    }
}

fn rule_set_entry(set: Option<&RuleSet>) -> Result<Option<(PathBuf, usize)>> {
    match set {
        Some(set) => Ok(Some((set.path().to_path_buf(), set.rule_count()?))),
        None => Ok(None),
    }
}

/// Loaded files with their rule or user counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateSummary {
    pub blacklist: Option<(PathBuf, usize)>,
    pub whitelist: Option<(PathBuf, usize)>,
    pub userlist: Option<(PathBuf, usize)>,
    pub default_allow: bool,
}

impl fmt::Display for GateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = [
            ("Blacklist", &self.blacklist, "rules"),
            ("Whitelist", &self.whitelist, "rules"),
            ("Userlist", &self.userlist, "users"),
        ];
        for (label, entry, unit) in entries {
            match entry {
                Some((path, count)) => {
                    writeln!(f, "  {}: {} ({} {})", label, path.display(), count, unit)?
                }
                None => writeln!(f, "  {}: disabled", label)?,
            }
        }
        write!(
            f,
            "  Default: {}",
            if self.default_allow { "accept" } else { "reject" }
        )
    }
}
