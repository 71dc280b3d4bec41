//! Memoized schedule field compilation
//!
//! Every distinct field text is compiled once and shared by all rules and all
//! rule files for the lifetime of the process. Entries are never evicted.

use dashmap::DashMap;
use std::sync::{Arc, LazyLock};

use super::matcher::Matcher;
use crate::error::Result;

static GLOBAL: LazyLock<MatcherCache> = LazyLock::new(MatcherCache::new);

/// Concurrent map from field text to its compiled matcher
#[derive(Debug, Default)]
pub struct MatcherCache {
    compiled: DashMap<String, Arc<Matcher>>,
}

impl MatcherCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache shared by every rule set
    pub fn global() -> &'static MatcherCache {
        &GLOBAL
    }

    /// Look up the matcher for `field`, compiling and storing it on first use.
    ///
    /// Concurrent first uses of the same text may each compile, but only one
    /// result is stored and every caller gets that one.
    pub fn get(&self, field: &str) -> Result<Arc<Matcher>> {
        if let Some(existing) = self.compiled.get(field) {
            return Ok(Arc::clone(existing.value()));
        }

        let matcher = Arc::new(Matcher::parse(field)?);
        let entry = self.compiled.entry(field.to_string()).or_insert(matcher);
        Ok(Arc::clone(entry.value()))
    }

    /// Number of distinct fields compiled so far
    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}
