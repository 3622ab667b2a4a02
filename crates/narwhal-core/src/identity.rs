//! Hierarchical identifier allocation.
//!
//! Every element identifier is derived from its parent: `parent + "-" + suffix`. The allocator
//! records what it has issued so that collisions can be rejected, renamed or merely reported,
//! depending on the [`IdPolicy`] the owning graph was created with.

use crate::error::{Error, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// What to do when a derived identifier was already issued in the same graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdPolicy {
    /// Legacy behavior: duplicates are issued as-is and only counted.
    #[default]
    Unchecked,
    /// Duplicates are rejected with [`Error::DuplicateIdentifier`].
    Strict,
    /// Duplicates get the first free `_1`, `_2`, ... suffix.
    AutoSuffix,
}

#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    policy: IdPolicy,
    issued: FxHashMap<String, usize>,
}

impl IdAllocator {
    pub fn new(policy: IdPolicy) -> Self {
        Self {
            policy,
            issued: FxHashMap::default(),
        }
    }

    pub fn policy(&self) -> IdPolicy {
        self.policy
    }

    /// The raw derivation rule, without any bookkeeping.
    pub fn derive(parent: &str, suffix: &str) -> String {
        let mut out = String::with_capacity(parent.len() + suffix.len() + 1);
        out.push_str(parent);
        out.push('-');
        out.push_str(suffix);
        out
    }

    /// Derives `parent-suffix` and claims it under the allocator's policy.
    pub fn allocate(&mut self, parent: &str, suffix: &str) -> Result<String> {
        self.claim(Self::derive(parent, suffix))
    }

    /// Claims a fully formed identifier (used for the root and for decoded graphs).
    pub fn claim(&mut self, identifier: String) -> Result<String> {
        match self.policy {
            IdPolicy::Unchecked => {
                *self.issued.entry(identifier.clone()).or_insert(0) += 1;
                Ok(identifier)
            }
            IdPolicy::Strict => {
                if self.issued.contains_key(&identifier) {
                    return Err(Error::DuplicateIdentifier { identifier });
                }
                self.issued.insert(identifier.clone(), 1);
                Ok(identifier)
            }
            IdPolicy::AutoSuffix => {
                if !self.issued.contains_key(&identifier) {
                    self.issued.insert(identifier.clone(), 1);
                    return Ok(identifier);
                }
                let mut n: usize = 1;
                loop {
                    let candidate = format!("{identifier}_{n}");
                    if !self.issued.contains_key(&candidate) {
                        self.issued.insert(candidate.clone(), 1);
                        tracing::trace!(%identifier, %candidate, "renamed colliding identifier");
                        return Ok(candidate);
                    }
                    n += 1;
                }
            }
        }
    }

    /// Records an identifier without ever renaming it. Only strict mode rejects duplicates.
    pub fn record(&mut self, identifier: &str) -> Result<()> {
        if self.policy == IdPolicy::Strict && self.issued.contains_key(identifier) {
            return Err(Error::DuplicateIdentifier {
                identifier: identifier.to_string(),
            });
        }
        *self.issued.entry(identifier.to_string()).or_insert(0) += 1;
        Ok(())
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.issued.contains_key(identifier)
    }

    /// How many times `identifier` was handed out. Only unchecked mode can exceed 1.
    pub fn issue_count(&self, identifier: &str) -> usize {
        self.issued.get(identifier).copied().unwrap_or(0)
    }

    /// Identifiers that were issued more than once, sorted.
    pub fn collisions(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .issued
            .iter()
            .filter(|(_, n)| **n > 1)
            .map(|(id, _)| id.as_str())
            .collect();
        out.sort_unstable();
        out
    }

    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }
}
