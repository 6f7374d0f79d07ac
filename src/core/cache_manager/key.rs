//! Cache key derivation
//!
//! Keys have the shape `{prefix}:{namespace}:{sha256-hex}`. Query keys hash
//! the normalized prompt together with the sorted provider set, so the same
//! question asked of the same providers always lands on one entry.

use crate::core::providers::ProviderId;
use sha2::{Digest, Sha256};
use std::fmt;

/// Key namespaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheNamespace {
    Query,
    Analysis(String),
    Summary,
    Dedup,
    Lock,
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheNamespace::Query => f.write_str("query"),
            CacheNamespace::Analysis(kind) => write!(f, "analysis:{}", kind),
            CacheNamespace::Summary => f.write_str("summary"),
            CacheNamespace::Dedup => f.write_str("dedup"),
            CacheNamespace::Lock => f.write_str("lock"),
        }
    }
}

/// A fully-qualified backend key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key from a namespace and arbitrary identifying text
    pub fn new(prefix: &str, namespace: CacheNamespace, identity: &str) -> Self {
        Self(format!("{}:{}:{}", prefix, namespace, digest(identity)))
    }

    /// Key of a prompt asked of a set of providers
    pub fn query(prefix: &str, prompt: &str, providers: &[ProviderId]) -> Self {
        let mut ids: Vec<&str> = providers.iter().map(|p| p.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        let identity = format!("{}\n{}", normalize_prompt(prompt), ids.join(","));
        Self::new(prefix, CacheNamespace::Query, &identity)
    }

    /// Glob matching every key of `namespace`
    pub fn namespace_pattern(prefix: &str, namespace: &CacheNamespace) -> String {
        format!("{}:{}:*", prefix, namespace)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lower-case and collapse whitespace runs
pub fn normalize_prompt(prompt: &str) -> String {
    prompt
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn digest(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}
