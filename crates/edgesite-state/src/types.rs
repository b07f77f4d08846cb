//! Persisted records.

use edgesite_core::{EdgeEvent, VersionRef};
use serde::{Deserialize, Serialize};

/// One immutable published revision of a function.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionVersion {
    pub function: String,
    /// 1-based, sequential per function.
    pub number: u64,
    pub tag: String,
    /// SHA-256 of `source`.
    pub sha256: String,
    pub source: String,
    /// Unix timestamp (seconds).
    pub published_at: u64,
}

impl FunctionVersion {
    pub fn version_ref(&self) -> VersionRef {
        VersionRef {
            function: self.function.clone(),
            number: self.number,
            tag: self.tag.clone(),
        }
    }
}

/// Which function version a distribution runs for an event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EdgeBinding {
    pub distribution: String,
    pub event: EdgeEvent,
    pub version: VersionRef,
    /// The version this binding replaced, if any.
    pub previous: Option<VersionRef>,
    /// Unix timestamp (seconds).
    pub updated_at: u64,
}

impl EdgeBinding {
    pub fn table_key(&self) -> String {
        binding_key(&self.distribution, self.event)
    }
}

pub fn version_key(function: &str, tag: &str) -> String {
    format!("{function}/{tag}")
}

pub fn binding_key(distribution: &str, event: EdgeEvent) -> String {
    format!("{distribution}/{event}")
}
