//! Shared types used across edgesite crates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Point in the CDN request/response cycle where an edge function can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeEvent {
    ViewerRequest,
    OriginRequest,
    OriginResponse,
    ViewerResponse,
}

impl EdgeEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeEvent::ViewerRequest => "viewer-request",
            EdgeEvent::OriginRequest => "origin-request",
            EdgeEvent::OriginResponse => "origin-response",
            EdgeEvent::ViewerResponse => "viewer-response",
        }
    }
}

impl fmt::Display for EdgeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a published function version gets its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersioningStrategy {
    /// Tag each version with the rolling checksum of the generated source.
    #[default]
    Explicit,
    /// Tag each version with a digest of the whole packaged function,
    /// the way a platform's automatic "current version" tracking does.
    Delegated,
}

impl VersioningStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            VersioningStrategy::Explicit => "explicit",
            VersioningStrategy::Delegated => "delegated",
        }
    }
}

/// A deployable edge function: generated source plus its runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionPackage {
    pub name: String,
    /// Runtime identifier, e.g. `nodejs14.x`.
    pub runtime: String,
    /// Entry point, e.g. `index.handler`.
    pub handler: String,
    pub memory_mb: u32,
    /// File the source is stored under inside the package.
    pub file_name: String,
    pub source: String,
}

/// Reference to one immutable published revision of a function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionRef {
    pub function: String,
    /// 1-based, assigned in publish order per function.
    pub number: u64,
    /// Identity token the version was published under.
    pub tag: String,
}

impl VersionRef {
    pub fn qualified(&self) -> String {
        format!("{}:{}", self.function, self.number)
    }
}

impl fmt::Display for VersionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.function, self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_event_serializes_kebab_case() {
        let json = serde_json::to_string(&EdgeEvent::ViewerResponse).unwrap();
        assert_eq!(json, "\"viewer-response\"");
        assert_eq!(EdgeEvent::ViewerResponse.to_string(), "viewer-response");
    }

    #[test]
    fn versioning_defaults_to_explicit() {
        assert_eq!(VersioningStrategy::default(), VersioningStrategy::Explicit);
        let parsed: VersioningStrategy = serde_json::from_str("\"delegated\"").unwrap();
        assert_eq!(parsed, VersioningStrategy::Delegated);
    }

    #[test]
    fn version_ref_display() {
        let v = VersionRef {
            function: "headers".to_string(),
            number: 3,
            tag: "-1234".to_string(),
        };
        assert_eq!(v.to_string(), "headers:3");
        assert_eq!(v.qualified(), "headers:3");
    }
}
