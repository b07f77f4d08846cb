//! The seam between a rollout and whatever actually hosts edge functions.

use edgesite_core::{EdgeEvent, FunctionPackage, VersionRef};
use edgesite_state::StateError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("host unavailable: {0}")]
    Unavailable(String),

    #[error("host rejected request: {0}")]
    Rejected(String),

    #[error(transparent)]
    State(#[from] StateError),
}

/// Result of publishing a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    pub version: VersionRef,
    /// False when the tag had already been published.
    pub created: bool,
}

/// A place edge functions are published to and bound from.
///
/// Published versions are immutable. `publish` must be idempotent per
/// `(package.name, tag)`.
pub trait FunctionHost {
    fn publish(&self, package: &FunctionPackage, tag: &str) -> Result<PublishOutcome, HostError>;

    /// The version currently bound to `event` on `distribution`.
    fn binding(&self, distribution: &str, event: EdgeEvent)
    -> Result<Option<VersionRef>, HostError>;

    fn bind(
        &self,
        distribution: &str,
        event: EdgeEvent,
        version: &VersionRef,
    ) -> Result<(), HostError>;
}
