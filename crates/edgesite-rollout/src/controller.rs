//! Rollout controller: publish a function version, then point the edge
//! hook at it.
//!
//! Publishing happens strictly before rebinding. Any failure stops the
//! rollout with the previously bound version still serving traffic.

use std::time::Instant;

use edgesite_core::{EdgeEvent, FunctionPackage, VersionRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::host::{FunctionHost, HostError};

/// Current phase of a rollout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RolloutPhase {
    /// Rollout not started.
    Pending,
    /// Publishing the package as an immutable version.
    Publishing,
    /// Pointing the edge hook at the published version.
    Rebinding,
    /// Hook now runs the published version.
    Completed,
    /// Hook already ran the published version; nothing was rebound.
    Unchanged,
    Failed { reason: String },
}

#[derive(Debug, Error)]
pub enum RolloutError {
    #[error("failed to publish {function}: {source}")]
    Publish {
        function: String,
        #[source]
        source: HostError,
    },

    #[error("failed to bind {version} to {distribution} {event}: {source}")]
    Bind {
        distribution: String,
        event: EdgeEvent,
        version: VersionRef,
        #[source]
        source: HostError,
    },

    #[error("rollout already ran (phase {0:?})")]
    AlreadyRan(RolloutPhase),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RolloutOutcome {
    pub version: VersionRef,
    /// Version bound before this rollout, if any.
    pub previous: Option<VersionRef>,
    /// Whether publishing created a new version.
    pub created: bool,
    /// Whether the hook was pointed at a different version.
    pub rebound: bool,
}

/// A rollout of one function package to one distribution hook.
#[derive(Debug, Clone)]
pub struct Rollout {
    pub distribution: String,
    pub event: EdgeEvent,
    pub package: FunctionPackage,
    pub tag: String,
    pub phase: RolloutPhase,
    pub started_at: Option<Instant>,
}

impl Rollout {
    pub fn new(distribution: &str, event: EdgeEvent, package: FunctionPackage, tag: &str) -> Self {
        Self {
            distribution: distribution.to_string(),
            event,
            package,
            tag: tag.to_string(),
            phase: RolloutPhase::Pending,
            started_at: None,
        }
    }

    /// Drive the rollout to a terminal phase.
    pub fn execute(&mut self, host: &dyn FunctionHost) -> Result<RolloutOutcome, RolloutError> {
        if self.phase != RolloutPhase::Pending {
            return Err(RolloutError::AlreadyRan(self.phase.clone()));
        }
        self.started_at = Some(Instant::now());

        self.phase = RolloutPhase::Publishing;
        let published = match host.publish(&self.package, &self.tag) {
            Ok(published) => published,
            Err(source) => {
                self.fail(format!("publish failed: {source}"));
                return Err(RolloutError::Publish {
                    function: self.package.name.clone(),
                    source,
                });
            }
        };
        let version = published.version;
        info!(
            distribution = %self.distribution,
            %version,
            tag = %self.tag,
            created = published.created,
            "function version published"
        );

        let previous = match host.binding(&self.distribution, self.event) {
            Ok(previous) => previous,
            Err(source) => return Err(self.bind_failed(version, source)),
        };

        if previous.as_ref() == Some(&version) {
            self.phase = RolloutPhase::Unchanged;
            info!(distribution = %self.distribution, %version, "edge hook already current");
            return Ok(RolloutOutcome {
                version,
                previous,
                created: published.created,
                rebound: false,
            });
        }

        self.phase = RolloutPhase::Rebinding;
        if let Err(source) = host.bind(&self.distribution, self.event, &version) {
            return Err(self.bind_failed(version, source));
        }

        self.phase = RolloutPhase::Completed;
        info!(
            distribution = %self.distribution,
            event = %self.event,
            %version,
            previous = ?previous.as_ref().map(VersionRef::qualified),
            elapsed_ms = self.elapsed_ms(),
            "edge hook rebound"
        );
        Ok(RolloutOutcome {
            version,
            previous,
            created: published.created,
            rebound: true,
        })
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.phase,
            RolloutPhase::Completed | RolloutPhase::Unchanged | RolloutPhase::Failed { .. }
        )
    }

    fn bind_failed(&mut self, version: VersionRef, source: HostError) -> RolloutError {
        self.fail(format!("bind failed: {source}"));
        RolloutError::Bind {
            distribution: self.distribution.clone(),
            event: self.event,
            version,
            source,
        }
    }

    fn fail(&mut self, reason: String) {
        warn!(distribution = %self.distribution, %reason, "rollout failed");
        self.phase = RolloutPhase::Failed { reason };
    }

    fn elapsed_ms(&self) -> u64 {
        self.started_at
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or_default()
    }
}
