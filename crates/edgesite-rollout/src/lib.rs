//! edgesite rollouts: publish an immutable function version, then rebind
//! the distribution's edge hook to it.
//!
//! # Components
//!
//! - **`host`** the `FunctionHost` seam (publish, look up, bind)
//! - **`local`** `FunctionHost` over the local state ledger
//! - **`controller`** rollout state machine

pub mod controller;
pub mod host;
pub mod local;

pub use controller::{Rollout, RolloutError, RolloutOutcome, RolloutPhase};
pub use host::{FunctionHost, HostError, PublishOutcome};
pub use local::LocalHost;
