//! Coordinator configuration.

use std::fmt;
use std::str::FromStr;

use tokio::runtime::Handle;

use crate::error::{Error, InvalidInputError};

/// Which queued requests are re-issued after a successful refresh.
///
/// A request that failed with 401 was rejected before the server acted on
/// it, so replaying is normally safe. Some servers authenticate late, after
/// side effects; for those, `IdempotentOnly` gives at-most-once delivery for
/// POST and PATCH at the cost of surfacing [`crate::AuthError::ReplayRefused`]
/// to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReplayPolicy {
    /// Replay every queued request (at-least-once for non-idempotent methods).
    #[default]
    All,
    /// Replay only idempotent methods.
    IdempotentOnly,
}

impl fmt::Display for ReplayPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayPolicy::All => f.write_str("all"),
            ReplayPolicy::IdempotentOnly => f.write_str("idempotent-only"),
        }
    }
}

impl FromStr for ReplayPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(ReplayPolicy::All),
            "idempotent-only" => Ok(ReplayPolicy::IdempotentOnly),
            _ => Err(InvalidInputError::Other {
                message: format!("unknown replay policy '{}'", s),
            }
            .into()),
        }
    }
}

/// Configuration for the refresh coordinator.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorConfig {
    pub replay_policy: ReplayPolicy,
    /// Runtime that refresh episodes are spawned on.
    ///
    /// When unset, the runtime current at construction is used, falling
    /// back to the caller's runtime. Set it when requests are issued from
    /// plain threads and the coordinator is built outside a runtime.
    pub runtime: Option<Handle>,
}
