//! Worker lifecycle state machine.
//!
//! `Parsed → Installing → Installed → Activating → Activated`. Fetch
//! interception is live only in `Activated`.

use std::fmt;

use serde::{Deserialize, Serialize};
use shellcache_core::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Parsed,
    Installing,
    /// Installed and waiting to take over.
    Installed,
    Activating,
    Activated,
}

impl LifecycleState {
    /// The only state each state may advance to.
    fn successor(&self) -> Option<LifecycleState> {
        match self {
            LifecycleState::Parsed => Some(LifecycleState::Installing),
            LifecycleState::Installing => Some(LifecycleState::Installed),
            LifecycleState::Installed => Some(LifecycleState::Activating),
            LifecycleState::Activating => Some(LifecycleState::Activated),
            LifecycleState::Activated => None,
        }
    }

    /// Move to `to`, rejecting out-of-order transitions.
    pub fn advance(self, to: LifecycleState) -> Result<LifecycleState, Error> {
        match self.successor() {
            Some(next) if next == to => Ok(to),
            _ => Err(Error::InvalidState { expected: to.predecessor_name().into(), actual: self.to_string() }),
        }
    }

    fn predecessor_name(&self) -> &'static str {
        match self {
            LifecycleState::Parsed => "none",
            LifecycleState::Installing => "parsed",
            LifecycleState::Installed => "installing",
            LifecycleState::Activating => "installed",
            LifecycleState::Activated => "activating",
        }
    }

    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, LifecycleState::Activated)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Parsed => "parsed",
            LifecycleState::Installing => "installing",
            LifecycleState::Installed => "installed",
            LifecycleState::Activating => "activating",
            LifecycleState::Activated => "activated",
        };
        f.write_str(name)
    }
}

/// Lifecycle state plus the skip-waiting signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerState {
    pub lifecycle: LifecycleState,
    pub skip_waiting: bool,
}

impl Default for WorkerState {
    fn default() -> Self {
        Self { lifecycle: LifecycleState::Parsed, skip_waiting: false }
    }
}
