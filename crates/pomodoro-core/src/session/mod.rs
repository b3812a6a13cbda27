//! The focus/break session loop.
//!
//! ## State Transitions
//!
//! ```text
//! AwaitingStart -> RunningFocus -> AwaitingBreakPermission -> RunningBreak -> AwaitingStart
//!       |                |                   |                     |
//!       +----------------+---------> Terminated <------------------+
//! ```
//!
//! Stop answers at either permission checkpoint, and an external interruption
//! at any suspension point, move the session to `Terminated`.

mod controller;
pub mod traits;

pub use controller::SessionController;
pub use traits::{
    Checkpoint, Clock, IntervalRunner, LogReporter, Notifier, NoopNotifier, Permission, Prompt,
    SummaryReporter, SystemClock,
};

use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::timer::BreakPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum SessionState {
    AwaitingStart,
    RunningFocus,
    /// A focus interval was recorded; the break it earned is waiting.
    AwaitingBreakPermission { plan: BreakPlan },
    RunningBreak { plan: BreakPlan },
    Terminated,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Terminated)
    }
}

/// Emitted exactly once when a session terminates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: i64,
    pub completed_count: u32,
    /// Sum of the recorded focus intervals' lengths.
    pub focused_secs: i64,
    pub config: SessionConfig,
}
