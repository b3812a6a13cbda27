use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakKind {
    Short,
    Long,
}

impl BreakKind {
    pub fn label(self) -> &'static str {
        match self {
            BreakKind::Short => "Short break",
            BreakKind::Long => "Long break",
        }
    }
}

/// What the runner is asked to time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "break")]
pub enum IntervalKind {
    Focus,
    Break(BreakKind),
}

impl IntervalKind {
    pub fn label(self) -> &'static str {
        match self {
            IntervalKind::Focus => "Pomodoro",
            IntervalKind::Break(kind) => kind.label(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakPlan {
    pub kind: BreakKind,
    pub duration_secs: u64,
}

/// Pick the break that follows the `completed_count`-th focus interval.
///
/// Every `buffer_length`-th completion earns a long break; everything else a
/// short one.
///
/// Preconditions: `completed_count >= 1` (only called after a focus interval
/// has completed) and `config.buffer_length >= 1` (checked by
/// [`SessionConfig::validate`]).
pub fn next_break(completed_count: u32, config: &SessionConfig) -> BreakPlan {
    debug_assert!(completed_count >= 1, "no focus interval completed yet");
    debug_assert!(config.buffer_length >= 1, "buffer_length must be positive");

    if completed_count % config.buffer_length == 0 {
        BreakPlan {
            kind: BreakKind::Long,
            duration_secs: config.long_break_secs(),
        }
    } else {
        BreakPlan {
            kind: BreakKind::Short,
            duration_secs: config.short_break_secs(),
        }
    }
}
