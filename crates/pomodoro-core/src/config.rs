//! Immutable per-session configuration.
//!
//! Built once at startup (from `config.toml` plus command-line overrides) and
//! passed by reference into the scheduler and the controller. All durations
//! are stored in minutes; [`crate::timer::normalize`] turns them into seconds.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::timer::normalize;

pub const DEFAULT_FOCUS_MINUTES: i64 = 25;
pub const DEFAULT_SHORT_BREAK_MINUTES: i64 = 5;
pub const DEFAULT_LONG_BREAK_MINUTES: i64 = 15;
pub const DEFAULT_BUFFER_LENGTH: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub focus_minutes: i64,
    pub short_break_minutes: i64,
    pub long_break_minutes: i64,
    /// Completed focus intervals per long break.
    pub buffer_length: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            focus_minutes: DEFAULT_FOCUS_MINUTES,
            short_break_minutes: DEFAULT_SHORT_BREAK_MINUTES,
            long_break_minutes: DEFAULT_LONG_BREAK_MINUTES,
            buffer_length: DEFAULT_BUFFER_LENGTH,
        }
    }
}

impl SessionConfig {
    /// Check the preconditions the scheduler and the store rely on.
    ///
    /// Break durations are not checked: negative values clamp to a zero-length
    /// break.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidValue`] when `buffer_length` is zero or
    /// the focus duration is not positive.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.buffer_length == 0 {
            return Err(ValidationError::InvalidValue {
                field: "buffer_length".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.focus_minutes <= 0 {
            return Err(ValidationError::InvalidValue {
                field: "focus_minutes".into(),
                message: format!("must be positive, got {}", self.focus_minutes),
            });
        }
        Ok(())
    }

    pub fn focus_secs(&self) -> u64 {
        normalize(self.focus_minutes)
    }

    pub fn short_break_secs(&self) -> u64 {
        normalize(self.short_break_minutes)
    }

    pub fn long_break_secs(&self) -> u64 {
        normalize(self.long_break_minutes)
    }
}
