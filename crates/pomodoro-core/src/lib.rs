//! # Pomodoro Core Library
//!
//! Decision logic and persistence for a terminal pomodoro timer: alternating
//! focus intervals and breaks, with every completed focus interval recorded
//! so statistics survive restarts. The CLI crate supplies the terminal I/O.
//!
//! ## Key Components
//!
//! - [`normalize`]: minutes-to-seconds duration policy
//! - [`next_break`]: short/long break selection
//! - [`SessionController`]: the focus/break state machine
//! - [`IntervalStore`] / [`Database`]: SQLite persistence of completed intervals
//! - [`Config`]: TOML configuration file

pub mod config;
pub mod error;
pub mod session;
pub mod storage;
pub mod timer;

pub use config::SessionConfig;
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use session::{
    Checkpoint, Clock, IntervalRunner, Notifier, Permission, Prompt, SessionController,
    SessionState, SessionSummary, SummaryReporter,
};
pub use storage::{Config, Database, IntervalRecord, IntervalSpan, IntervalStore, StorageEnv};
pub use timer::{next_break, normalize, BreakKind, BreakPlan, IntervalKind};
