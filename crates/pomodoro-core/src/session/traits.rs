//! Collaborators the session controller delegates to.
//!
//! The controller owns the decisions; these traits own the I/O. The CLI
//! provides terminal implementations, tests provide scripted ones.

use std::future::Future;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use super::SessionSummary;
use crate::timer::BreakPlan;

/// Answer to a permission checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Proceed,
    Stop,
}

impl Permission {
    /// Only `s`/`stop` stop, ignoring case and surrounding whitespace.
    /// Every other answer, the empty line included, proceeds.
    pub fn parse(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "s" | "stop" => Permission::Stop,
            _ => Permission::Proceed,
        }
    }
}

/// What a permission checkpoint is about to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    Focus,
    Break(BreakPlan),
}

pub trait Prompt {
    /// Block until the user decides whether the next interval runs.
    fn await_permission(&mut self, checkpoint: Checkpoint) -> impl Future<Output = Permission>;
}

pub trait IntervalRunner {
    /// Wait for roughly `duration_secs`, rendering progress if it wants to.
    ///
    /// Dropping the returned future abandons the interval.
    fn run(&mut self, duration_secs: u64, label: &str) -> impl Future<Output = ()>;
}

/// Fire-and-forget user notification.
pub trait Notifier {
    fn notify(&self, message: &str);
}

pub trait SummaryReporter {
    fn report(&mut self, summary: &SessionSummary);
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _message: &str) {}
}

/// Reports the summary through `tracing` only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl SummaryReporter for LogReporter {
    fn report(&mut self, summary: &SessionSummary) {
        tracing::info!(
            session_id = summary.session_id,
            completed = summary.completed_count,
            focused_secs = summary.focused_secs,
            "session finished"
        );
    }
}

/// Wall clock, truncated to the microsecond precision the store keeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }
}
