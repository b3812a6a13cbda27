//! Session controller implementation.
//!
//! The controller is strictly sequential: it suspends only while waiting for
//! permission and while an interval's delay runs. Both suspension points race
//! against the caller's interrupt future, so an interruption ends the session
//! immediately and a focus interval cut short is never recorded.
//!
//! ## Usage
//!
//! ```ignore
//! let mut controller = SessionController::new(config, &db, prompt, runner)
//!     .with_notifier(notifier)
//!     .with_reporter(reporter);
//! let summary = controller.run(ctrl_c()).await?;
//! ```

use std::future::Future;

use tracing::{debug, info, warn};

use super::traits::{
    Checkpoint, Clock, IntervalRunner, LogReporter, NoopNotifier, Notifier, Permission, Prompt,
    SummaryReporter, SystemClock,
};
use super::{SessionState, SessionSummary};
use crate::config::SessionConfig;
use crate::error::{CoreError, Result};
use crate::storage::{IntervalSpan, IntervalStore};
use crate::timer::{next_break, BreakPlan, IntervalKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Termination {
    Stopped,
    Interrupted,
}

/// Drives one pomodoro session from the first prompt to the summary.
pub struct SessionController<S, P, R> {
    config: SessionConfig,
    store: S,
    prompt: P,
    runner: R,
    notifier: Box<dyn Notifier>,
    reporter: Box<dyn SummaryReporter>,
    clock: Box<dyn Clock>,
    state: SessionState,
    session_id: Option<i64>,
    completed_count: u32,
    focused_secs: i64,
}

impl<S, P, R> SessionController<S, P, R>
where
    S: IntervalStore,
    P: Prompt,
    R: IntervalRunner,
{
    /// Create a controller in `AwaitingStart`.
    ///
    /// Notifications are dropped, the summary goes to the log, and timestamps
    /// come from the system clock until overridden.
    pub fn new(config: SessionConfig, store: S, prompt: P, runner: R) -> Self {
        Self {
            config,
            store,
            prompt,
            runner,
            notifier: Box::new(NoopNotifier),
            reporter: Box::new(LogReporter),
            clock: Box::new(SystemClock),
            state: SessionState::AwaitingStart,
            session_id: None,
            completed_count: 0,
            focused_secs: 0,
        }
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn with_reporter(mut self, reporter: impl SummaryReporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Allocated once `run` starts.
    pub fn session_id(&self) -> Option<i64> {
        self.session_id
    }

    pub fn completed_count(&self) -> u32 {
        self.completed_count
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Run the session until the user stops it or `interrupt` completes.
    ///
    /// The summary is handed to the reporter and returned.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid, if the store fails
    /// (the session is terminated without a summary), or if the controller
    /// has already terminated.
    pub async fn run<F>(&mut self, interrupt: F) -> Result<SessionSummary>
    where
        F: Future<Output = ()>,
    {
        if self.state.is_terminal() {
            return Err(CoreError::SessionTerminated);
        }
        self.config.validate()?;

        let session_id = match self.store.allocate_session_id() {
            Ok(id) => id,
            Err(e) => return Err(self.fail(e.into())),
        };
        self.session_id = Some(session_id);
        info!(session_id, config = ?self.config, "session started");

        tokio::pin!(interrupt);

        loop {
            match self.state {
                SessionState::AwaitingStart => {
                    let answer = tokio::select! {
                        biased;
                        _ = &mut interrupt => None,
                        p = self.prompt.await_permission(Checkpoint::Focus) => Some(p),
                    };
                    match answer {
                        Some(Permission::Proceed) => self.transition(SessionState::RunningFocus),
                        Some(Permission::Stop) => return Ok(self.terminate(Termination::Stopped)),
                        None => return Ok(self.terminate(Termination::Interrupted)),
                    }
                }
                SessionState::RunningFocus => {
                    let duration_secs = self.config.focus_secs();
                    let start_time = self.clock.now();
                    let finished = tokio::select! {
                        biased;
                        _ = &mut interrupt => false,
                        _ = self.runner.run(duration_secs, IntervalKind::Focus.label()) => true,
                    };
                    if !finished {
                        return Ok(self.terminate(Termination::Interrupted));
                    }
                    let end_time = self.clock.now();

                    let plan = self.complete_focus(session_id, IntervalSpan::new(start_time, end_time))?;
                    self.notifier.notify("Pomodoro finished");
                    self.transition(SessionState::AwaitingBreakPermission { plan });
                }
                SessionState::AwaitingBreakPermission { plan } => {
                    let answer = tokio::select! {
                        biased;
                        _ = &mut interrupt => None,
                        p = self.prompt.await_permission(Checkpoint::Break(plan)) => Some(p),
                    };
                    match answer {
                        Some(Permission::Proceed) => {
                            self.transition(SessionState::RunningBreak { plan })
                        }
                        Some(Permission::Stop) => return Ok(self.terminate(Termination::Stopped)),
                        None => return Ok(self.terminate(Termination::Interrupted)),
                    }
                }
                SessionState::RunningBreak { plan } => {
                    let label = IntervalKind::Break(plan.kind).label();
                    let finished = tokio::select! {
                        biased;
                        _ = &mut interrupt => false,
                        _ = self.runner.run(plan.duration_secs, label) => true,
                    };
                    if !finished {
                        return Ok(self.terminate(Termination::Interrupted));
                    }
                    self.notifier.notify("Break finished");
                    self.transition(SessionState::AwaitingStart);
                }
                SessionState::Terminated => return Err(CoreError::SessionTerminated),
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Persist the interval, then count it and plan the break it earned.
    fn complete_focus(&mut self, session_id: i64, span: IntervalSpan) -> Result<BreakPlan> {
        if let Err(e) = self.store.append(session_id, &span) {
            return Err(self.fail(e.into()));
        }
        self.completed_count += 1;
        self.focused_secs += span.duration().num_seconds();

        let plan = next_break(self.completed_count, &self.config);
        debug!(
            session_id,
            completed = self.completed_count,
            next_break = ?plan.kind,
            break_secs = plan.duration_secs,
            "focus interval recorded"
        );
        Ok(plan)
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "session transition");
        self.state = next;
    }

    fn terminate(&mut self, cause: Termination) -> SessionSummary {
        self.transition(SessionState::Terminated);
        let summary = SessionSummary {
            session_id: self.session_id.unwrap_or_default(),
            completed_count: self.completed_count,
            focused_secs: self.focused_secs,
            config: self.config,
        };
        info!(
            session_id = summary.session_id,
            completed = summary.completed_count,
            ?cause,
            "session terminated"
        );
        self.reporter.report(&summary);
        summary
    }

    fn fail(&mut self, err: CoreError) -> CoreError {
        warn!(error = %err, completed = self.completed_count, "storage failure, ending session");
        self.transition(SessionState::Terminated);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatabaseError;
    use crate::storage::{Database, IntervalRecord};
    use crate::timer::BreakKind;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[derive(Clone)]
    struct FakeClock(Rc<Cell<DateTime<Utc>>>);

    impl FakeClock {
        fn new() -> Self {
            Self(Rc::new(Cell::new(
                Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap(),
            )))
        }

        fn advance(&self, secs: u64) {
            self.0.set(self.0.get() + Duration::seconds(secs as i64));
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> DateTime<Utc> {
            self.0.get()
        }
    }

    /// Answers from a script; stops once the script runs out.
    struct ScriptedPrompt {
        answers: VecDeque<Permission>,
        seen: Rc<RefCell<Vec<Checkpoint>>>,
    }

    impl ScriptedPrompt {
        fn new(answers: &[Permission]) -> (Self, Rc<RefCell<Vec<Checkpoint>>>) {
            let seen = Rc::new(RefCell::new(Vec::new()));
            let prompt = Self {
                answers: answers.iter().copied().collect(),
                seen: seen.clone(),
            };
            (prompt, seen)
        }
    }

    impl Prompt for ScriptedPrompt {
        async fn await_permission(&mut self, checkpoint: Checkpoint) -> Permission {
            self.seen.borrow_mut().push(checkpoint);
            self.answers.pop_front().unwrap_or(Permission::Stop)
        }
    }

    /// Completes every interval at once, moving the fake clock forward.
    struct InstantRunner {
        clock: FakeClock,
        runs: Rc<RefCell<Vec<(u64, String)>>>,
    }

    impl IntervalRunner for InstantRunner {
        async fn run(&mut self, duration_secs: u64, label: &str) {
            self.runs.borrow_mut().push((duration_secs, label.to_string()));
            self.clock.advance(duration_secs);
        }
    }

    /// Never finishes a focus interval; fires the interrupt once asked to run.
    struct HangingRunner {
        trip: Option<tokio::sync::oneshot::Sender<()>>,
    }

    impl IntervalRunner for HangingRunner {
        async fn run(&mut self, _duration_secs: u64, _label: &str) {
            if let Some(trip) = self.trip.take() {
                let _ = trip.send(());
            }
            std::future::pending::<()>().await;
        }
    }

    struct SilentPrompt;

    impl Prompt for SilentPrompt {
        async fn await_permission(&mut self, _checkpoint: Checkpoint) -> Permission {
            std::future::pending().await
        }
    }

    #[derive(Clone, Default)]
    struct Recorder {
        messages: Rc<RefCell<Vec<String>>>,
        summaries: Rc<RefCell<Vec<SessionSummary>>>,
    }

    impl Notifier for Recorder {
        fn notify(&self, message: &str) {
            self.messages.borrow_mut().push(message.to_string());
        }
    }

    impl SummaryReporter for Recorder {
        fn report(&mut self, summary: &SessionSummary) {
            self.summaries.borrow_mut().push(summary.clone());
        }
    }

    struct FailingStore;

    impl IntervalStore for FailingStore {
        fn allocate_session_id(&self) -> Result<i64, DatabaseError> {
            Ok(7)
        }

        fn append(&self, _session_id: i64, _span: &IntervalSpan) -> Result<(), DatabaseError> {
            Err(DatabaseError::Locked)
        }

        fn list_by_session(&self, _session_id: i64) -> Result<Vec<IntervalRecord>, DatabaseError> {
            Ok(Vec::new())
        }
    }

    fn classic() -> SessionConfig {
        SessionConfig {
            focus_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            buffer_length: 4,
        }
    }

    use Permission::{Proceed, Stop};

    #[tokio::test]
    async fn stop_before_first_focus_reports_zero() {
        let db = Database::open_memory().unwrap();
        let clock = FakeClock::new();
        let (prompt, seen) = ScriptedPrompt::new(&[Stop]);
        let runs = Rc::new(RefCell::new(Vec::new()));
        let runner = InstantRunner {
            clock: clock.clone(),
            runs: runs.clone(),
        };
        let recorder = Recorder::default();

        let mut controller = SessionController::new(classic(), &db, prompt, runner)
            .with_reporter(recorder.clone())
            .with_clock(clock);
        let summary = controller.run(std::future::pending()).await.unwrap();

        assert_eq!(controller.state(), SessionState::Terminated);
        assert_eq!(summary.completed_count, 0);
        assert_eq!(summary.session_id, 1);
        assert_eq!(*seen.borrow(), vec![Checkpoint::Focus]);
        assert!(runs.borrow().is_empty());
        assert_eq!(*recorder.summaries.borrow(), vec![summary]);
        assert!(db.list_by_session(1).unwrap().is_empty());
    }

    #[tokio::test]
    async fn one_focus_then_stop_records_one_interval() {
        let db = Database::open_memory().unwrap();
        let clock = FakeClock::new();
        let (prompt, seen) = ScriptedPrompt::new(&[Proceed, Stop]);
        let runs = Rc::new(RefCell::new(Vec::new()));
        let runner = InstantRunner {
            clock: clock.clone(),
            runs: runs.clone(),
        };
        let recorder = Recorder::default();

        let mut controller = SessionController::new(classic(), &db, prompt, runner)
            .with_notifier(recorder.clone())
            .with_reporter(recorder.clone())
            .with_clock(clock);
        let summary = controller.run(std::future::pending()).await.unwrap();

        assert_eq!(summary.completed_count, 1);
        assert_eq!(summary.focused_secs, 1500);
        assert_eq!(controller.completed_count(), 1);

        let records = db.list_by_session(summary.session_id).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].duration(), Duration::seconds(1500));

        let short = BreakPlan {
            kind: BreakKind::Short,
            duration_secs: 300,
        };
        assert_eq!(*seen.borrow(), vec![Checkpoint::Focus, Checkpoint::Break(short)]);
        assert_eq!(*runs.borrow(), vec![(1500, "Pomodoro".to_string())]);
        assert_eq!(*recorder.messages.borrow(), vec!["Pomodoro finished".to_string()]);
        assert_eq!(recorder.summaries.borrow().len(), 1);
    }

    #[tokio::test]
    async fn finished_break_is_announced() {
        let db = Database::open_memory().unwrap();
        let clock = FakeClock::new();
        let (prompt, seen) = ScriptedPrompt::new(&[Proceed, Proceed, Stop]);
        let runs = Rc::new(RefCell::new(Vec::new()));
        let runner = InstantRunner {
            clock: clock.clone(),
            runs: runs.clone(),
        };
        let recorder = Recorder::default();

        let mut controller = SessionController::new(classic(), &db, prompt, runner)
            .with_notifier(recorder.clone())
            .with_reporter(recorder.clone())
            .with_clock(clock);
        let summary = controller.run(std::future::pending()).await.unwrap();

        assert_eq!(summary.completed_count, 1);
        assert_eq!(
            *recorder.messages.borrow(),
            vec!["Pomodoro finished".to_string(), "Break finished".to_string()]
        );
        assert_eq!(
            *runs.borrow(),
            vec![(1500, "Pomodoro".to_string()), (300, "Short break".to_string())]
        );
        assert_eq!(seen.borrow().last(), Some(&Checkpoint::Focus));
    }

    #[tokio::test]
    async fn fourth_break_is_long() {
        let db = Database::open_memory().unwrap();
        let clock = FakeClock::new();
        // Four full focus/break rounds, then stop at the fifth focus prompt.
        let script = [Proceed; 8];
        let (prompt, seen) = ScriptedPrompt::new(&script);
        let runs = Rc::new(RefCell::new(Vec::new()));
        let runner = InstantRunner {
            clock: clock.clone(),
            runs: runs.clone(),
        };

        let mut controller =
            SessionController::new(classic(), &db, prompt, runner).with_clock(clock);
        let summary = controller.run(std::future::pending()).await.unwrap();

        assert_eq!(summary.completed_count, 4);
        assert_eq!(db.list_by_session(summary.session_id).unwrap().len(), 4);

        let labels: Vec<String> = runs.borrow().iter().map(|(_, l)| l.clone()).collect();
        assert_eq!(
            labels,
            vec![
                "Pomodoro",
                "Short break",
                "Pomodoro",
                "Short break",
                "Pomodoro",
                "Short break",
                "Pomodoro",
                "Long break",
            ]
        );
        assert_eq!(runs.borrow()[7].0, 900);
        assert_eq!(seen.borrow().len(), 9);
        assert_eq!(seen.borrow()[8], Checkpoint::Focus);
    }

    #[tokio::test]
    async fn stop_at_break_prompt_keeps_recorded_focus() {
        let db = Database::open_memory().unwrap();
        let clock = FakeClock::new();
        let (prompt, _) = ScriptedPrompt::new(&[Proceed, Proceed, Proceed, Stop]);
        let runs = Rc::new(RefCell::new(Vec::new()));
        let runner = InstantRunner {
            clock: clock.clone(),
            runs: runs.clone(),
        };

        let mut controller =
            SessionController::new(classic(), &db, prompt, runner).with_clock(clock);
        let summary = controller.run(std::future::pending()).await.unwrap();

        assert_eq!(summary.completed_count, 2);
        assert_eq!(runs.borrow().len(), 3);
        assert_eq!(db.list_by_session(summary.session_id).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn interruption_mid_focus_records_nothing() {
        let db = Database::open_memory().unwrap();
        let (trip, tripped) = tokio::sync::oneshot::channel();
        let (prompt, _) = ScriptedPrompt::new(&[Proceed]);
        let runner = HangingRunner { trip: Some(trip) };
        let recorder = Recorder::default();

        let mut controller = SessionController::new(classic(), &db, prompt, runner)
            .with_notifier(recorder.clone())
            .with_reporter(recorder.clone());
        let summary = controller
            .run(async {
                let _ = tripped.await;
            })
            .await
            .unwrap();

        assert_eq!(controller.state(), SessionState::Terminated);
        assert_eq!(summary.completed_count, 0);
        assert!(db.list_by_session(summary.session_id).unwrap().is_empty());
        assert!(recorder.messages.borrow().is_empty());
        assert_eq!(recorder.summaries.borrow().len(), 1);
    }

    #[tokio::test]
    async fn interruption_while_waiting_for_permission() {
        let db = Database::open_memory().unwrap();
        let recorder = Recorder::default();
        let runner = HangingRunner { trip: None };

        let mut controller = SessionController::new(classic(), &db, SilentPrompt, runner)
            .with_reporter(recorder.clone());
        let summary = controller
            .run(tokio::time::sleep(std::time::Duration::from_millis(10)))
            .await
            .unwrap();

        assert_eq!(summary.completed_count, 0);
        assert_eq!(*recorder.summaries.borrow(), vec![summary]);
    }

    #[tokio::test]
    async fn storage_failure_ends_session_without_summary() {
        let clock = FakeClock::new();
        let (prompt, _) = ScriptedPrompt::new(&[Proceed, Proceed]);
        let runs = Rc::new(RefCell::new(Vec::new()));
        let runner = InstantRunner {
            clock: clock.clone(),
            runs: runs.clone(),
        };
        let recorder = Recorder::default();

        let mut controller = SessionController::new(classic(), FailingStore, prompt, runner)
            .with_notifier(recorder.clone())
            .with_reporter(recorder.clone())
            .with_clock(clock);
        let err = controller.run(std::future::pending()).await.unwrap_err();

        assert!(matches!(err, CoreError::Database(DatabaseError::Locked)));
        assert_eq!(controller.state(), SessionState::Terminated);
        assert_eq!(controller.completed_count(), 0);
        // The break never starts.
        assert_eq!(runs.borrow().len(), 1);
        assert!(recorder.messages.borrow().is_empty());
        assert!(recorder.summaries.borrow().is_empty());
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_before_allocating() {
        let db = Database::open_memory().unwrap();
        let (prompt, seen) = ScriptedPrompt::new(&[Proceed]);
        let runner = HangingRunner { trip: None };
        let config = SessionConfig {
            buffer_length: 0,
            ..classic()
        };

        let mut controller = SessionController::new(config, &db, prompt, runner);
        let err = controller.run(std::future::pending()).await.unwrap_err();

        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(controller.session_id(), None);
        assert!(seen.borrow().is_empty());
    }

    #[tokio::test]
    async fn terminated_controller_cannot_run_again() {
        let db = Database::open_memory().unwrap();
        let (prompt, _) = ScriptedPrompt::new(&[Stop]);
        let recorder = Recorder::default();
        let mut controller =
            SessionController::new(classic(), &db, prompt, HangingRunner { trip: None })
                .with_reporter(recorder.clone());

        controller.run(std::future::pending()).await.unwrap();
        let err = controller.run(std::future::pending()).await.unwrap_err();

        assert!(matches!(err, CoreError::SessionTerminated));
        assert_eq!(recorder.summaries.borrow().len(), 1);
    }

    #[tokio::test]
    async fn sessions_get_distinct_ids() {
        let db = Database::open_memory().unwrap();
        for expected in 1..=3 {
            let clock = FakeClock::new();
            let (prompt, _) = ScriptedPrompt::new(&[Proceed, Stop]);
            let runner = InstantRunner {
                clock: clock.clone(),
                runs: Rc::new(RefCell::new(Vec::new())),
            };
            let mut controller =
                SessionController::new(classic(), &db, prompt, runner).with_clock(clock);
            let summary = controller.run(std::future::pending()).await.unwrap();
            assert_eq!(summary.session_id, expected);
        }
    }
}
