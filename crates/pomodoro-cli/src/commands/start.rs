use clap::Args;
use pomodoro_core::{Config, Database, SessionConfig, SessionController};
use tracing::warn;

use crate::terminal::{DesktopNotifier, ProgressRunner, StdinPrompt, TerminalReporter};

/// Durations are in minutes. Anything not given falls back to `config.toml`.
#[derive(Args, Debug, Default)]
pub struct StartArgs {
    /// Focus interval length
    #[arg(long = "focus", visible_alias = "pt", allow_negative_numbers = true)]
    pub focus: Option<i64>,
    /// Short break length
    #[arg(long = "short-break", visible_alias = "sbt", allow_negative_numbers = true)]
    pub short_break: Option<i64>,
    /// Long break length
    #[arg(long = "long-break", visible_alias = "lbt", allow_negative_numbers = true)]
    pub long_break: Option<i64>,
    /// Focus intervals per long break
    #[arg(long = "buffer-length", visible_alias = "bl")]
    pub buffer_length: Option<u32>,
    /// Do not send desktop notifications
    #[arg(long)]
    pub no_notify: bool,
    /// Print the final summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl StartArgs {
    /// Apply the flags on top of the file's settings.
    pub fn session_config(&self, base: SessionConfig) -> SessionConfig {
        SessionConfig {
            focus_minutes: self.focus.unwrap_or(base.focus_minutes),
            short_break_minutes: self.short_break.unwrap_or(base.short_break_minutes),
            long_break_minutes: self.long_break.unwrap_or(base.long_break_minutes),
            buffer_length: self.buffer_length.unwrap_or(base.buffer_length),
        }
    }
}

async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C; only \"stop\" ends the session");
        std::future::pending::<()>().await;
    }
}

pub fn run(args: StartArgs) -> Result<(), Box<dyn std::error::Error>> {
    let file = Config::load()?;
    let config = args.session_config(file.session_config());
    config.validate()?;

    let db = Database::open()?;
    let notify = file.notifications.enabled && !args.no_notify;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let mut controller =
            SessionController::new(config, &db, StdinPrompt::spawn(), ProgressRunner::default())
                .with_reporter(TerminalReporter::new(args.json));
        if notify {
            controller = controller.with_notifier(DesktopNotifier::default());
        }
        controller.run(interrupted()).await
    })?;

    Ok(())
}
