use pomodoro_core::{SessionSummary, SummaryReporter};

/// Prints the end-of-session summary to stdout.
pub struct TerminalReporter {
    json: bool,
}

impl TerminalReporter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }
}

impl SummaryReporter for TerminalReporter {
    fn report(&mut self, summary: &SessionSummary) {
        println!();
        if self.json {
            match serde_json::to_string_pretty(summary) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::warn!(error = %e, "cannot serialize summary"),
            }
        } else {
            print!("{}", render_summary(summary));
        }
    }
}

fn render_summary(summary: &SessionSummary) -> String {
    let cfg = &summary.config;
    format!(
        "Session {} finished\n\
         \x20 Completed pomodoros: {}\n\
         \x20 Focused:             {} min\n\
         \x20 Pomodoro length:     {} min\n\
         \x20 Breaks:              {} min short, {} min long\n\
         \x20 Long break every:    {} pomodoro(s)\n",
        summary.session_id,
        summary.completed_count,
        summary.focused_secs / 60,
        cfg.focus_secs() / 60,
        cfg.short_break_secs() / 60,
        cfg.long_break_secs() / 60,
        cfg.buffer_length,
    )
}
