use std::io::BufRead;

use pomodoro_core::{BreakKind, Checkpoint, Permission, Prompt};
use tokio::sync::mpsc;

const INSTRUCTIONS: &str = r#"Type next step: "r" or "run" to run, "s" or "stop" to exit pomodoro"#;

/// Reads answers from stdin.
///
/// Lines are read on a dedicated thread so that a Ctrl-C during the prompt
/// is not stuck behind a blocking read. Any answer other than a stop word
/// runs the next interval; end of input counts as "stop".
pub struct StdinPrompt {
    lines: mpsc::Receiver<String>,
}

impl StdinPrompt {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel(1);
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        });
        Self::from_lines(rx)
    }

    pub fn from_lines(lines: mpsc::Receiver<String>) -> Self {
        Self { lines }
    }
}

fn heading(checkpoint: Checkpoint) -> String {
    match checkpoint {
        Checkpoint::Focus => "Next up: pomodoro".to_string(),
        Checkpoint::Break(plan) => {
            let kind = match plan.kind {
                BreakKind::Short => "short break",
                BreakKind::Long => "long break",
            };
            format!("Next up: {kind} ({} min)", plan.duration_secs / 60)
        }
    }
}

impl Prompt for StdinPrompt {
    async fn await_permission(&mut self, checkpoint: Checkpoint) -> Permission {
        println!();
        println!("{}", heading(checkpoint));
        println!("{INSTRUCTIONS}");
        match self.lines.recv().await {
            Some(line) => Permission::parse(&line),
            None => Permission::Stop,
        }
    }
}
