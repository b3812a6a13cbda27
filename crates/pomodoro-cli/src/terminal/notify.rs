use pomodoro_core::Notifier;
use tokio::process::Command;
use tracing::debug;

/// Desktop pop-ups via the platform's notification command.
///
/// The command is spawned on the current tokio runtime and never awaited by
/// the session; failures are only logged.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    title: String,
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self {
            title: "Pomodoro".to_string(),
        }
    }
}

impl DesktopNotifier {
    #[cfg(target_os = "linux")]
    fn command(&self, message: &str) -> Option<Command> {
        let mut cmd = Command::new("notify-send");
        cmd.args([self.title.as_str(), message]);
        Some(cmd)
    }

    #[cfg(target_os = "macos")]
    fn command(&self, message: &str) -> Option<Command> {
        let script = format!(
            r#"display notification "{}" with title "{}""#,
            message.replace('"', r#"\""#).replace('\n', " "),
            self.title.replace('"', r#"\""#)
        );
        let mut cmd = Command::new("osascript");
        cmd.args(["-e", &script]);
        Some(cmd)
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    fn command(&self, _message: &str) -> Option<Command> {
        None
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, message: &str) {
        let Some(mut cmd) = self.command(message) else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("no runtime, skipping desktop notification");
            return;
        };
        handle.spawn(async move {
            if let Err(e) = cmd.output().await {
                debug!(error = %e, "Failed to send desktop notification");
            }
        });
    }
}
