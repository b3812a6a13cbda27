//! Terminal implementations of the session collaborators.

mod notify;
mod progress;
mod prompt;
mod report;

pub use notify::DesktopNotifier;
pub use progress::ProgressRunner;
pub use prompt::StdinPrompt;
pub use report::TerminalReporter;
