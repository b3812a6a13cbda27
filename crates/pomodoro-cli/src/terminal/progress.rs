use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use pomodoro_core::{IntervalKind, IntervalRunner};
use tokio::time::{sleep_until, Instant};

/// Column the interval title is centred in.
const TITLE_WIDTH: usize = 19;

/// Deadline used when the interval does not fit in an `Instant` (about 30 years).
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Centre `title` in `width` columns with one column of margin either side.
///
/// Odd padding puts the extra column on the right. A title wider than
/// `width` keeps only the margins.
pub fn pad_title(title: &str, width: usize) -> String {
    let len = title.chars().count();
    let padding = width.saturating_sub(len);
    let left = padding / 2;
    let right = padding - left;
    format!("{}{title}{}", " ".repeat(left + 1), " ".repeat(right + 1))
}

fn banners(label: &str) -> (&'static str, &'static str) {
    if label == IntervalKind::Focus.label() {
        ("Running pomodoro...", "Pomodoro finished")
    } else {
        ("Running break...", "Break finished")
    }
}

/// Waits out each interval while drawing a progress bar on stderr.
pub struct ProgressRunner {
    tick: Duration,
}

impl Default for ProgressRunner {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
        }
    }
}

impl ProgressRunner {
    fn bar(&self, duration_secs: u64, label: &str) -> ProgressBar {
        let style = ProgressStyle::with_template(
            "{prefix}[{wide_bar}] {percent:>3}% {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
        let bar = ProgressBar::new(duration_secs).with_style(style);
        bar.set_prefix(pad_title(label, TITLE_WIDTH));
        bar
    }
}

impl IntervalRunner for ProgressRunner {
    async fn run(&mut self, duration_secs: u64, label: &str) {
        let (opening, closing) = banners(label);
        println!("{opening}");

        let started = Instant::now();
        let deadline = started
            .checked_add(Duration::from_secs(duration_secs))
            .unwrap_or(started + FAR_FUTURE);
        let bar = self.bar(duration_secs, label);

        loop {
            let now = Instant::now();
            bar.set_position(now.duration_since(started).as_secs().min(duration_secs));
            if now >= deadline {
                break;
            }
            sleep_until(deadline.min(now + self.tick)).await;
        }

        bar.finish();
        println!("{closing}");
    }
}
