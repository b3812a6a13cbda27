mod duration;
mod schedule;

pub use duration::{normalize, SECS_PER_MINUTE};
pub use schedule::{next_break, BreakKind, BreakPlan, IntervalKind};
