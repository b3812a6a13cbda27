//! Conversion from user-facing minutes to the seconds every other component
//! works in.

/// Seconds in one configured unit.
pub const SECS_PER_MINUTE: u64 = 60;

/// Convert a configured duration in minutes into seconds.
///
/// Negative values clamp to zero. Overflow saturates at `u64::MAX`.
pub fn normalize(raw_minutes: i64) -> u64 {
    if raw_minutes < 0 {
        return 0;
    }
    (raw_minutes as u64).saturating_mul(SECS_PER_MINUTE)
}
