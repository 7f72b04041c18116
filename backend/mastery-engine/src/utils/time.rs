use chrono::{DateTime, Utc};

const MILLIS_PER_DAY: f64 = 1000.0 * 60.0 * 60.0 * 24.0;

/// Fractional days from `earlier` to `later`. Negative when `later` is
/// actually the earlier instant; the recency decay tolerates that (a clock
/// skew just produces a weight slightly above 1).
pub fn fractional_days_between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> f64 {
    (later - earlier).num_milliseconds() as f64 / MILLIS_PER_DAY
}
