//! Rolling usage windows anchored at the subscription start.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};

/// Length of one billing window.
pub const WINDOW_DAYS: i64 = 30;

/// End of the window containing `now`: the first instant strictly after
/// `now` that lies a whole number of windows after `subscription_start`.
/// Millisecond precision, so the value round-trips through storage.
pub fn next_reset(subscription_start: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let window = Duration::days(WINDOW_DAYS).num_milliseconds();
    let start = subscription_start.timestamp_millis();
    let elapsed = now.timestamp_millis() - start;

    let next = start + (elapsed.div_euclid(window) + 1) * window;
    Utc.timestamp_millis_opt(next)
        .single()
        .unwrap_or_else(|| now + Duration::days(WINDOW_DAYS))
}

/// UTC midnight of the day containing `now`.
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
    }

    #[test]
    fn first_window_ends_thirty_days_after_start() {
        assert_eq!(next_reset(t0(), t0()), t0() + Duration::days(30));
        assert_eq!(
            next_reset(t0(), t0() + Duration::days(29)),
            t0() + Duration::days(30)
        );
    }

    #[test]
    fn day_31_belongs_to_the_second_window() {
        assert_eq!(
            next_reset(t0(), t0() + Duration::days(31)),
            t0() + Duration::days(60)
        );
    }

    #[test]
    fn window_boundary_starts_the_next_window() {
        assert_eq!(
            next_reset(t0(), t0() + Duration::days(30)),
            t0() + Duration::days(60)
        );
    }

    #[test]
    fn result_is_stable_within_a_window() {
        let a = next_reset(t0(), t0() + Duration::days(3));
        let b = next_reset(t0(), t0() + Duration::days(3) + Duration::milliseconds(7));
        assert_eq!(a, b);
        assert!(a > t0() + Duration::days(3));
    }

    #[test]
    fn start_in_the_future_still_yields_a_future_reset() {
        let now = t0() - Duration::days(5);
        let reset = next_reset(t0(), now);
        assert!(reset > now);
        assert_eq!(reset, t0());
    }

    #[test]
    fn day_starts_at_utc_midnight() {
        assert_eq!(
            start_of_day(t0()),
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
        );
    }
}
