//! SM-2 (SuperMemo 2) spaced repetition algorithm implementation.
//!
//! The SM-2 algorithm calculates review intervals based on recall quality:
//! - Each item has an ease factor (EF) that adjusts based on performance
//! - Quality grades 0-2: repetitions reset to 0 and the interval to 1 day
//! - Quality grades 3-5: interval grows 1 day → 6 days → previous interval × EF
//! - EF is adjusted after every review, pass or fail, and never falls below 1.3

use super::{MIN_EASE_FACTOR, Quality, ReviewItem};
use crate::error::{FlashbackError, Result};
use chrono::{DateTime, Days, TimeDelta, TimeZone};
use log::debug;

/// Calculates the SM-2 state that follows a review graded `quality`.
pub fn calculate_next_review(quality: Quality, previous: &ReviewItem) -> ReviewItem {
    let (interval, repetitions) = if quality.is_passing() {
        let interval = match previous.repetitions {
            0 => 1,
            1 => 6,
            // Grows with the EF the item had going into this review
            _ => (f64::from(previous.interval) * previous.ease_factor).round() as u32,
        };
        (interval, previous.repetitions.saturating_add(1))
    } else {
        (1, 0)
    };

    let q = f64::from(quality.value());
    let mut ease_factor = previous.ease_factor + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02));
    if ease_factor < MIN_EASE_FACTOR {
        ease_factor = MIN_EASE_FACTOR;
    }

    debug!(
        "[SM-2] q={} reps {} -> {}, interval {}d -> {}d, EF {:.2} -> {:.2}",
        quality,
        previous.repetitions,
        repetitions,
        previous.interval,
        interval,
        previous.ease_factor,
        ease_factor
    );

    ReviewItem {
        interval,
        repetitions,
        ease_factor,
    }
}

/// Date of the next review: `now` moved forward by `interval_days` calendar
/// days, keeping the local time of day.
///
/// If that wall-clock time doesn't exist on the target day (a DST gap), the
/// result is `interval_days` × 24 hours after `now` instead.
pub fn next_review_date<Tz: TimeZone>(
    interval_days: u32,
    now: &DateTime<Tz>,
) -> Result<DateTime<Tz>> {
    now.clone()
        .checked_add_days(Days::new(u64::from(interval_days)))
        .or_else(|| now.clone().checked_add_signed(TimeDelta::days(i64::from(interval_days))))
        .ok_or(FlashbackError::DateOutOfRange(interval_days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate, Timelike, Utc};
    use proptest::prelude::*;

    fn q(value: i64) -> Quality {
        Quality::new(value).unwrap()
    }

    fn item(interval: u32, repetitions: u32, ease_factor: f64) -> ReviewItem {
        ReviewItem {
            interval,
            repetitions,
            ease_factor,
        }
    }

    #[test]
    fn test_first_review() {
        let next = calculate_next_review(q(4), &ReviewItem::new());
        assert_eq!(next.interval, 1);
        assert_eq!(next.repetitions, 1);
    }

    #[test]
    fn test_second_review() {
        let next = calculate_next_review(q(4), &item(1, 1, 2.5));
        assert_eq!(next.interval, 6);
        assert_eq!(next.repetitions, 2);
    }

    #[test]
    fn test_growth_uses_previous_ease_factor() {
        let next = calculate_next_review(q(5), &item(6, 2, 2.5));
        assert_eq!(next.interval, 15);
        assert_eq!(next.repetitions, 3);
        assert!((next.ease_factor - 2.6).abs() < 1e-9);
    }

    #[test]
    fn test_growth_rounds_half_away_from_zero() {
        // 5 * 2.5 = 12.5
        let next = calculate_next_review(q(4), &item(5, 3, 2.5));
        assert_eq!(next.interval, 13);
    }

    #[test]
    fn test_ease_factor_formula() {
        let next = calculate_next_review(q(3), &item(1, 1, 2.5));
        assert!((next.ease_factor - 2.36).abs() < 1e-9);
        let next = calculate_next_review(q(4), &item(1, 1, 2.5));
        assert!((next.ease_factor - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_quality_below_3_resets() {
        let next = calculate_next_review(q(2), &item(10, 5, 2.5));
        assert_eq!(next.interval, 1);
        assert_eq!(next.repetitions, 0);
        // EF should still be updated
        assert!((next.ease_factor - 2.18).abs() < 1e-9);
    }

    #[test]
    fn test_ef_floor() {
        let next = calculate_next_review(q(0), &item(1, 1, 1.3));
        assert_eq!(next.ease_factor, MIN_EASE_FACTOR);
        let next = calculate_next_review(q(3), &item(20, 4, 1.35));
        assert_eq!(next.ease_factor, MIN_EASE_FACTOR);
    }

    #[test]
    fn test_repetitions_saturate() {
        let next = calculate_next_review(q(5), &item(10, u32::MAX, 2.5));
        assert_eq!(next.repetitions, u32::MAX);
        assert_eq!(next.interval, 25);
    }

    #[test]
    fn test_next_review_date_keeps_time_of_day() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 14, 30, 5).unwrap();
        let next = next_review_date(6, &now).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 10, 25, 14, 30, 5).unwrap());
    }

    #[test]
    fn test_next_review_date_crosses_month_and_year() {
        let tz = FixedOffset::east_opt(3 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2026, 12, 30, 23, 15, 0).unwrap();
        let next = next_review_date(3, &now).unwrap();
        assert_eq!(
            next.date_naive(),
            NaiveDate::from_ymd_opt(2027, 1, 2).unwrap()
        );
        assert_eq!((next.hour(), next.minute()), (23, 15));
    }

    #[test]
    fn test_next_review_date_zero_days_is_now() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(next_review_date(0, &now).unwrap(), now);
    }

    #[test]
    fn test_next_review_date_out_of_range() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            next_review_date(u32::MAX, &now),
            Err(FlashbackError::DateOutOfRange(_))
        ));
    }

    fn any_item() -> impl Strategy<Value = ReviewItem> {
        (0u32..3650, 0u32..50, 1.3f64..4.0).prop_map(|(interval, repetitions, ease_factor)| {
            ReviewItem {
                interval,
                repetitions,
                ease_factor,
            }
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_ease_factor_floor(quality in 0i64..=5, previous in any_item()) {
            let next = calculate_next_review(q(quality), &previous);
            prop_assert!(next.ease_factor >= MIN_EASE_FACTOR);
        }

        #[test]
        fn prop_interval_at_least_one_day(quality in 0i64..=5, previous in any_item()) {
            let next = calculate_next_review(q(quality), &previous);
            prop_assert!(next.interval >= 1);
        }

        #[test]
        fn prop_failure_resets(quality in 0i64..3, previous in any_item()) {
            let next = calculate_next_review(q(quality), &previous);
            prop_assert_eq!(next.interval, 1);
            prop_assert_eq!(next.repetitions, 0);
        }

        #[test]
        fn prop_success_counts_up(quality in 3i64..=5, previous in any_item()) {
            let next = calculate_next_review(q(quality), &previous);
            prop_assert_eq!(next.repetitions, previous.repetitions + 1);
            match previous.repetitions {
                0 => prop_assert_eq!(next.interval, 1),
                1 => prop_assert_eq!(next.interval, 6),
                _ => prop_assert_eq!(
                    next.interval,
                    (f64::from(previous.interval) * previous.ease_factor).round() as u32
                ),
            }
        }

        #[test]
        fn prop_ease_factor_independent_of_branch(quality in 0i64..=5, a in any_item(), reps in 0u32..50) {
            let b = ReviewItem { repetitions: reps, ..a };
            prop_assert_eq!(
                calculate_next_review(q(quality), &a).ease_factor,
                calculate_next_review(q(quality), &b).ease_factor
            );
        }

        #[test]
        fn prop_next_review_date_adds_calendar_days(days in 0u32..2000, secs in 0i64..2_000_000_000) {
            let now = Utc.timestamp_opt(secs, 0).unwrap();
            let next = next_review_date(days, &now).unwrap();
            prop_assert_eq!((next.date_naive() - now.date_naive()).num_days(), i64::from(days));
            prop_assert_eq!(next.time(), now.time());
        }
    }
}
