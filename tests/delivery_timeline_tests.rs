//! Delivery timeline behavior
//!
//! Tests for transit windows, the Sunday rule and the business-hours window.

use chrono::{Datelike, Duration, NaiveDate, Timelike, Weekday};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, BTreeSet};
use storefront_datagen::delivery::{skip_sundays, BusinessHours, DeliveryTimelineSimulator};
use storefront_datagen::shipping::ShippingOption;
use storefront_datagen::simulation::TemporalConstraintSampler;
use storefront_datagen::types::parse_timestamp;

/// Friday order on a 1-3 day option
#[test]
fn test_friday_order_transit_window() {
    let simulator = DeliveryTimelineSimulator::default();
    let option = ShippingOption::new("carrier_3", "Express", 1, 3);
    let ordered = parse_timestamp("2024-03-08 10:00:00").unwrap();
    assert_eq!(ordered.weekday(), Weekday::Fri);

    let mut rng = StdRng::seed_from_u64(3);
    let mut transit_seen = BTreeSet::new();
    for _ in 0..2_000 {
        let timeline = simulator.simulate(ordered, &option, &mut rng);

        assert!((1..=3).contains(&timeline.transit_days));
        transit_seen.insert(timeline.transit_days);
        assert_eq!(
            timeline.estimated_delivery_at.date(),
            ordered.date() + Duration::days(i64::from(timeline.transit_days))
        );

        // A Friday order plus two transit days lands on Sunday, and so can the variance.
        assert_ne!(timeline.delivered_at.weekday(), Weekday::Sun);
        if timeline.sunday_shift_days == 1 {
            assert_eq!(timeline.delivered_at.weekday(), Weekday::Mon);
        }
    }
    assert_eq!(transit_seen, BTreeSet::from([1, 2, 3]));
}

/// The Sunday rule moves exactly one day and leaves Saturdays alone
#[test]
fn test_sunday_shifts_to_monday() {
    let sunday = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
    let saturday = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();

    assert_eq!(skip_sundays(sunday), (NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(), 1));
    assert_eq!(skip_sundays(saturday), (saturday, 0));
}

/// Variance offsets follow the configured distribution
#[test]
fn test_variance_distribution() {
    let simulator = DeliveryTimelineSimulator::default();
    let option = ShippingOption::new("carrier_1", "Ground", 5, 5);
    // Wednesday + 5 days = Monday, so no offset in {-1..=2} reaches a Sunday.
    let ordered = parse_timestamp("2024-03-06 12:00:00").unwrap();

    let mut rng = StdRng::seed_from_u64(17);
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    let draws = 20_000;
    for _ in 0..draws {
        let timeline = simulator.simulate(ordered, &option, &mut rng);
        assert_eq!(timeline.sunday_shift_days, 0);
        assert_eq!(
            timeline.delivered_at.date(),
            timeline.estimated_delivery_at.date() + Duration::days(timeline.variance_days)
        );
        *counts.entry(timeline.variance_days).or_default() += 1;
    }

    let share = |offset: i64| counts.get(&offset).copied().unwrap_or(0) as f64 / draws as f64;
    assert_eq!(counts.keys().copied().collect::<Vec<_>>(), vec![-1, 0, 1, 2]);
    assert!((share(-1) - 0.20).abs() < 0.02);
    assert!((share(0) - 0.60).abs() < 0.02);
    assert!((share(1) - 0.10).abs() < 0.02);
    assert!((share(2) - 0.10).abs() < 0.02);
}

/// Custom business hours are honored
#[test]
fn test_custom_business_hours() {
    let hours = BusinessHours { start_hour: 14, end_hour: 16 };
    let simulator = DeliveryTimelineSimulator::new(hours);
    let option = ShippingOption::new("carrier_2", "Priority Mail", 3, 5);
    let ordered = parse_timestamp("2024-07-01 23:30:00").unwrap();

    let mut rng = StdRng::seed_from_u64(8);
    for _ in 0..500 {
        let timeline = simulator.simulate(ordered, &option, &mut rng);
        for instant in [timeline.estimated_delivery_at, timeline.delivered_at] {
            assert!((14..16).contains(&instant.hour()));
        }
    }
}

/// A zero-day option can deliver before the order is placed; that is reported, not fixed
#[test]
fn test_underrun_is_reported() {
    let simulator = DeliveryTimelineSimulator::default();
    let option = ShippingOption::new("carrier_x", "Same Day", 0, 0);
    let ordered = parse_timestamp("2024-03-06 17:59:00").unwrap();

    let mut rng = StdRng::seed_from_u64(5);
    let underruns = (0..1_000)
        .map(|_| simulator.simulate(ordered, &option, &mut rng))
        .filter(|timeline| timeline.precedes_order(ordered))
        .count();

    assert!(underruns > 0);
}

/// Sampling a degenerate interval returns its single instant
#[test]
fn test_sampler_on_a_point() {
    let instant = parse_timestamp("2024-03-05 09:05:07").unwrap();
    let sampler = TemporalConstraintSampler::new();
    let mut rng = StdRng::seed_from_u64(1);

    assert_eq!(sampler.sample(instant, instant, &mut rng), instant);
    assert_eq!(sampler.sample(instant, instant - Duration::hours(1), &mut rng), instant);
}
