// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

fn policy(initial: u64, max: u64, multiplier: f64, attempts: u32) -> ReconnectionPolicy {
    ReconnectionPolicy::new(ReconnectionConfig {
        initial_delay_ms: initial,
        max_delay_ms: max,
        multiplier,
        max_attempts: attempts,
    })
    .unwrap()
}

#[parameterized(
    first = { 0, 1_000 },
    second = { 1, 2_000 },
    third = { 2, 4_000 },
    fifth = { 4, 16_000 },
    capped = { 5, 30_000 },
    far = { 40, 30_000 },
)]
fn doubling_schedule(attempt: u32, expected_ms: u64) {
    let p = policy(1_000, 30_000, 2.0, 5);
    assert_eq!(p.delay(attempt), Duration::from_millis(expected_ms));
}

#[test]
fn delay_zero_is_initial_delay() {
    for initial in [0, 1, 250, 1_000, 30_000] {
        let p = policy(initial, 30_000, 3.0, 5);
        assert_eq!(p.delay(0), Duration::from_millis(initial));
    }
}

#[test]
fn delay_is_monotonic_and_bounded() {
    for multiplier in [1.0, 1.5, 2.0, 10.0] {
        let p = policy(100, 7_500, multiplier, 10);
        let mut previous = Duration::ZERO;
        for attempt in 0..200 {
            let d = p.delay(attempt);
            assert!(d >= previous, "delay decreased at attempt {attempt}");
            assert!(d <= Duration::from_millis(7_500));
            previous = d;
        }
    }
}

#[test]
fn huge_attempt_saturates_at_cap() {
    let p = policy(1_000, 60_000, 2.0, 5);
    assert_eq!(p.delay(u32::MAX), Duration::from_millis(60_000));
}

#[test]
fn retry_budget() {
    let p = policy(1_000, 30_000, 2.0, 5);
    assert!(p.allows(0));
    assert!(p.allows(4));
    assert!(!p.allows(5));
    assert!(!policy(1_000, 30_000, 2.0, 0).allows(0));
}

#[parameterized(
    shrinking = { 0.5 },
    nan = { f64::NAN },
    infinite = { f64::INFINITY },
)]
fn rejects_bad_multiplier(multiplier: f64) {
    let config = ReconnectionConfig {
        multiplier,
        ..ReconnectionConfig::default()
    };
    assert!(matches!(
        ReconnectionPolicy::new(config),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn rejects_initial_above_max() {
    let config = ReconnectionConfig {
        initial_delay_ms: 5_000,
        max_delay_ms: 1_000,
        ..ReconnectionConfig::default()
    };
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("exceeds max_delay_ms"));
}

#[test]
fn config_defaults_fill_missing_fields() {
    let config: ReconnectionConfig = serde_json::from_str(r#"{"max_attempts": 8}"#).unwrap();
    assert_eq!(config.max_attempts, 8);
    assert_eq!(config.initial_delay_ms, 1_000);
    assert_eq!(config.max_delay_ms, 30_000);
}
