// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_advance_moves_both_timelines() {
    let clock = FakeClock::new();
    let start = clock.now();
    let start_ms = clock.epoch_ms();

    clock.advance(Duration::from_secs(5));

    assert_eq!(clock.now() - start, Duration::from_secs(5));
    assert_eq!(clock.epoch_ms() - start_ms, 5_000);
}

#[test]
fn fake_clock_clones_share_time() {
    let clock = FakeClock::new();
    let other = clock.clone();
    let start = clock.now();

    other.advance(Duration::from_millis(250));

    assert_eq!(clock.now() - start, Duration::from_millis(250));
}

#[test]
fn fake_clock_set_epoch_ms() {
    let clock = FakeClock::new();
    let start = clock.now();
    clock.set_epoch_ms(42);
    assert_eq!(clock.epoch_ms(), 42);
    assert_eq!(clock.now(), start);
}

#[tokio::test]
async fn fake_clock_sleep_advances_instantly() {
    let clock = FakeClock::new();
    let start = clock.now();

    clock.sleep(Duration::from_secs(3600)).await;

    assert_eq!(clock.now() - start, Duration::from_secs(3600));
}

#[yare::parameterized(
    zero     = { 0.0 },
    negative = { -3.0 },
    nan      = { f64::NAN },
)]
fn accelerated_clock_rejects_bad_speedup(speedup: f64) {
    assert_eq!(AcceleratedClock::new(speedup).speedup(), 1.0);
}

#[yare::parameterized(
    huge = { 1e300, SPEEDUP_RANGE.1 },
    tiny = { 1e-300, SPEEDUP_RANGE.0 },
)]
fn accelerated_clock_clamps_speedup(speedup: f64, expected: f64) {
    assert_eq!(AcceleratedClock::new(speedup).speedup(), expected);
}

#[tokio::test]
async fn accelerated_clock_survives_extreme_factors() {
    let fast = AcceleratedClock::new(1e300);
    let slow = AcceleratedClock::new(1e-300);
    tokio::time::sleep(Duration::from_millis(2)).await;

    let start = fast.now();
    assert!(fast.now() >= start);
    assert!(fast.epoch_ms() >= SystemClock.epoch_ms());
    assert!(slow.now() >= slow.origin);
    tokio::time::timeout(Duration::from_millis(50), slow.sleep(Duration::MAX))
        .await
        .unwrap_err();
}

#[tokio::test]
async fn accelerated_clock_runs_faster_than_real_time() {
    let clock = AcceleratedClock::new(1000.0);
    let start = clock.now();
    let real_start = Instant::now();

    clock.sleep(Duration::from_secs(2)).await;

    assert!(clock.now() - start >= Duration::from_secs(2));
    assert!(real_start.elapsed() < Duration::from_secs(1));
}

#[test]
fn system_clock_epoch_is_plausible() {
    // 2020-01-01T00:00:00Z
    assert!(SystemClock.epoch_ms() > 1_577_836_800_000);
}

#[test]
#[serial_test::serial]
fn accelerated_clock_from_env() {
    std::env::set_var("JF_SPEEDUP", "50");
    assert_eq!(AcceleratedClock::from_env().speedup(), 50.0);

    std::env::set_var("JF_SPEEDUP", "1e308");
    assert_eq!(AcceleratedClock::from_env().speedup(), SPEEDUP_RANGE.1);

    std::env::set_var("JF_SPEEDUP", "fast");
    assert_eq!(AcceleratedClock::from_env().speedup(), 1.0);

    std::env::remove_var("JF_SPEEDUP");
    assert_eq!(AcceleratedClock::from_env().speedup(), 1.0);
}
