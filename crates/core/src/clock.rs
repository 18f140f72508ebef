// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Injectable time sources.
//!
//! The flow engine never reads the wall clock directly. Every timestamp,
//! deadline and poll sleep goes through a [`Clock`], so production flows run
//! on [`SystemClock`], long real-time demos can run on [`AcceleratedClock`],
//! and tests run on a [`FakeClock`] whose sleeps complete instantly by
//! advancing virtual time.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

/// Source of time for the flow engine and simulated adapters.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Monotonic "now", used for deadlines and elapsed time.
    fn now(&self) -> Instant;

    /// Wall-clock milliseconds since the Unix epoch, used for record timestamps.
    fn epoch_ms(&self) -> u64;

    /// Suspend the caller for `duration`.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

fn system_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Real time, backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        system_epoch_ms()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// Real time running `speedup` times faster than the wall clock.
///
/// A flow with a 60s timeout and a 5s report interval on a speedup of 100
/// finishes its bookkeeping in 0.6s of real time. Only useful together with
/// adapters that measure time through the same clock.
#[derive(Debug, Clone, Copy)]
pub struct AcceleratedClock {
    origin: Instant,
    origin_epoch_ms: u64,
    speedup: f64,
}

/// Speedup factors are clamped to this range.
pub const SPEEDUP_RANGE: (f64, f64) = (1e-3, 1e6);

/// Virtual time stops advancing after this long, about a century.
const MAX_VIRTUAL_ELAPSED: Duration = Duration::from_secs(100 * 365 * 86_400);

impl AcceleratedClock {
    /// Clock running `speedup` times faster than real time. Non-finite or
    /// non-positive factors mean real time; others are clamped to
    /// [`SPEEDUP_RANGE`].
    pub fn new(speedup: f64) -> Self {
        let speedup = if speedup.is_finite() && speedup > 0.0 {
            speedup.clamp(SPEEDUP_RANGE.0, SPEEDUP_RANGE.1)
        } else {
            1.0
        };
        Self {
            origin: Instant::now(),
            origin_epoch_ms: system_epoch_ms(),
            speedup,
        }
    }

    /// Speedup from `JF_SPEEDUP`, real time when unset or invalid.
    pub fn from_env() -> Self {
        let speedup = std::env::var("JF_SPEEDUP")
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or(1.0);
        Self::new(speedup)
    }

    pub fn speedup(&self) -> f64 {
        self.speedup
    }

    fn virtual_elapsed(&self) -> Duration {
        Duration::try_from_secs_f64(self.origin.elapsed().as_secs_f64() * self.speedup)
            .unwrap_or(MAX_VIRTUAL_ELAPSED)
            .min(MAX_VIRTUAL_ELAPSED)
    }
}

impl Clock for AcceleratedClock {
    fn now(&self) -> Instant {
        self.origin
            .checked_add(self.virtual_elapsed())
            .unwrap_or(self.origin)
    }

    fn epoch_ms(&self) -> u64 {
        let elapsed_ms = u64::try_from(self.virtual_elapsed().as_millis()).unwrap_or(u64::MAX);
        self.origin_epoch_ms.saturating_add(elapsed_ms)
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        let real = Duration::try_from_secs_f64(duration.as_secs_f64() / self.speedup)
            .unwrap_or(Duration::MAX);
        tokio::time::sleep(real)
    }
}

struct FakeClockState {
    now: Instant,
    epoch_ms: u64,
}

/// Virtual clock for deterministic tests.
///
/// Clones share the same time. `sleep` advances the shared time and returns
/// immediately, so a flow with a 50s job completes in microseconds.
#[derive(Clone)]
pub struct FakeClock {
    inner: Arc<Mutex<FakeClockState>>,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeClockState {
                now: Instant::now(),
                epoch_ms: 1_000_000,
            })),
        }
    }
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        let mut state = self.inner.lock();
        state.now += duration;
        state.epoch_ms += duration.as_millis() as u64;
    }

    /// Set the wall-clock epoch without moving the monotonic time.
    pub fn set_epoch_ms(&self, epoch_ms: u64) {
        self.inner.lock().epoch_ms = epoch_ms;
    }
}

impl std::fmt::Debug for FakeClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeClock")
            .field("epoch_ms", &self.inner.lock().epoch_ms)
            .finish()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.inner.lock().now
    }

    fn epoch_ms(&self) -> u64 {
        self.inner.lock().epoch_ms
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
