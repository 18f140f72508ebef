// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the engine crate.

use std::time::Duration;

fn duration_ms(var: &str) -> Option<Duration> {
    let raw = std::env::var(var).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(_) => {
            tracing::warn!(var, value = %raw, "ignoring non-numeric duration");
            None
        }
    }
}

/// Poll interval override: JF_REPORT_INTERVAL_MS
pub fn report_interval() -> Option<Duration> {
    duration_ms("JF_REPORT_INTERVAL_MS")
}

/// How long a kill waits for stop confirmation: JF_KILL_GRACE_MS
pub fn kill_grace() -> Option<Duration> {
    duration_ms("JF_KILL_GRACE_MS")
}

/// Prefix prepended to every job name: JF_JOB_NAME_PREFIX
pub fn job_name_prefix() -> Option<String> {
    std::env::var("JF_JOB_NAME_PREFIX").ok()
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
