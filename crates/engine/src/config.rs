// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flow-wide settings

use crate::env;
use std::time::Duration;

/// Default time between poll cycles.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Poll intervals are clamped to at least this.
pub const MIN_REPORT_INTERVAL: Duration = Duration::from_millis(1);

/// Default time a kill waits for the job system to confirm a stop.
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(60);

/// Settings that apply to a whole flow rather than to one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowConfig {
    /// Poll interval for scopes that don't set their own
    pub report_interval: Duration,
    pub kill_grace: Duration,
    /// Prepended to every job name before lookup and invocation
    pub job_name_prefix: String,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            report_interval: DEFAULT_REPORT_INTERVAL,
            kill_grace: DEFAULT_KILL_GRACE,
            job_name_prefix: String::new(),
        }
    }
}

impl FlowConfig {
    /// Defaults overridden by `JF_REPORT_INTERVAL_MS`, `JF_KILL_GRACE_MS` and
    /// `JF_JOB_NAME_PREFIX`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            report_interval: env::report_interval().unwrap_or(defaults.report_interval),
            kill_grace: env::kill_grace().unwrap_or(defaults.kill_grace),
            job_name_prefix: env::job_name_prefix().unwrap_or(defaults.job_name_prefix),
        }
    }

    pub fn report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    pub fn kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    pub fn job_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.job_name_prefix = prefix.into();
        self
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
