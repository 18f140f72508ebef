//! Test helpers for behavioral specifications.
//!
//! A [`World`] bundles a simulated job system on a virtual clock with a
//! captured console, so a flow of minute-long jobs finishes instantly and
//! always prints the same lines.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

pub use jf_adapters::{FakeJob, FakeJobSystem, JobCall, ScriptConfig, ScriptJobSystem};
pub use jf_core::{BuildResult, Clock, FakeClock, Progress, SystemClock};
pub use jf_engine::{
    CancelToken, ConsoleCapture, Flow, FlowConfig, FlowError, FlowFailure, FlowReport,
    ScopeOptions,
};
pub use std::time::Duration;

use std::fs;
use tempfile::TempDir;

// Short real-time cadence for flows against local scripts.
pub const SCRIPT_POLL_MS: u64 = 20;
pub const SCRIPT_KILL_GRACE_MS: u64 = 5000;
pub const SCRIPT_FLOW_MAX_MS: u64 = 20_000;

pub fn secs(s: f64) -> Duration {
    Duration::from_secs_f64(s)
}

/// Simulated job system, virtual clock and captured console.
pub struct World {
    pub clock: FakeClock,
    pub jobs: FakeJobSystem<FakeClock>,
    pub console: ConsoleCapture,
}

impl World {
    pub fn new() -> Self {
        let clock = FakeClock::new();
        Self {
            jobs: FakeJobSystem::new(clock.clone()),
            clock,
            console: ConsoleCapture::new(),
        }
    }

    /// Register a job that succeeds after `exec_secs` of virtual time.
    pub fn job(&self, name: &str, exec_secs: f64) -> &Self {
        self.jobs.add_job(name, FakeJob::new(secs(exec_secs)));
        self
    }

    /// Register a job that always fails after `exec_secs`.
    pub fn failing_job(&self, name: &str, exec_secs: f64) -> &Self {
        self.jobs.add_job(name, FakeJob::new(secs(exec_secs)).failing());
        self
    }

    pub fn flow(&self) -> Flow<FakeJobSystem<FakeClock>, FakeClock> {
        Flow::new(self.jobs.clone(), self.clock.clone())
            .config(
                FlowConfig::default()
                    .report_interval(Duration::from_secs(1))
                    .kill_grace(Duration::from_secs(30)),
            )
            .console(self.console.clone())
    }

    /// The block printed after `--- Final status ---`.
    pub fn final_status(&self) -> String {
        let contents = self.console.contents();
        let (_, block) = contents
            .split_once("--- Final status ---\n")
            .expect("no final status printed");
        block.to_string()
    }
}

/// Script directory with one `<name>.sh` per entry, plus a log directory.
pub struct ScriptWorld {
    pub dir: TempDir,
    pub jobs: ScriptJobSystem,
    pub console: ConsoleCapture,
}

impl ScriptWorld {
    pub fn new(scripts: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let script_dir = dir.path().join("jobs");
        fs::create_dir_all(&script_dir).unwrap();
        for (name, body) in scripts {
            fs::write(script_dir.join(format!("{}.sh", name)), body).unwrap();
        }
        let config = ScriptConfig::new(&script_dir).log_dir(dir.path().join("logs"));
        Self {
            dir,
            jobs: ScriptJobSystem::new(config),
            console: ConsoleCapture::new(),
        }
    }

    pub fn flow(&self) -> Flow<ScriptJobSystem, SystemClock> {
        Flow::new(self.jobs.clone(), SystemClock)
            .config(
                FlowConfig::default()
                    .report_interval(Duration::from_millis(SCRIPT_POLL_MS))
                    .kill_grace(Duration::from_millis(SCRIPT_KILL_GRACE_MS)),
            )
            .console(self.console.clone())
    }

    pub fn log(&self, job: &str) -> String {
        fs::read_to_string(self.dir.path().join("logs").join(format!("{}.log", job)))
            .unwrap_or_default()
    }
}

/// Bound a real-time flow so a hung script fails the test instead of the run.
pub async fn within_limit<F: std::future::Future>(flow: F) -> F::Output {
    tokio::time::timeout(Duration::from_millis(SCRIPT_FLOW_MAX_MS), flow)
        .await
        .expect("flow did not finish in time")
}

pub fn failure_names(failure: &FlowFailure) -> Vec<String> {
    failure
        .error
        .failed_jobs()
        .iter()
        .map(|j| j.name.clone())
        .collect()
}
