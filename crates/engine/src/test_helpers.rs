// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for the engine crate.

use crate::{ConsoleCapture, Flow, FlowConfig};
use jf_adapters::{FakeJob, FakeJobSystem};
use jf_core::FakeClock;
use std::time::Duration;

pub(crate) type TestFlow = Flow<FakeJobSystem<FakeClock>, FakeClock>;

/// Fake job system, virtual clock and captured console for one flow.
pub(crate) struct TestContext {
    pub clock: FakeClock,
    pub jobs: FakeJobSystem<FakeClock>,
    pub console: ConsoleCapture,
}

impl TestContext {
    pub fn new() -> Self {
        let clock = FakeClock::new();
        Self {
            jobs: FakeJobSystem::new(clock.clone()),
            clock,
            console: ConsoleCapture::new(),
        }
    }

    /// Register `name` running for `secs` seconds of virtual time.
    pub fn job(&self, name: &str, secs: f64) -> &Self {
        self.jobs.add_job(name, FakeJob::new(Duration::from_secs_f64(secs)));
        self
    }

    pub fn add(&self, name: &str, job: FakeJob) -> &Self {
        self.jobs.add_job(name, job);
        self
    }

    /// Flow polling every second, with a ten second kill grace.
    pub fn flow(&self) -> TestFlow {
        Flow::new(self.jobs.clone(), self.clock.clone())
            .config(
                FlowConfig::default()
                    .report_interval(Duration::from_secs(1))
                    .kill_grace(Duration::from_secs(10)),
            )
            .console(self.console.clone())
    }

    pub fn lines(&self) -> Vec<String> {
        self.console.lines()
    }

    /// Whether some console line contains `needle`.
    pub fn printed(&self, needle: &str) -> bool {
        self.console.contents().contains(needle)
    }
}
