// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Simulated job system for deterministic flow tests
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{AdapterError, InvocationHandle, JobRef, JobSystem};
use async_trait::async_trait;
use jf_core::{BuildResult, BuildStatus, Clock, JobSpec, Params};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Recorded job system call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobCall {
    Find { name: String },
    Invoke { name: String, id: u64, params: Params },
    Poll { name: String, id: u64 },
    Stop { name: String, id: u64, dequeue: bool },
    Create { name: String },
    Delete { name: String },
}

/// Behaviour of a simulated job.
#[derive(Debug, Clone)]
pub struct FakeJob {
    /// Time from leaving the queue to finishing
    pub exec_time: Duration,
    /// Time spent queued before running
    pub invocation_delay: Duration,
    /// The first `max_fails` invocations end in FAILURE
    pub max_fails: u32,
    /// Result once `max_fails` invocations have failed
    pub final_result: BuildResult,
    /// Jobs brought into existence when a build of this job finishes
    pub creates: Vec<String>,
    /// `stop` has no effect on builds of this job
    pub ignores_stop: bool,
}

impl FakeJob {
    pub fn new(exec_time: Duration) -> Self {
        Self {
            exec_time,
            invocation_delay: Duration::from_millis(100),
            max_fails: 0,
            final_result: BuildResult::Success,
            creates: Vec::new(),
            ignores_stop: false,
        }
    }

    pub fn invocation_delay(mut self, delay: Duration) -> Self {
        self.invocation_delay = delay;
        self
    }

    pub fn max_fails(mut self, n: u32) -> Self {
        self.max_fails = n;
        self
    }

    /// Every invocation fails.
    pub fn failing(self) -> Self {
        self.max_fails(u32::MAX)
    }

    pub fn final_result(mut self, result: BuildResult) -> Self {
        self.final_result = result;
        self
    }

    pub fn creates(mut self, job: impl Into<String>) -> Self {
        self.creates.push(job.into());
        self
    }

    pub fn ignores_stop(mut self) -> Self {
        self.ignores_stop = true;
        self
    }
}

#[derive(Debug, Clone)]
struct FakeBuild {
    job: String,
    build_number: u32,
    start_at: Instant,
    end_at: Instant,
    result: BuildResult,
    stopped: Option<BuildResult>,
    ignores_stop: bool,
    creates: Vec<String>,
}

#[derive(Default)]
struct FakeJobSystemState {
    jobs: HashMap<String, FakeJob>,
    /// Registered but not existing until created by a hook or `create_job`
    dormant: HashMap<String, FakeJob>,
    deleted: HashMap<String, FakeJob>,
    unreachable: HashSet<String>,
    builds: HashMap<u64, FakeBuild>,
    build_counts: HashMap<String, u32>,
    calls: Vec<JobCall>,
    next_id: u64,
}

/// Simulated job system whose builds progress on a shared [`Clock`].
///
/// Used with a [`jf_core::FakeClock`], a flow of fifty-second jobs runs in
/// microseconds and always produces the same poll sequence.
#[derive(Clone)]
pub struct FakeJobSystem<C: Clock> {
    clock: C,
    inner: Arc<Mutex<FakeJobSystemState>>,
}

impl<C: Clock> FakeJobSystem<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            inner: Arc::new(Mutex::new(FakeJobSystemState::default())),
        }
    }

    /// Register an existing job
    pub fn add_job(&self, name: &str, job: FakeJob) {
        self.inner.lock().jobs.insert(name.to_string(), job);
    }

    /// Register a job that only exists once something creates it
    pub fn add_flow_created_job(&self, name: &str, job: FakeJob) {
        self.inner.lock().dormant.insert(name.to_string(), job);
    }

    /// Remove a job, as if deleted behind the flow's back
    pub fn remove_job(&self, name: &str) {
        self.inner.lock().jobs.remove(name);
    }

    /// Make lookups of `name` fail with a transport error
    pub fn set_unreachable(&self, name: &str) {
        self.inner.lock().unreachable.insert(name.to_string());
    }

    pub fn has_job(&self, name: &str) -> bool {
        self.inner.lock().jobs.contains_key(name)
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<JobCall> {
        self.inner.lock().calls.clone()
    }

    /// Names of invoked jobs, in invocation order
    pub fn invoked(&self) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                JobCall::Invoke { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of builds started for `name`
    pub fn invocations(&self, name: &str) -> u32 {
        self.inner
            .lock()
            .build_counts
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    fn build_mut<'a>(
        state: &'a mut FakeJobSystemState,
        handle: &InvocationHandle,
    ) -> Result<&'a mut FakeBuild, AdapterError> {
        state
            .builds
            .get_mut(&handle.id)
            .ok_or_else(|| AdapterError::UnknownInvocation(handle.to_string()))
    }
}

fn activate(state: &mut FakeJobSystemState, name: &str) {
    if state.jobs.contains_key(name) {
        return;
    }
    if let Some(job) = state
        .dormant
        .remove(name)
        .or_else(|| state.deleted.remove(name))
    {
        state.jobs.insert(name.to_string(), job);
    }
}

#[async_trait]
impl<C: Clock> JobSystem for FakeJobSystem<C> {
    async fn find_job(&self, name: &str) -> Result<JobRef, AdapterError> {
        let mut inner = self.inner.lock();
        inner.calls.push(JobCall::Find {
            name: name.to_string(),
        });

        if inner.unreachable.contains(name) {
            return Err(AdapterError::Transport(format!(
                "connection refused looking up '{}'",
                name
            )));
        }
        if !inner.jobs.contains_key(name) {
            return Err(AdapterError::JobNotFound(name.to_string()));
        }
        Ok(JobRef {
            name: name.to_string(),
            url: format!("http://fake.ci/job/{}", name),
        })
    }

    async fn invoke(&self, job: &JobRef, spec: &JobSpec) -> Result<InvocationHandle, AdapterError> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        inner.next_id += 1;
        let id = inner.next_id;
        inner.calls.push(JobCall::Invoke {
            name: job.name.clone(),
            id,
            params: spec.params.clone(),
        });

        let def = inner
            .jobs
            .get(&job.name)
            .cloned()
            .ok_or_else(|| AdapterError::JobNotFound(job.name.clone()))?;

        let count = inner.build_counts.entry(job.name.clone()).or_insert(0);
        *count += 1;
        let build_number = *count;

        let result = if build_number <= def.max_fails {
            BuildResult::Failure
        } else {
            def.final_result
        };
        let start_at = now + def.invocation_delay;
        inner.builds.insert(
            id,
            FakeBuild {
                job: job.name.clone(),
                build_number,
                start_at,
                end_at: start_at + def.exec_time,
                result,
                stopped: None,
                ignores_stop: def.ignores_stop,
                creates: def.creates.clone(),
            },
        );

        Ok(InvocationHandle {
            job: job.name.clone(),
            id,
            console_url: format!("{}/{}/console", job.url, build_number),
        })
    }

    async fn poll(&self, handle: &InvocationHandle) -> Result<BuildStatus, AdapterError> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        inner.calls.push(JobCall::Poll {
            name: handle.job.clone(),
            id: handle.id,
        });

        let build = Self::build_mut(&mut inner, handle)?;
        if let Some(stopped) = build.stopped {
            let number = (stopped != BuildResult::Dequeued).then_some(build.build_number);
            return Ok(BuildStatus::finished(stopped, number));
        }
        if now < build.start_at {
            return Ok(BuildStatus::queued());
        }
        if now < build.end_at {
            return Ok(BuildStatus::running(build.build_number));
        }

        let status = BuildStatus::finished(build.result, Some(build.build_number));
        let creates = std::mem::take(&mut build.creates);
        for name in creates {
            tracing::debug!(job = %handle.job, created = %name, "fake build created job");
            activate(&mut inner, &name);
        }
        Ok(status)
    }

    async fn stop(&self, handle: &InvocationHandle, dequeue: bool) -> Result<(), AdapterError> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        inner.calls.push(JobCall::Stop {
            name: handle.job.clone(),
            id: handle.id,
            dequeue,
        });

        let build = Self::build_mut(&mut inner, handle)?;
        if build.ignores_stop || build.stopped.is_some() || now >= build.end_at {
            return Ok(());
        }
        build.stopped = Some(if now < build.start_at {
            BuildResult::Dequeued
        } else {
            BuildResult::Aborted
        });
        Ok(())
    }

    async fn create_job(&self, name: &str, _template: &str) -> Result<(), AdapterError> {
        let mut inner = self.inner.lock();
        inner.calls.push(JobCall::Create {
            name: name.to_string(),
        });
        activate(&mut inner, name);
        if !inner.jobs.contains_key(name) {
            inner
                .jobs
                .insert(name.to_string(), FakeJob::new(Duration::ZERO));
        }
        Ok(())
    }

    async fn delete_job(&self, name: &str) -> Result<(), AdapterError> {
        let mut inner = self.inner.lock();
        inner.calls.push(JobCall::Delete {
            name: name.to_string(),
        });
        let job = inner
            .jobs
            .remove(name)
            .ok_or_else(|| AdapterError::JobNotFound(name.to_string()))?;
        inner.deleted.insert(name.to_string(), job);
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
