// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flow control tests, driven on a virtual clock

mod cancel;
mod kill;
mod missing;
mod parallel;
mod secrets;
mod serial;
mod timeout;

use crate::test_helpers::TestContext;
use crate::{CancelToken, FlowError, FlowFailure, FlowReport, ScopeOptions};
use async_trait::async_trait;
use jf_adapters::{AdapterError, FakeJob, InvocationHandle, JobCall, JobRef, JobSystem};
use jf_core::{BuildResult, BuildStatus, JobSpec, Progress};
use std::time::Duration;

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

/// Result and progress of the only record named `name`.
fn state(report: &FlowReport, name: &str) -> (BuildResult, Progress) {
    let found = report.find(name);
    assert_eq!(found.len(), 1, "expected exactly one record for {}", name);
    (found[0].result, found[0].progress)
}

fn failure_names(failure: &FlowFailure) -> Vec<String> {
    failure
        .error
        .failed_jobs()
        .iter()
        .map(|j| j.name.clone())
        .collect()
}

/// Index of the first recorded call matching `pred`.
fn call_index(calls: &[JobCall], pred: impl Fn(&JobCall) -> bool) -> usize {
    calls
        .iter()
        .position(pred)
        .unwrap_or_else(|| panic!("no matching call in {:?}", calls))
}

fn is_invoke(name: &'static str) -> impl Fn(&JobCall) -> bool {
    move |c| matches!(c, JobCall::Invoke { name: n, .. } if n == name)
}

fn is_poll(name: &'static str) -> impl Fn(&JobCall) -> bool {
    move |c| matches!(c, JobCall::Poll { name: n, .. } if n == name)
}

fn stops(calls: &[JobCall]) -> Vec<(String, bool)> {
    calls
        .iter()
        .filter_map(|c| match c {
            JobCall::Stop { name, dequeue, .. } => Some((name.clone(), *dequeue)),
            _ => None,
        })
        .collect()
}

/// Job system wrapper injecting faults and cancellation into a fake.
#[derive(Clone)]
struct Hooked<J> {
    inner: J,
    fail_invoke_of: Option<String>,
    fail_poll_of: Option<String>,
    cancel_on_poll_of: Option<(String, CancelToken)>,
}

impl<J> Hooked<J> {
    fn new(inner: J) -> Self {
        Self {
            inner,
            fail_invoke_of: None,
            fail_poll_of: None,
            cancel_on_poll_of: None,
        }
    }
}

#[async_trait]
impl<J: JobSystem> JobSystem for Hooked<J> {
    async fn find_job(&self, name: &str) -> Result<JobRef, AdapterError> {
        self.inner.find_job(name).await
    }

    async fn invoke(&self, job: &JobRef, spec: &JobSpec) -> Result<InvocationHandle, AdapterError> {
        if self.fail_invoke_of.as_deref() == Some(job.name.as_str()) {
            let values: Vec<&str> = spec.params.values().map(String::as_str).collect();
            return Err(AdapterError::Transport(format!(
                "server rejected {} with {}",
                job.name,
                values.join(",")
            )));
        }
        self.inner.invoke(job, spec).await
    }

    async fn poll(&self, handle: &InvocationHandle) -> Result<BuildStatus, AdapterError> {
        if let Some((name, token)) = &self.cancel_on_poll_of {
            if *name == handle.job {
                token.cancel("SIGTERM");
            }
        }
        if self.fail_poll_of.as_deref() == Some(handle.job.as_str()) {
            return Err(AdapterError::Transport("connection reset".to_string()));
        }
        self.inner.poll(handle).await
    }

    async fn stop(&self, handle: &InvocationHandle, dequeue: bool) -> Result<(), AdapterError> {
        self.inner.stop(handle, dequeue).await
    }
}
