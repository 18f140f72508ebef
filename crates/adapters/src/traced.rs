// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrapper for consistent observability

use crate::jobs::{AdapterError, InvocationHandle, JobRef, JobSystem};
use async_trait::async_trait;
use jf_core::{BuildStatus, JobSpec};
use tracing::Instrument;

/// Wrapper that adds tracing to any JobSystem.
///
/// Parameter values are never logged, only their count: they may be secret
/// and this layer has no redactor.
#[derive(Clone)]
pub struct TracedJobSystem<J> {
    inner: J,
}

impl<J> TracedJobSystem<J> {
    pub fn new(inner: J) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &J {
        &self.inner
    }
}

#[async_trait]
impl<J: JobSystem> JobSystem for TracedJobSystem<J> {
    async fn find_job(&self, name: &str) -> Result<JobRef, AdapterError> {
        let result = self.inner.find_job(name).await;
        tracing::info_span!("jobs.find", name).in_scope(|| match &result {
            Ok(job) => tracing::debug!(url = %job.url, "found"),
            Err(e) => tracing::info!(error = %e, "lookup failed"),
        });
        result
    }

    async fn invoke(&self, job: &JobRef, spec: &JobSpec) -> Result<InvocationHandle, AdapterError> {
        async {
            tracing::info!(param_count = spec.params.len(), "starting");
            let start = std::time::Instant::now();
            let result = self.inner.invoke(job, spec).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(handle) => tracing::info!(id = handle.id, elapsed_ms, "invoked"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "invoke failed"),
            }
            result
        }
        .instrument(tracing::info_span!("jobs.invoke", job = %job.name))
        .await
    }

    async fn poll(&self, handle: &InvocationHandle) -> Result<BuildStatus, AdapterError> {
        let result = self.inner.poll(handle).await;
        match &result {
            Ok(status) => tracing::trace!(
                job = %handle.job,
                id = handle.id,
                result = %status.result,
                progress = %status.progress,
                "polled"
            ),
            Err(e) => tracing::error!(job = %handle.job, id = handle.id, error = %e, "poll failed"),
        }
        result
    }

    async fn stop(&self, handle: &InvocationHandle, dequeue: bool) -> Result<(), AdapterError> {
        let result = self.inner.stop(handle, dequeue).await;
        tracing::info_span!("jobs.stop", job = %handle.job, id = handle.id, dequeue).in_scope(
            || match &result {
                Ok(()) => tracing::info!("stop requested"),
                Err(e) => tracing::warn!(error = %e, "stop failed (may be expected)"),
            },
        );
        result
    }

    async fn create_job(&self, name: &str, template: &str) -> Result<(), AdapterError> {
        let result = self.inner.create_job(name, template).await;
        match &result {
            Ok(()) => tracing::info!(name, "job created"),
            Err(e) => tracing::error!(name, error = %e, "create_job failed"),
        }
        result
    }

    async fn delete_job(&self, name: &str) -> Result<(), AdapterError> {
        let result = self.inner.delete_job(name).await;
        match &result {
            Ok(()) => tracing::info!(name, "job deleted"),
            Err(e) => tracing::error!(name, error = %e, "delete_job failed"),
        }
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
