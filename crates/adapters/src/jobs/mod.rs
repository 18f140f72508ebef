// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job system adapters

mod script;

pub use script::{ScriptConfig, ScriptJobSystem};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeJob, FakeJobSystem, JobCall};

use async_trait::async_trait;
use jf_core::{BuildStatus, JobSpec};
use thiserror::Error;

/// Errors from job system operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    #[error("job not found: {0}")]
    JobNotFound(String),
    #[error("unknown invocation: {0}")]
    UnknownInvocation(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("{0} is not supported by this job system")]
    Unsupported(&'static str),
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for AdapterError {
    fn from(e: std::io::Error) -> Self {
        AdapterError::Io(e.to_string())
    }
}

/// A job the job system knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRef {
    pub name: String,
    /// Where a human finds the job (URL or script path).
    pub url: String,
}

/// A started (possibly still queued) invocation of a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InvocationHandle {
    pub job: String,
    /// Adapter-assigned identifier, unique within one job system instance.
    pub id: u64,
    /// Where a human finds the build output.
    pub console_url: String,
}

impl std::fmt::Display for InvocationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} #{}", self.job, self.id)
    }
}

/// Capability set the flow engine needs from a job system.
#[async_trait]
pub trait JobSystem: Clone + Send + Sync + 'static {
    /// Look up a job by its full name
    async fn find_job(&self, name: &str) -> Result<JobRef, AdapterError>;

    /// Start (or enqueue) a build of `job`
    async fn invoke(&self, job: &JobRef, spec: &JobSpec) -> Result<InvocationHandle, AdapterError>;

    /// Current status of an invocation
    async fn poll(&self, handle: &InvocationHandle) -> Result<BuildStatus, AdapterError>;

    /// Stop a running build, or remove it from the queue when `dequeue` is set
    async fn stop(&self, handle: &InvocationHandle, dequeue: bool) -> Result<(), AdapterError>;

    /// Create a job from a template. Default: unsupported.
    async fn create_job(&self, _name: &str, _template: &str) -> Result<(), AdapterError> {
        Err(AdapterError::Unsupported("create_job"))
    }

    /// Delete a job. Default: unsupported.
    async fn delete_job(&self, _name: &str) -> Result<(), AdapterError> {
        Err(AdapterError::Unsupported("delete_job"))
    }
}
