// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flow failure types
//!
//! Every message here is built from already-masked data: failed jobs carry
//! the masked parameter text of their record, and adapter errors are scrubbed
//! before they are wrapped.

use crate::report::FlowReport;
use jf_adapters::AdapterError;
use jf_core::{format_duration, BuildResult, InvocationRecord, RedactError};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A checked job that made its scope fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedJob {
    pub name: String,
    /// Masked display form of the parameters, e.g. `(a='1', password='******')`
    pub params: String,
    pub result: BuildResult,
    pub missing: bool,
    pub console_url: Option<String>,
}

impl FailedJob {
    pub(crate) fn from_record(record: &InvocationRecord, params: String) -> Self {
        Self {
            name: record.name.clone(),
            params,
            result: record.result,
            missing: record.missing,
            console_url: record.console_url.clone(),
        }
    }
}

impl fmt::Display for FailedJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed child job: '{}'", self.name)?;
        if !self.params.is_empty() {
            write!(f, " {}", self.params)?;
        }
        if self.missing {
            return write!(f, " - MISSING JOB");
        }
        write!(f, " {}", self.result)?;
        if let Some(url) = &self.console_url {
            write!(f, " - build: {}", url)?;
        }
        Ok(())
    }
}

fn not_found_lines(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("Job not found: '{}'", n))
        .collect::<Vec<_>>()
        .join("\n")
}

fn failed_lines(jobs: &[FailedJob]) -> String {
    jobs.iter()
        .map(|j| j.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("'{}'", n))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Why a scope (and so the flow) failed.
#[derive(Debug, Clone, Error)]
pub enum FlowError {
    /// Jobs absent at resolve time in a scope that doesn't allow it
    #[error("{}", not_found_lines(.names))]
    MissingJobs { names: Vec<String> },
    /// A serial scope stopped at a failing checked child
    #[error("{job}")]
    FailedChild { job: FailedJob },
    /// A parallel scope finished with failing checked children
    #[error("Failed child jobs:\n{}", failed_lines(.jobs))]
    FailedChildren { jobs: Vec<FailedJob> },
    #[error(
        "Timeout after {} in {scope} flow, unfinished jobs: {}",
        format_duration(Duration::clone(.timeout)),
        quoted(.unfinished)
    )]
    Timeout {
        scope: String,
        timeout: Duration,
        unfinished: Vec<String>,
    },
    #[error("Flow cancelled by {signal}")]
    Cancelled { signal: String },
    #[error("job system error: {0}")]
    Adapter(#[from] AdapterError),
    #[error(transparent)]
    InvalidSecretPattern(#[from] RedactError),
}

impl FlowError {
    /// Failed jobs carried by this error, if it is a child-job failure.
    pub fn failed_jobs(&self) -> &[FailedJob] {
        match self {
            FlowError::FailedChild { job } => std::slice::from_ref(job),
            FlowError::FailedChildren { jobs } => jobs,
            _ => &[],
        }
    }
}

/// Flow outcome when it did not succeed: the error plus the final status of
/// every job.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct FlowFailure {
    pub error: FlowError,
    pub report: FlowReport,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
