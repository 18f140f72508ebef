// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job specifications and invocation records.

use crate::status::{BuildResult, BuildStatus, Progress};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Build parameters, in declaration order.
pub type Params = IndexMap<String, String>;

/// What to invoke: a job name plus the request details.
///
/// Fixed once the invocation has been handed to the job system.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobSpec {
    pub name: String,
    pub params: Params,
    pub token: Option<String>,
    pub cause: Option<String>,
}

impl JobSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

/// Observable state of one invocation within a flow.
///
/// Parameters are stored already masked, so a record can be rendered,
/// logged or serialized without leaking secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRecord {
    pub name: String,
    pub checked: bool,
    /// Flow-wide sequence number assigned at invocation (1-based).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_number: Option<u32>,
    pub result: BuildResult,
    pub progress: Progress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_ms: Option<u64>,
    #[serde(default)]
    pub missing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console_url: Option<String>,
    #[serde(default)]
    pub params: Params,
}

impl InvocationRecord {
    pub fn new(name: impl Into<String>, checked: bool, masked_params: Params) -> Self {
        Self {
            name: name.into(),
            checked,
            ordinal: None,
            build_number: None,
            result: BuildResult::Unknown,
            progress: Progress::Idle,
            started_at_ms: None,
            finished_at_ms: None,
            missing: false,
            console_url: None,
            params: masked_params,
        }
    }

    /// Whether the job system has been asked to run this job.
    pub fn is_invoked(&self) -> bool {
        self.ordinal.is_some()
    }

    /// Invoked and not yet finished.
    pub fn is_active(&self) -> bool {
        self.is_invoked() && !self.progress.is_idle()
    }

    /// Mark the record as handed to the job system.
    pub fn mark_invoked(&mut self, ordinal: u32, console_url: String, epoch_ms: u64) {
        self.ordinal = Some(ordinal);
        self.console_url = Some(console_url);
        self.started_at_ms = Some(epoch_ms);
        self.progress = Progress::Queued;
        self.result = BuildResult::Unknown;
    }

    /// Apply a poll answer. Returns true when result or progress changed.
    ///
    /// A non-idle status always reads [`BuildResult::Unknown`], whatever the
    /// job system claims. Once idle, the record is frozen.
    pub fn apply(&mut self, status: BuildStatus, epoch_ms: u64) -> bool {
        if self.progress.is_idle() && self.is_invoked() && self.finished_at_ms.is_some() {
            return false;
        }
        let result = if status.progress.is_idle() {
            status.result
        } else {
            BuildResult::Unknown
        };
        if status.build_number.is_some() {
            self.build_number = status.build_number;
        }
        let changed = result != self.result || status.progress != self.progress;
        self.result = result;
        self.progress = status.progress;
        if self.progress.is_idle() {
            self.finished_at_ms = Some(epoch_ms);
        }
        changed
    }

    pub fn succeeded(&self, unstable_ok: bool) -> bool {
        !self.missing && self.progress.is_idle() && self.result.is_success(unstable_ok)
    }

    /// `"unchecked "` for unchecked invocations, empty otherwise.
    pub fn marker(&self) -> &'static str {
        if self.checked {
            ""
        } else {
            "unchecked "
        }
    }
}

impl fmt::Display for InvocationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.missing {
            return write!(f, "{}job: '{}' - MISSING JOB", self.marker(), self.name);
        }
        write!(
            f,
            "{}job: '{}' {} - {}",
            self.marker(),
            self.name,
            self.result,
            self.progress
        )
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
