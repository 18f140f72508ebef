// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build result and progress reported by a job system.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single build.
///
/// Only meaningful once the build's [`Progress`] is [`Progress::Idle`]; a
/// build that is still queued or running always reads [`BuildResult::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    #[default]
    Unknown,
    Success,
    Unstable,
    Failure,
    Aborted,
    /// Cancelled while still waiting in the job system's queue.
    Dequeued,
}

impl BuildResult {
    /// Whether this result counts as a pass.
    ///
    /// `unstable_ok` is the per-invocation policy for [`BuildResult::Unstable`].
    pub fn is_success(self, unstable_ok: bool) -> bool {
        match self {
            BuildResult::Success => true,
            BuildResult::Unstable => unstable_ok,
            _ => false,
        }
    }

    /// Results that can only come from the build being stopped.
    pub fn is_stopped(self) -> bool {
        matches!(self, BuildResult::Aborted | BuildResult::Dequeued)
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildResult::Unknown => write!(f, "UNKNOWN"),
            BuildResult::Success => write!(f, "SUCCESS"),
            BuildResult::Unstable => write!(f, "UNSTABLE"),
            BuildResult::Failure => write!(f, "FAILURE"),
            BuildResult::Aborted => write!(f, "ABORTED"),
            BuildResult::Dequeued => write!(f, "DEQUEUED"),
        }
    }
}

/// Where a build is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Progress {
    Queued,
    Running,
    /// Finished, never started, or dequeued. Terminal.
    #[default]
    Idle,
}

impl Progress {
    pub fn is_idle(self) -> bool {
        self == Progress::Idle
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::Queued => write!(f, "QUEUED"),
            Progress::Running => write!(f, "RUNNING"),
            Progress::Idle => write!(f, "IDLE"),
        }
    }
}

/// One poll answer from a job system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStatus {
    pub result: BuildResult,
    pub progress: Progress,
    /// Assigned by the job system once the build leaves the queue.
    pub build_number: Option<u32>,
}

impl BuildStatus {
    pub fn queued() -> Self {
        Self {
            result: BuildResult::Unknown,
            progress: Progress::Queued,
            build_number: None,
        }
    }

    pub fn running(build_number: u32) -> Self {
        Self {
            result: BuildResult::Unknown,
            progress: Progress::Running,
            build_number: Some(build_number),
        }
    }

    pub fn finished(result: BuildResult, build_number: Option<u32>) -> Self {
        Self {
            result,
            progress: Progress::Idle,
            build_number,
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
