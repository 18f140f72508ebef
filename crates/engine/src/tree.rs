// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime flow tree: scopes owning invocation records

use crate::builder::{Declared, Invocation, ScopeBuilder, ScopeOptions};
use crate::config::{FlowConfig, MIN_REPORT_INTERVAL};
use crate::error::{FailedJob, FlowError};
use crate::report::{ReportNode, ScopeKind};
use jf_adapters::{InvocationHandle, JobRef};
use jf_core::{BuildResult, InvocationRecord, JobSpec, SecretRedactor};
use std::time::{Duration, Instant};

/// Resolved policy of one scope.
#[derive(Debug, Clone)]
pub(crate) struct Policy {
    pub timeout: Option<Duration>,
    pub kill_all: bool,
    pub allow_missing: bool,
    pub redactor: SecretRedactor,
    pub report_interval: Duration,
}

impl Policy {
    pub(crate) fn root(config: &FlowConfig) -> Self {
        Self {
            timeout: None,
            kill_all: false,
            allow_missing: false,
            redactor: SecretRedactor::none(),
            report_interval: config.report_interval.max(MIN_REPORT_INTERVAL),
        }
    }

    fn inherit(&self, options: &ScopeOptions) -> Result<Self, FlowError> {
        let redactor = match &options.secret_params {
            Some(pattern) => SecretRedactor::new(pattern)?,
            None => self.redactor.clone(),
        };
        Ok(Self {
            timeout: options.timeout,
            kill_all: options.kill_all.unwrap_or(self.kill_all),
            allow_missing: options.allow_missing_jobs.unwrap_or(self.allow_missing),
            redactor,
            report_interval: options
                .report_interval
                .map_or(self.report_interval, |i| i.max(MIN_REPORT_INTERVAL)),
        })
    }
}

#[derive(Debug)]
pub(crate) enum JobState {
    /// Not yet invoked. `None` when the job was missing at resolve time.
    Waiting(Option<JobRef>),
    Invoked(InvocationHandle),
    /// Still absent when reached; never invoked.
    Missing,
}

#[derive(Debug)]
pub(crate) struct JobNode {
    pub spec: JobSpec,
    pub record: InvocationRecord,
    pub unstable_ok: bool,
    pub state: JobState,
}

impl JobNode {
    fn new(invocation: Invocation, prefix: &str, redactor: &SecretRedactor) -> Self {
        let name = format!("{}{}", prefix, invocation.name);
        let record = InvocationRecord::new(
            name.clone(),
            invocation.checked,
            redactor.mask_params(&invocation.params),
        );
        Self {
            spec: JobSpec {
                name,
                params: invocation.params,
                token: invocation.token,
                cause: invocation.cause,
            },
            record,
            unstable_ok: invocation.unstable_ok,
            state: JobState::Waiting(None),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, JobState::Invoked(_)) && !self.record.progress.is_idle()
    }

    /// Reached an end state: finished, or found missing when reached.
    pub fn is_done(&self) -> bool {
        match self.state {
            JobState::Waiting(_) => false,
            JobState::Invoked(_) => self.record.progress.is_idle(),
            JobState::Missing => true,
        }
    }

    pub fn is_unreached(&self) -> bool {
        matches!(self.state, JobState::Waiting(_))
    }

    /// The failure this job contributes to its scope, if any.
    ///
    /// Unchecked and never-invoked jobs contribute nothing.
    pub fn failure(&self, redactor: &SecretRedactor) -> Option<FailedJob> {
        if !self.record.checked {
            return None;
        }
        let failed = match self.state {
            JobState::Waiting(_) => false,
            JobState::Missing => true,
            JobState::Invoked(_) => !self.record.succeeded(self.unstable_ok),
        };
        failed.then(|| FailedJob::from_record(&self.record, redactor.format_params(&self.spec.params)))
    }
}

#[derive(Debug)]
pub(crate) enum ScopeState {
    Pending,
    Running {
        deadline: Option<Instant>,
        /// Serial scopes: index of the child being driven
        current: usize,
    },
    Done(Result<(), FlowError>),
}

#[derive(Debug)]
pub(crate) enum Node {
    Job(JobNode),
    Scope(ScopeNode),
}

#[derive(Debug)]
pub(crate) struct ScopeNode {
    pub kind: ScopeKind,
    pub policy: Policy,
    pub children: Vec<Node>,
    pub state: ScopeState,
    /// A kill has already been issued for this subtree
    pub killed: bool,
}

impl ScopeNode {
    /// Build the runtime tree from a declared root scope.
    pub(crate) fn build(declared: ScopeBuilder, config: &FlowConfig) -> Result<Self, FlowError> {
        Self::build_nested(declared, &Policy::root(config), &config.job_name_prefix)
    }

    fn build_nested(declared: ScopeBuilder, parent: &Policy, prefix: &str) -> Result<Self, FlowError> {
        let policy = parent.inherit(&declared.options)?;
        let mut children = Vec::with_capacity(declared.children.len());
        for child in declared.children {
            children.push(match child {
                Declared::Job(invocation) => Node::Job(JobNode::new(invocation, prefix, &policy.redactor)),
                Declared::Scope(scope) => Node::Scope(Self::build_nested(scope, &policy, prefix)?),
            });
        }
        Ok(Self {
            kind: declared.kind,
            policy,
            children,
            state: ScopeState::Pending,
            killed: false,
        })
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, ScopeState::Done(_))
    }

    pub fn result(&self) -> Option<&Result<(), FlowError>> {
        match &self.state {
            ScopeState::Done(result) => Some(result),
            _ => None,
        }
    }

    /// Whether a checked failure has happened anywhere below this scope,
    /// including inside nested scopes that are still running.
    pub fn has_checked_failure(&self) -> bool {
        self.children.iter().any(|child| match child {
            Node::Job(job) => job.is_done() && job.failure(&self.policy.redactor).is_some(),
            Node::Scope(scope) => match &scope.state {
                ScopeState::Pending => false,
                ScopeState::Running { .. } => scope.has_checked_failure(),
                ScopeState::Done(result) => result.is_err(),
            },
        })
    }

    /// Scope outcome from the current state of its children.
    ///
    /// A serial scope fails with its first failing child. A parallel scope
    /// merges the failed jobs of all children, unless a child failed for
    /// another reason (timeout, adapter, cancellation), which wins.
    pub fn aggregate(&self) -> Result<(), FlowError> {
        let mut jobs = Vec::new();
        for child in &self.children {
            let error = match child {
                Node::Job(job) => match job.failure(&self.policy.redactor) {
                    Some(failed) => FlowError::FailedChild { job: failed },
                    None => continue,
                },
                Node::Scope(scope) => match &scope.state {
                    ScopeState::Done(Err(e)) => e.clone(),
                    _ => continue,
                },
            };
            match (self.kind, error) {
                (ScopeKind::Serial, error) => return Err(error),
                (ScopeKind::Parallel, FlowError::FailedChild { job }) => jobs.push(job),
                (ScopeKind::Parallel, FlowError::FailedChildren { jobs: nested }) => jobs.extend(nested),
                (ScopeKind::Parallel, other) => return Err(other),
            }
        }
        if jobs.is_empty() {
            Ok(())
        } else {
            Err(FlowError::FailedChildren { jobs })
        }
    }

    /// Close every running scope in this subtree from its children's state.
    pub fn finalize(&mut self) {
        for child in &mut self.children {
            if let Node::Scope(scope) = child {
                scope.finalize();
            }
        }
        if let ScopeState::Running { .. } = self.state {
            self.state = ScopeState::Done(self.aggregate());
        }
    }

    pub fn jobs_mut<'a>(&'a mut self, out: &mut Vec<&'a mut JobNode>) {
        for child in &mut self.children {
            match child {
                Node::Job(job) => out.push(job),
                Node::Scope(scope) => scope.jobs_mut(out),
            }
        }
    }

    pub fn jobs<'a>(&'a self, out: &mut Vec<&'a JobNode>) {
        for child in &self.children {
            match child {
                Node::Job(job) => out.push(job),
                Node::Scope(scope) => scope.jobs(out),
            }
        }
    }

    /// Shortest report interval among scopes that are running.
    pub fn poll_interval(&self) -> Option<Duration> {
        if !matches!(self.state, ScopeState::Running { .. }) {
            return None;
        }
        self.children
            .iter()
            .filter_map(|child| match child {
                Node::Scope(scope) => scope.poll_interval(),
                Node::Job(_) => None,
            })
            .chain(std::iter::once(self.policy.report_interval))
            .min()
    }

    /// Nearest deadline among scopes that are running.
    pub fn next_deadline(&self) -> Option<Instant> {
        let ScopeState::Running { deadline, .. } = self.state else {
            return None;
        };
        self.children
            .iter()
            .filter_map(|child| match child {
                Node::Scope(scope) => scope.next_deadline(),
                Node::Job(_) => None,
            })
            .chain(deadline)
            .min()
    }

    /// Any checked job whose final result is UNSTABLE.
    pub fn has_unstable(&self) -> bool {
        let mut jobs = Vec::new();
        self.jobs(&mut jobs);
        jobs.iter()
            .any(|j| j.record.checked && j.is_done() && j.record.result == BuildResult::Unstable)
    }

    /// Status tree for reporting. With `omit_unreached`, jobs never invoked
    /// and scopes never started are left out.
    pub fn report(&self, omit_unreached: bool) -> ReportNode {
        let children = self
            .children
            .iter()
            .filter_map(|child| match child {
                Node::Job(job) if omit_unreached && job.is_unreached() => None,
                Node::Job(job) => Some(ReportNode::Job(job.record.clone())),
                Node::Scope(scope) if omit_unreached && matches!(scope.state, ScopeState::Pending) => None,
                Node::Scope(scope) => Some(scope.report(omit_unreached)),
            })
            .collect();
        ReportNode::Scope {
            kind: self.kind,
            children,
        }
    }
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
