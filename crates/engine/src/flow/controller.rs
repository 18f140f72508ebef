// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scope controller: resolve, invoke, poll and aggregate
//!
//! Each call to [`step_scope`] advances one poll cycle. A serial scope drives
//! only its current child and moves on in the same cycle once that child is
//! finished. A parallel scope drives every unfinished child, so the first
//! cycle invokes them all before any is polled.

use super::kill::{self, Victims};
use super::Engine;
use crate::error::FlowError;
use crate::report::ScopeKind;
use crate::tree::{JobNode, JobState, Node, Policy, ScopeNode, ScopeState};
use jf_adapters::{AdapterError, JobRef, JobSystem};
use jf_core::{Clock, Params, SecretRedactor};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

type Step<'a> = Pin<Box<dyn Future<Output = Result<(), FlowError>> + Send + 'a>>;

/// Look up a job, treating transport failures as absence.
async fn lookup<J: JobSystem>(jobs: &J, name: &str) -> Option<JobRef> {
    match jobs.find_job(name).await {
        Ok(job) => Some(job),
        Err(AdapterError::JobNotFound(_)) => None,
        Err(e) => {
            tracing::warn!(job = name, error = %e, "lookup failed, treating job as missing");
            None
        }
    }
}

fn jobs_with_policy<'a>(scope: &'a mut ScopeNode, out: &mut Vec<(bool, &'a mut JobNode)>) {
    let allow_missing = scope.policy.allow_missing;
    for child in &mut scope.children {
        match child {
            Node::Job(job) => out.push((allow_missing, job)),
            Node::Scope(nested) => jobs_with_policy(nested, out),
        }
    }
}

/// Look up every job in the tree before anything is invoked.
///
/// Missing jobs in scopes that allow them are marked and looked up again when
/// reached. Any other missing job fails the flow with every such name listed.
pub(super) async fn resolve<J: JobSystem, C: Clock>(
    engine: &mut Engine<J, C>,
    root: &mut ScopeNode,
) -> Result<(), FlowError> {
    let mut known: HashMap<String, Option<JobRef>> = HashMap::new();
    let mut not_found: Vec<String> = Vec::new();
    let mut jobs = Vec::new();
    jobs_with_policy(root, &mut jobs);

    for (allow_missing, job) in jobs {
        let name = job.spec.name.clone();
        let found = match known.get(&name) {
            Some(found) => found.clone(),
            None => {
                let found = lookup(&engine.jobs, &name).await;
                known.insert(name.clone(), found.clone());
                found
            }
        };
        if found.is_none() {
            job.record.missing = true;
            if !allow_missing && !not_found.contains(&name) {
                not_found.push(name);
            }
        }
        job.state = JobState::Waiting(found);
    }

    if not_found.is_empty() {
        Ok(())
    } else {
        tracing::error!(missing = ?not_found, "jobs not found");
        Err(FlowError::MissingJobs { names: not_found })
    }
}

/// Advance `scope` by one poll cycle.
///
/// Returns an error only for faults that end the whole flow; scope failures
/// are recorded in the scope state.
pub(super) fn step_scope<'a, J: JobSystem, C: Clock>(
    scope: &'a mut ScopeNode,
    engine: &'a mut Engine<J, C>,
) -> Step<'a> {
    Box::pin(async move {
        let now = engine.clock.now();
        let deadline = match scope.state {
            ScopeState::Done(_) => return Ok(()),
            ScopeState::Pending => {
                // a timeout too large to represent is no deadline at all
                let deadline = scope.policy.timeout.and_then(|t| now.checked_add(t));
                tracing::debug!(scope = %scope.kind, children = scope.children.len(), "scope started");
                scope.state = ScopeState::Running {
                    deadline,
                    current: 0,
                };
                deadline
            }
            ScopeState::Running { deadline, .. } => deadline,
        };

        if deadline.is_some_and(|d| now >= d) {
            time_out(scope, engine).await;
            return Ok(());
        }

        match scope.kind {
            ScopeKind::Serial => step_serial(scope, engine).await?,
            ScopeKind::Parallel => step_parallel(scope, engine).await?,
        }

        let failed = matches!(scope.state, ScopeState::Done(Err(_))) || scope.has_checked_failure();
        if scope.policy.kill_all && !scope.killed && failed {
            tracing::info!(scope = %scope.kind, "checked failure with kill_all, killing scope");
            kill::kill_subtree(engine, scope, Victims::All).await;
            scope.finalize();
        }

        match &scope.state {
            ScopeState::Done(Ok(())) => tracing::info!(scope = %scope.kind, "scope succeeded"),
            ScopeState::Done(Err(e)) => tracing::info!(scope = %scope.kind, error = %e, "scope failed"),
            _ => {}
        }
        Ok(())
    })
}

fn node_done(node: &Node) -> bool {
    match node {
        Node::Job(job) => job.is_done(),
        Node::Scope(scope) => scope.is_done(),
    }
}

fn node_failed(node: &Node, redactor: &SecretRedactor) -> bool {
    match node {
        Node::Job(job) => job.failure(redactor).is_some(),
        Node::Scope(scope) => matches!(scope.result(), Some(Err(_))),
    }
}

async fn step_node<J: JobSystem, C: Clock>(
    node: &mut Node,
    policy: &Policy,
    engine: &mut Engine<J, C>,
) -> Result<(), FlowError> {
    match node {
        Node::Scope(scope) => step_scope(scope, engine).await,
        Node::Job(job) => step_job(job, policy, engine).await,
    }
}

async fn step_serial<J: JobSystem, C: Clock>(
    scope: &mut ScopeNode,
    engine: &mut Engine<J, C>,
) -> Result<(), FlowError> {
    loop {
        let ScopeState::Running { current, .. } = scope.state else {
            return Ok(());
        };
        let Some(child) = scope.children.get_mut(current) else {
            scope.state = ScopeState::Done(Ok(()));
            return Ok(());
        };
        step_node(child, &scope.policy, engine).await?;
        if !node_done(child) {
            return Ok(());
        }
        if node_failed(child, &scope.policy.redactor) {
            scope.state = ScopeState::Done(scope.aggregate());
            return Ok(());
        }
        if let ScopeState::Running { current, .. } = &mut scope.state {
            *current += 1;
        }
    }
}

async fn step_parallel<J: JobSystem, C: Clock>(
    scope: &mut ScopeNode,
    engine: &mut Engine<J, C>,
) -> Result<(), FlowError> {
    for child in &mut scope.children {
        if !node_done(child) {
            step_node(child, &scope.policy, engine).await?;
        }
    }
    if scope.children.iter().all(node_done) {
        scope.state = ScopeState::Done(scope.aggregate());
    }
    Ok(())
}

/// Adapter error with every secret parameter value masked.
fn scrubbed(error: AdapterError, redactor: &SecretRedactor, params: &Params) -> FlowError {
    let scrub = |text: String| redactor.scrub(&text, params);
    FlowError::Adapter(match error {
        AdapterError::JobNotFound(m) => AdapterError::JobNotFound(scrub(m)),
        AdapterError::UnknownInvocation(m) => AdapterError::UnknownInvocation(scrub(m)),
        AdapterError::Transport(m) => AdapterError::Transport(scrub(m)),
        AdapterError::Io(m) => AdapterError::Io(scrub(m)),
        AdapterError::Unsupported(op) => AdapterError::Unsupported(op),
    })
}

async fn step_job<J: JobSystem, C: Clock>(
    job: &mut JobNode,
    policy: &Policy,
    engine: &mut Engine<J, C>,
) -> Result<(), FlowError> {
    match &job.state {
        JobState::Missing => Ok(()),
        JobState::Invoked(handle) => {
            if job.record.progress.is_idle() {
                return Ok(());
            }
            let handle = handle.clone();
            let status = engine
                .jobs
                .poll(&handle)
                .await
                .map_err(|e| scrubbed(e, &policy.redactor, &job.spec.params))?;
            let changed = job.record.apply(status, engine.clock.epoch_ms());
            tracing::debug!(
                job = %job.record.name,
                result = %job.record.result,
                progress = %job.record.progress,
                "polled"
            );
            if changed {
                engine.reporter.status(&job.record);
                if job.record.progress.is_idle() {
                    tracing::info!(job = %job.record.name, result = %job.record.result, "job finished");
                }
            }
            Ok(())
        }
        JobState::Waiting(found) => {
            let found = found.clone();
            start_job(job, found, policy, engine).await
        }
    }
}

async fn start_job<J: JobSystem, C: Clock>(
    job: &mut JobNode,
    found: Option<JobRef>,
    policy: &Policy,
    engine: &mut Engine<J, C>,
) -> Result<(), FlowError> {
    let job_ref = match found {
        Some(job_ref) => job_ref,
        None => match lookup(&engine.jobs, &job.spec.name).await {
            Some(job_ref) => {
                tracing::info!(job = %job.spec.name, "previously missing job now exists");
                job.record.missing = false;
                job_ref
            }
            None => {
                tracing::warn!(job = %job.spec.name, checked = job.record.checked, "job still missing, skipped");
                job.record.missing = true;
                job.state = JobState::Missing;
                engine.reporter.missing(&job.record);
                return Ok(());
            }
        },
    };

    let masked = policy.redactor.format_params(&job.spec.params);
    engine.reporter.invoking(&job.record.name, &masked);
    let handle = engine
        .jobs
        .invoke(&job_ref, &job.spec)
        .await
        .map_err(|e| scrubbed(e, &policy.redactor, &job.spec.params))?;

    engine.ordinal += 1;
    tracing::info!(job = %job.record.name, ordinal = engine.ordinal, params = %masked, "invoked");
    job.record
        .mark_invoked(engine.ordinal, handle.console_url.clone(), engine.clock.epoch_ms());
    job.state = JobState::Invoked(handle);
    Ok(())
}

/// Scope deadline passed: kill what is still running, then fail the scope.
async fn time_out<J: JobSystem, C: Clock>(scope: &mut ScopeNode, engine: &mut Engine<J, C>) {
    let timeout = scope.policy.timeout.unwrap_or_default();
    let unfinished: Vec<String> = {
        let mut jobs = Vec::new();
        scope.jobs(&mut jobs);
        jobs.iter()
            .filter(|j| j.is_active())
            .map(|j| j.record.name.clone())
            .collect()
    };
    tracing::warn!(scope = %scope.kind, ?timeout, ?unfinished, "scope timed out");

    let victims = if scope.policy.kill_all {
        Victims::All
    } else {
        Victims::Checked
    };
    kill::kill_subtree(engine, scope, victims).await;
    scope.finalize();
    scope.state = ScopeState::Done(Err(FlowError::Timeout {
        scope: scope.kind.to_string(),
        timeout,
        unfinished,
    }));
}
