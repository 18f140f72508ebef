// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kill coordinator

use super::Engine;
use crate::tree::{JobNode, JobState, ScopeNode};
use jf_adapters::JobSystem;
use jf_core::{Clock, Progress};
use std::time::Duration;

/// Which active invocations a kill stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Victims {
    All,
    /// Only checked invocations; unchecked ones keep running
    Checked,
}

/// Stop every active invocation under `scope` and wait for the job system to
/// confirm, up to the kill grace period.
///
/// Queued invocations are dequeued, running ones aborted. Invocations that
/// are already idle are left alone, so killing twice is harmless.
pub(crate) async fn kill_subtree<J: JobSystem, C: Clock>(
    engine: &mut Engine<J, C>,
    scope: &mut ScopeNode,
    victims: Victims,
) {
    scope.killed = true;
    let interval = scope.policy.report_interval;
    let mut jobs = Vec::new();
    scope.jobs_mut(&mut jobs);
    let mut targets: Vec<&mut JobNode> = jobs
        .into_iter()
        .filter(|j| j.is_active() && (victims == Victims::All || j.record.checked))
        .collect();
    if targets.is_empty() {
        return;
    }

    for job in targets.iter_mut() {
        let JobState::Invoked(handle) = &job.state else {
            continue;
        };
        let dequeue = job.record.progress == Progress::Queued;
        engine.reporter.killing(&job.record.name);
        tracing::info!(job = %job.record.name, dequeue, "stopping build");
        if let Err(e) = engine.jobs.stop(handle, dequeue).await {
            tracing::warn!(job = %job.record.name, error = %e, "stop request failed");
        }
    }

    confirm(engine, &mut targets, interval).await;
}

/// Re-poll stopped invocations until they are idle or the grace expires.
async fn confirm<J: JobSystem, C: Clock>(
    engine: &mut Engine<J, C>,
    targets: &mut [&mut JobNode],
    interval: Duration,
) {
    // None: the grace is too large to represent, wait as long as it takes
    let give_up_at = engine.clock.now().checked_add(engine.kill_grace);
    loop {
        for job in targets.iter_mut().filter(|j| j.is_active()) {
            let JobState::Invoked(handle) = &job.state else {
                continue;
            };
            let polled = engine.jobs.poll(handle).await;
            match polled {
                Ok(status) => {
                    let epoch_ms = engine.clock.epoch_ms();
                    if job.record.apply(status, epoch_ms) {
                        if job.record.progress.is_idle() {
                            engine.reporter.stopped(&job.record.name);
                        }
                        engine.reporter.status(&job.record);
                    }
                }
                Err(e) => {
                    tracing::warn!(job = %job.record.name, error = %e, "poll after stop failed");
                }
            }
        }

        let still_running: Vec<&str> = targets
            .iter()
            .filter(|j| j.is_active())
            .map(|j| j.record.name.as_str())
            .collect();
        if still_running.is_empty() {
            return;
        }
        let now = engine.clock.now();
        let wait = match give_up_at {
            Some(at) if now >= at => {
                tracing::warn!(
                    jobs = ?still_running,
                    grace = ?engine.kill_grace,
                    "builds still running after kill grace period"
                );
                return;
            }
            Some(at) => interval.min(at - now),
            None => interval,
        };
        engine.clock.sleep(wait).await;
    }
}
