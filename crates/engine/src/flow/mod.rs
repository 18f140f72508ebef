// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flow entry point and the control loop driving the tree

mod controller;
mod kill;

use crate::builder::{ScopeBuilder, ScopeOptions};
use crate::cancel::CancelToken;
use crate::config::FlowConfig;
use crate::error::{FlowError, FlowFailure};
use crate::report::{FlowReport, ReportNode, Reporter, ScopeKind};
use crate::tree::ScopeNode;
use jf_adapters::JobSystem;
use jf_core::{BuildResult, Clock};
use kill::Victims;
use std::io::Write;
use std::time::Duration;
use tracing::Instrument;

/// State shared by every step of one flow run.
pub(crate) struct Engine<J, C> {
    pub jobs: J,
    pub clock: C,
    pub reporter: Reporter,
    pub cancel: CancelToken,
    pub kill_grace: Duration,
    /// Ordinal of the most recent invocation
    pub ordinal: u32,
}

/// A flow of job invocations, declared with nested serial and parallel
/// scopes and run to completion on a single task.
///
/// ```ignore
/// let report = Flow::new(jobs, SystemClock)
///     .serial(ScopeOptions::new().timeout(Duration::from_secs(600)), |s| {
///         s.invoke("build").param("branch", "main");
///         s.parallel(|p| {
///             p.invoke("test_unit");
///             p.invoke_unchecked("test_flaky");
///         });
///         s.invoke("deploy");
///     })
///     .await?;
/// ```
pub struct Flow<J, C> {
    jobs: J,
    clock: C,
    config: FlowConfig,
    cancel: CancelToken,
    reporter: Reporter,
}

impl<J: JobSystem, C: Clock> Flow<J, C> {
    /// A flow configured from the environment, reporting to stdout.
    pub fn new(jobs: J, clock: C) -> Self {
        Self {
            jobs,
            clock,
            config: FlowConfig::from_env(),
            cancel: CancelToken::new(),
            reporter: Reporter::stdout(),
        }
    }

    pub fn config(mut self, config: FlowConfig) -> Self {
        self.config = config;
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Send console status lines to `out` instead of stdout.
    pub fn console(mut self, out: impl Write + Send + 'static) -> Self {
        self.reporter = Reporter::new(Box::new(out));
        self
    }

    /// Declare a serial root scope and run it.
    pub async fn serial(
        self,
        options: ScopeOptions,
        declare: impl FnOnce(&mut ScopeBuilder),
    ) -> Result<FlowReport, FlowFailure> {
        let mut root = ScopeBuilder::new(ScopeKind::Serial, options);
        declare(&mut root);
        self.run(root).await
    }

    /// Declare a parallel root scope and run it.
    pub async fn parallel(
        self,
        options: ScopeOptions,
        declare: impl FnOnce(&mut ScopeBuilder),
    ) -> Result<FlowReport, FlowFailure> {
        let mut root = ScopeBuilder::new(ScopeKind::Parallel, options);
        declare(&mut root);
        self.run(root).await
    }

    async fn run(self, declared: ScopeBuilder) -> Result<FlowReport, FlowFailure> {
        let kind = declared.kind;
        let mut engine = Engine {
            jobs: self.jobs,
            clock: self.clock,
            reporter: self.reporter,
            cancel: self.cancel,
            kill_grace: self.config.kill_grace,
            ordinal: 0,
        };
        let mut root = match ScopeNode::build(declared, &self.config) {
            Ok(root) => root,
            Err(error) => {
                tracing::error!(error = %error, "invalid flow declaration");
                let report = FlowReport {
                    root: ReportNode::Scope {
                        kind,
                        children: Vec::new(),
                    },
                    result: BuildResult::Failure,
                };
                return Err(FlowFailure { error, report });
            }
        };

        let span = tracing::info_span!("flow", %kind, prefix = %self.config.job_name_prefix);
        let outcome = engine.drive(&mut root).instrument(span).await;
        engine.finish(&root, outcome)
    }
}

impl<J: JobSystem, C: Clock> Engine<J, C> {
    async fn drive(&mut self, root: &mut ScopeNode) -> Result<(), FlowError> {
        controller::resolve(self, root).await?;
        loop {
            if let Some(signal) = self.cancel.reason() {
                return Err(self.cancel_flow(root, signal).await);
            }
            if let Err(error) = controller::step_scope(root, self).await {
                tracing::error!(error = %error, "fatal job system error, stopping flow");
                kill::kill_subtree(self, root, Victims::All).await;
                root.finalize();
                return Err(error);
            }
            if let Some(result) = root.result() {
                return result.clone();
            }
            self.pause(root).await;
        }
    }

    async fn cancel_flow(&mut self, root: &mut ScopeNode, signal: String) -> FlowError {
        tracing::warn!(%signal, "flow cancelled");
        self.reporter.cancelled(&signal);
        kill::kill_subtree(self, root, Victims::All).await;
        root.finalize();
        FlowError::Cancelled { signal }
    }

    /// Sleep until the next poll cycle, the nearest scope deadline, or
    /// cancellation, whichever comes first.
    async fn pause(&mut self, root: &ScopeNode) {
        let now = self.clock.now();
        let mut pause = root.poll_interval().unwrap_or(crate::config::DEFAULT_REPORT_INTERVAL);
        if let Some(deadline) = root.next_deadline() {
            pause = pause.min(deadline.saturating_duration_since(now));
        }
        if pause.is_zero() {
            tokio::task::yield_now().await;
            return;
        }
        tokio::select! {
            _ = self.clock.sleep(pause) => {}
            _ = self.cancel.cancelled() => {}
        }
    }

    fn finish(
        mut self,
        root: &ScopeNode,
        outcome: Result<(), FlowError>,
    ) -> Result<FlowReport, FlowFailure> {
        match outcome {
            Ok(()) => {
                let result = if root.has_unstable() {
                    BuildResult::Unstable
                } else {
                    BuildResult::Success
                };
                let report = FlowReport {
                    root: root.report(false),
                    result,
                };
                self.reporter.final_status(&report);
                tracing::info!(%result, invocations = self.ordinal, "flow finished");
                Ok(report)
            }
            Err(error) => {
                let omit_unreached = matches!(error, FlowError::Cancelled { .. });
                let report = FlowReport {
                    root: root.report(omit_unreached),
                    result: BuildResult::Failure,
                };
                self.reporter.final_status(&report);
                tracing::error!(error = %error, invocations = self.ordinal, "flow failed");
                Err(FlowFailure { error, report })
            }
        }
    }
}

#[cfg(test)]
#[path = "../flow_tests/mod.rs"]
mod tests;
