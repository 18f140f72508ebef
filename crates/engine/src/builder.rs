// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Imperative composition of a flow tree

use crate::report::ScopeKind;
use jf_core::Params;
use std::time::Duration;

/// Per-scope policy. Unset fields are inherited from the enclosing scope
/// (or the flow config at the root), except `timeout`, which only bounds the
/// scope it is set on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeOptions {
    pub timeout: Option<Duration>,
    pub kill_all: Option<bool>,
    pub allow_missing_jobs: Option<bool>,
    /// Regex matched against parameter names; matching values are masked
    pub secret_params: Option<String>,
    pub report_interval: Option<Duration>,
}

impl ScopeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn kill_all(mut self, kill_all: bool) -> Self {
        self.kill_all = Some(kill_all);
        self
    }

    pub fn allow_missing_jobs(mut self, allow: bool) -> Self {
        self.allow_missing_jobs = Some(allow);
        self
    }

    pub fn secret_params(mut self, pattern: impl Into<String>) -> Self {
        self.secret_params = Some(pattern.into());
        self
    }

    pub fn report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = Some(interval);
        self
    }
}

/// One job invocation declared in a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub(crate) name: String,
    pub(crate) params: Params,
    pub(crate) token: Option<String>,
    pub(crate) cause: Option<String>,
    pub(crate) checked: bool,
    pub(crate) unstable_ok: bool,
}

impl Invocation {
    fn new(name: &str, checked: bool) -> Self {
        Self {
            name: name.to_string(),
            params: Params::new(),
            token: None,
            cause: None,
            checked,
            unstable_ok: true,
        }
    }

    pub fn param(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn token(&mut self, token: impl Into<String>) -> &mut Self {
        self.token = Some(token.into());
        self
    }

    pub fn cause(&mut self, cause: impl Into<String>) -> &mut Self {
        self.cause = Some(cause.into());
        self
    }

    /// Count an UNSTABLE result as a failure of this invocation.
    pub fn unstable_is_failure(&mut self) -> &mut Self {
        self.unstable_ok = false;
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Declared {
    Job(Invocation),
    Scope(ScopeBuilder),
}

/// Collects the children of one scope while the flow is being declared.
#[derive(Debug, Clone)]
pub struct ScopeBuilder {
    pub(crate) kind: ScopeKind,
    pub(crate) options: ScopeOptions,
    pub(crate) children: Vec<Declared>,
}

impl ScopeBuilder {
    pub(crate) fn new(kind: ScopeKind, options: ScopeOptions) -> Self {
        Self {
            kind,
            options,
            children: Vec::new(),
        }
    }

    /// Declare a checked invocation: its failure fails this scope.
    pub fn invoke(&mut self, name: &str) -> &mut Invocation {
        self.push_job(Invocation::new(name, true))
    }

    /// Declare an invocation whose failure is only recorded.
    pub fn invoke_unchecked(&mut self, name: &str) -> &mut Invocation {
        self.push_job(Invocation::new(name, false))
    }

    pub fn serial(&mut self, declare: impl FnOnce(&mut ScopeBuilder)) -> &mut Self {
        self.serial_with(ScopeOptions::default(), declare)
    }

    pub fn parallel(&mut self, declare: impl FnOnce(&mut ScopeBuilder)) -> &mut Self {
        self.parallel_with(ScopeOptions::default(), declare)
    }

    pub fn serial_with(
        &mut self,
        options: ScopeOptions,
        declare: impl FnOnce(&mut ScopeBuilder),
    ) -> &mut Self {
        self.nest(ScopeKind::Serial, options, declare)
    }

    pub fn parallel_with(
        &mut self,
        options: ScopeOptions,
        declare: impl FnOnce(&mut ScopeBuilder),
    ) -> &mut Self {
        self.nest(ScopeKind::Parallel, options, declare)
    }

    fn nest(
        &mut self,
        kind: ScopeKind,
        options: ScopeOptions,
        declare: impl FnOnce(&mut ScopeBuilder),
    ) -> &mut Self {
        let mut child = ScopeBuilder::new(kind, options);
        declare(&mut child);
        self.children.push(Declared::Scope(child));
        self
    }

    fn push_job(&mut self, invocation: Invocation) -> &mut Invocation {
        self.children.push(Declared::Job(invocation));
        match self.children.last_mut() {
            Some(Declared::Job(job)) => job,
            _ => unreachable!("job was just pushed"),
        }
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
