// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Console status lines and the final flow report

use jf_core::{BuildResult, InvocationRecord};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

const INDENT: &str = "   ";

/// Composition kind of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Serial,
    Parallel,
}

impl ScopeKind {
    fn brackets(self) -> (&'static str, &'static str) {
        match self {
            ScopeKind::Serial => ("[", "]"),
            ScopeKind::Parallel => ("(", ")"),
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeKind::Serial => write!(f, "serial"),
            ScopeKind::Parallel => write!(f, "parallel"),
        }
    }
}

/// One node of the final status tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportNode {
    Scope {
        kind: ScopeKind,
        children: Vec<ReportNode>,
    },
    Job(InvocationRecord),
}

impl ReportNode {
    fn render_into(&self, depth: usize, out: &mut String) {
        let pad = INDENT.repeat(depth);
        match self {
            ReportNode::Job(record) => {
                out.push_str(&format!("{}{}\n", pad, record));
            }
            ReportNode::Scope { kind, children } => {
                let (open, close) = kind.brackets();
                out.push_str(&format!("{}{} flow: {}\n", pad, kind, open));
                for child in children {
                    child.render_into(depth + 1, out);
                }
                out.push_str(&format!("{}{}\n", pad, close));
            }
        }
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a InvocationRecord>) {
        match self {
            ReportNode::Job(record) => out.push(record),
            ReportNode::Scope { children, .. } => {
                for child in children {
                    child.collect(out);
                }
            }
        }
    }
}

/// Final status of every job in a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowReport {
    pub root: ReportNode,
    /// SUCCESS, UNSTABLE when a checked job was unstable, or FAILURE
    pub result: BuildResult,
}

impl FlowReport {
    /// Bracketed status tree, one job per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.root.render_into(0, &mut out);
        out
    }

    /// Every record in declaration order.
    pub fn records(&self) -> Vec<&InvocationRecord> {
        let mut out = Vec::new();
        self.root.collect(&mut out);
        out
    }

    /// Records for job `name`, in declaration order.
    pub fn find(&self, name: &str) -> Vec<&InvocationRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.name == name)
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Writes the console text protocol.
pub(crate) struct Reporter {
    out: Box<dyn Write + Send>,
}

impl Reporter {
    pub(crate) fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }

    pub(crate) fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    fn line(&mut self, text: &str) {
        let written = writeln!(self.out, "{}", text).and_then(|()| self.out.flush());
        if let Err(e) = written {
            tracing::warn!(error = %e, "console write failed");
        }
    }

    pub(crate) fn invoking(&mut self, name: &str, params: &str) {
        if params.is_empty() {
            self.line(&format!("Invoking job: '{}'", name));
        } else {
            self.line(&format!("Invoking job: '{}' {}", name, params));
        }
    }

    pub(crate) fn status(&mut self, record: &InvocationRecord) {
        match &record.console_url {
            Some(url) => self.line(&format!("{} - build: {}", record, url)),
            None => self.line(&record.to_string()),
        }
    }

    pub(crate) fn missing(&mut self, record: &InvocationRecord) {
        self.line(&record.to_string());
    }

    pub(crate) fn killing(&mut self, name: &str) {
        self.line(&format!("Killing all running builds for: '{}'", name));
    }

    pub(crate) fn stopped(&mut self, name: &str) {
        self.line(&format!("job: '{}' stopped running", name));
    }

    pub(crate) fn cancelled(&mut self, signal: &str) {
        self.line(&format!(
            "Got {}: Killing all builds belonging to current flow",
            signal
        ));
    }

    pub(crate) fn final_status(&mut self, report: &FlowReport) {
        self.line("--- Final status ---");
        let rendered = report.render();
        self.line(rendered.trim_end());
    }
}

/// In-memory console, shared between clones.
///
/// Pass one to [`crate::Flow::console`] to capture the status lines of a
/// flow, e.g. to attach them to a build description.
#[derive(Clone, Default)]
pub struct ConsoleCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl ConsoleCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for ConsoleCapture {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
