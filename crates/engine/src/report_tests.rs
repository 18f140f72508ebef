// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use jf_core::test_support::{finished_record, params};
use jf_core::Params;
use similar_asserts::assert_eq;

fn sample() -> FlowReport {
    FlowReport {
        root: ReportNode::Scope {
            kind: ScopeKind::Serial,
            children: vec![
                ReportNode::Scope {
                    kind: ScopeKind::Parallel,
                    children: vec![
                        ReportNode::Job(finished_record("j1", true, BuildResult::Aborted)),
                        ReportNode::Job(finished_record("j2", false, BuildResult::Success)),
                    ],
                },
                ReportNode::Job(InvocationRecord::new("j3", true, Params::new())),
            ],
        },
        result: BuildResult::Failure,
    }
}

#[test]
fn render_nests_with_brackets_and_indent() {
    let expected = "\
serial flow: [
   parallel flow: (
      job: 'j1' ABORTED - IDLE
      unchecked job: 'j2' SUCCESS - IDLE
   )
   job: 'j3' UNKNOWN - IDLE
]
";
    assert_eq!(sample().render(), expected);
}

#[test]
fn records_and_find_walk_in_declaration_order() {
    let report = sample();
    let names: Vec<_> = report.records().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["j1", "j2", "j3"]);
    assert_eq!(report.find("j2").len(), 1);
    assert!(report.find("nope").is_empty());
}

#[test]
fn json_report_is_tagged() {
    let json: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
    assert_eq!(json["result"], "FAILURE");
    assert_eq!(json["root"]["type"], "scope");
    assert_eq!(json["root"]["kind"], "serial");
    let first_job = &json["root"]["children"][0]["children"][0];
    assert_eq!(first_job["type"], "job");
    assert_eq!(first_job["name"], "j1");
    assert_eq!(first_job["result"], "ABORTED");
}

#[test]
fn reporter_writes_protocol_lines() {
    let console = ConsoleCapture::new();
    let mut reporter = Reporter::new(Box::new(console.clone()));

    let mut running = InvocationRecord::new("j1", false, params(&[("a", "1")]));
    running.console_url = Some("http://ci/job/j1/1/console".to_string());
    running.progress = jf_core::Progress::Running;
    let mut missing = InvocationRecord::new("gone", true, Params::new());
    missing.missing = true;

    reporter.invoking("j1", "(a='1')");
    reporter.invoking("j2", "");
    reporter.status(&running);
    reporter.missing(&missing);
    reporter.killing("j1");
    reporter.stopped("j1");
    reporter.cancelled("SIGTERM");

    assert_eq!(
        console.lines(),
        vec![
            "Invoking job: 'j1' (a='1')",
            "Invoking job: 'j2'",
            "unchecked job: 'j1' UNKNOWN - RUNNING - build: http://ci/job/j1/1/console",
            "job: 'gone' - MISSING JOB",
            "Killing all running builds for: 'j1'",
            "job: 'j1' stopped running",
            "Got SIGTERM: Killing all builds belonging to current flow",
        ]
    );
}

#[test]
fn final_status_block() {
    let console = ConsoleCapture::new();
    let mut reporter = Reporter::new(Box::new(console.clone()));

    reporter.final_status(&sample());

    let lines = console.lines();
    assert_eq!(lines[0], "--- Final status ---");
    assert_eq!(lines[1], "serial flow: [");
    assert_eq!(lines.last().map(String::as_str), Some("]"));
}
