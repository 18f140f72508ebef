// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn record(name: &str, checked: bool) -> InvocationRecord {
    InvocationRecord::new(name, checked, Params::new())
}

#[test]
fn job_spec_builder_keeps_param_order() {
    let spec = JobSpec::new("deploy")
        .param("b", "2")
        .param("a", "1")
        .token("tok")
        .cause("nightly");

    let names: Vec<&str> = spec.params.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["b", "a"]);
    assert_eq!(spec.token.as_deref(), Some("tok"));
    assert_eq!(spec.cause.as_deref(), Some("nightly"));
}

#[test]
fn new_record_is_not_invoked() {
    let rec = record("j1", true);
    assert!(!rec.is_invoked());
    assert!(!rec.is_active());
    assert_eq!(rec.result, BuildResult::Unknown);
    assert_eq!(rec.progress, Progress::Idle);
}

#[test]
fn mark_invoked_sets_queued() {
    let mut rec = record("j1", true);
    rec.mark_invoked(3, "http://ci/job/j1".to_string(), 1_000);

    assert!(rec.is_active());
    assert_eq!(rec.ordinal, Some(3));
    assert_eq!(rec.progress, Progress::Queued);
    assert_eq!(rec.started_at_ms, Some(1_000));
}

#[test]
fn apply_reports_changes_only() {
    let mut rec = record("j1", true);
    rec.mark_invoked(1, String::new(), 0);

    assert!(!rec.apply(BuildStatus::queued(), 1));
    assert!(rec.apply(BuildStatus::running(7), 2));
    assert!(!rec.apply(BuildStatus::running(7), 3));
    assert_eq!(rec.build_number, Some(7));
    assert!(rec.apply(BuildStatus::finished(BuildResult::Success, Some(7)), 4));
    assert_eq!(rec.finished_at_ms, Some(4));
}

#[test]
fn non_idle_result_reads_unknown() {
    let mut rec = record("j1", true);
    rec.mark_invoked(1, String::new(), 0);

    rec.apply(
        BuildStatus {
            result: BuildResult::Failure,
            progress: Progress::Running,
            build_number: Some(1),
        },
        1,
    );

    assert_eq!(rec.result, BuildResult::Unknown);
}

#[test]
fn idle_record_is_frozen() {
    let mut rec = record("j1", true);
    rec.mark_invoked(1, String::new(), 0);
    rec.apply(BuildStatus::finished(BuildResult::Success, Some(1)), 5);

    let changed = rec.apply(BuildStatus::finished(BuildResult::Aborted, Some(1)), 9);

    assert!(!changed);
    assert_eq!(rec.result, BuildResult::Success);
    assert_eq!(rec.finished_at_ms, Some(5));
}

#[test]
fn missing_record_never_succeeds() {
    let mut rec = record("j1", true);
    rec.missing = true;
    rec.result = BuildResult::Success;
    assert!(!rec.succeeded(true));
}

#[yare::parameterized(
    checked_success    = { true,  BuildResult::Success, false, "job: 'j1' SUCCESS - IDLE" },
    unchecked_failure  = { false, BuildResult::Failure, false, "unchecked job: 'j1' FAILURE - IDLE" },
    checked_missing    = { true,  BuildResult::Unknown, true,  "job: 'j1' - MISSING JOB" },
    unchecked_missing  = { false, BuildResult::Unknown, true,  "unchecked job: 'j1' - MISSING JOB" },
)]
fn record_display(checked: bool, result: BuildResult, missing: bool, expected: &str) {
    let mut rec = record("j1", checked);
    rec.result = result;
    rec.missing = missing;
    assert_eq!(rec.to_string(), expected);
}

#[test]
fn record_serde_skips_empty_fields() {
    let rec = record("j1", false);
    let json = serde_json::to_value(&rec).unwrap();
    assert!(json.get("ordinal").is_none());
    assert_eq!(json["result"], "UNKNOWN");
    assert_eq!(json["checked"], false);
}
