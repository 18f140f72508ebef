// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use jf_core::Clock;

#[tokio::test]
async fn serial_jobs_succeed_in_order() {
    let ctx = TestContext::new();
    ctx.job("j1", 1.0).job("j2", 1.0);

    let report = ctx
        .flow()
        .serial(ScopeOptions::new(), |s| {
            s.invoke("j1");
            s.invoke("j2");
        })
        .await
        .unwrap();

    assert_eq!(report.result, BuildResult::Success);
    assert_eq!(state(&report, "j1"), (BuildResult::Success, Progress::Idle));
    assert_eq!(state(&report, "j2"), (BuildResult::Success, Progress::Idle));
    assert_eq!(ctx.jobs.invoked(), vec!["j1", "j2"]);
    assert_eq!(
        report.render(),
        "serial flow: [\n   job: 'j1' SUCCESS - IDLE\n   job: 'j2' SUCCESS - IDLE\n]\n"
    );
}

#[tokio::test]
async fn next_child_waits_for_previous_to_finish() {
    let ctx = TestContext::new();
    ctx.job("j1", 3.0).job("j2", 0.0).job("j3", 0.0);

    ctx.flow()
        .serial(ScopeOptions::new(), |s| {
            s.invoke("j1");
            s.invoke("j2");
            s.invoke("j3");
        })
        .await
        .unwrap();

    let calls = ctx.jobs.calls();
    let last_j1_poll = calls.iter().rposition(is_poll("j1")).unwrap();
    assert!(call_index(&calls, is_invoke("j2")) > last_j1_poll);
    assert!(call_index(&calls, is_poll("j2")) > last_j1_poll);

    let last_j2_poll = calls.iter().rposition(is_poll("j2")).unwrap();
    assert!(call_index(&calls, is_invoke("j3")) > last_j2_poll);
}

#[tokio::test]
async fn failing_checked_child_stops_scope() {
    let ctx = TestContext::new();
    ctx.add("j1", FakeJob::new(secs(1)).failing()).job("j2", 1.0);

    let failure = ctx
        .flow()
        .serial(ScopeOptions::new(), |s| {
            s.invoke("j1");
            s.invoke("j2");
        })
        .await
        .unwrap_err();

    assert!(matches!(failure.error, FlowError::FailedChild { .. }));
    assert_eq!(failure_names(&failure), vec!["j1"]);
    assert_eq!(ctx.jobs.invoked(), vec!["j1"]);
    assert_eq!(state(&failure.report, "j2"), (BuildResult::Unknown, Progress::Idle));
    assert_eq!(failure.report.result, BuildResult::Failure);
    assert!(failure
        .to_string()
        .starts_with("Failed child job: 'j1' FAILURE - build: http://fake.ci/job/j1/1/console"));
}

#[tokio::test]
async fn failing_unchecked_child_does_not_stop_scope() {
    let ctx = TestContext::new();
    ctx.add("j1", FakeJob::new(secs(1)).failing()).job("j2", 1.0);

    let report = ctx
        .flow()
        .serial(ScopeOptions::new(), |s| {
            s.invoke_unchecked("j1");
            s.invoke("j2");
        })
        .await
        .unwrap();

    assert_eq!(report.result, BuildResult::Success);
    assert_eq!(state(&report, "j1").0, BuildResult::Failure);
    assert_eq!(ctx.jobs.invoked(), vec!["j1", "j2"]);
    assert!(report.render().contains("unchecked job: 'j1' FAILURE - IDLE"));
}

#[tokio::test]
async fn unstable_counts_as_success_by_default() {
    let ctx = TestContext::new();
    ctx.add("j1", FakeJob::new(secs(1)).final_result(BuildResult::Unstable));

    let report = ctx
        .flow()
        .serial(ScopeOptions::new(), |s| {
            s.invoke("j1");
        })
        .await
        .unwrap();

    assert_eq!(report.result, BuildResult::Unstable);
}

#[tokio::test]
async fn unstable_is_failure_when_requested() {
    let ctx = TestContext::new();
    ctx.add("j1", FakeJob::new(secs(1)).final_result(BuildResult::Unstable))
        .job("j2", 1.0);

    let failure = ctx
        .flow()
        .serial(ScopeOptions::new(), |s| {
            s.invoke("j1").unstable_is_failure();
            s.invoke("j2");
        })
        .await
        .unwrap_err();

    assert_eq!(failure_names(&failure), vec!["j1"]);
    assert_eq!(ctx.jobs.invoked(), vec!["j1"]);
}

#[tokio::test]
async fn nested_failure_propagates_to_parent() {
    let ctx = TestContext::new();
    ctx.job("a", 1.0)
        .add("b", FakeJob::new(secs(2)).failing())
        .job("c", 1.0);

    let failure = ctx
        .flow()
        .serial(ScopeOptions::new(), |s| {
            s.parallel(|p| {
                p.invoke("a");
                p.invoke("b");
            });
            s.invoke("c");
        })
        .await
        .unwrap_err();

    assert!(matches!(failure.error, FlowError::FailedChildren { .. }));
    assert_eq!(failure_names(&failure), vec!["b"]);
    assert!(!ctx.jobs.invoked().contains(&"c".to_string()));
}

#[tokio::test]
async fn status_lines_follow_changes() {
    let ctx = TestContext::new();
    ctx.add("j1", FakeJob::new(secs(2)).invocation_delay(Duration::ZERO));

    ctx.flow()
        .serial(ScopeOptions::new(), |s| {
            s.invoke("j1").param("target", "arm");
        })
        .await
        .unwrap();

    let url = "http://fake.ci/job/j1/1/console";
    let lines = ctx.lines();
    assert_eq!(lines[0], "Invoking job: 'j1' (target='arm')");
    assert_eq!(lines[1], format!("job: 'j1' UNKNOWN - RUNNING - build: {}", url));
    assert_eq!(lines[2], format!("job: 'j1' SUCCESS - IDLE - build: {}", url));
    assert_eq!(lines[3], "--- Final status ---");
}

#[tokio::test]
async fn ordinals_and_timestamps_are_recorded() {
    let ctx = TestContext::new();
    ctx.job("j1", 1.0).job("j2", 1.0);
    let start_ms = ctx.clock.epoch_ms();

    let report = ctx
        .flow()
        .serial(ScopeOptions::new(), |s| {
            s.invoke("j1");
            s.invoke("j2");
        })
        .await
        .unwrap();

    let records = report.records();
    assert_eq!(records[0].ordinal, Some(1));
    assert_eq!(records[1].ordinal, Some(2));
    assert_eq!(records[0].started_at_ms, Some(start_ms));
    assert!(records[1].started_at_ms >= records[0].finished_at_ms);
    assert_eq!(records[1].build_number, Some(1));
}

#[tokio::test]
async fn job_name_prefix_applies_to_every_job() {
    let ctx = TestContext::new();
    ctx.job("nightly_j1", 1.0);

    let report = crate::Flow::new(ctx.jobs.clone(), ctx.clock.clone())
        .config(crate::FlowConfig::default().job_name_prefix("nightly_"))
        .console(ctx.console.clone())
        .serial(ScopeOptions::new(), |s| {
            s.invoke("j1");
        })
        .await
        .unwrap();

    assert_eq!(ctx.jobs.invoked(), vec!["nightly_j1"]);
    assert_eq!(report.records()[0].name, "nightly_j1");
}

#[tokio::test]
async fn empty_scope_succeeds_without_calls() {
    let ctx = TestContext::new();
    let report = ctx.flow().serial(ScopeOptions::new(), |_| {}).await.unwrap();
    assert_eq!(report.result, BuildResult::Success);
    assert!(ctx.jobs.calls().is_empty());
}

#[tokio::test]
async fn poll_failure_is_fatal() {
    let ctx = TestContext::new();
    ctx.job("j1", 5.0);
    let mut jobs = Hooked::new(ctx.jobs.clone());
    jobs.fail_poll_of = Some("j1".to_string());

    let failure = crate::Flow::new(jobs, ctx.clock.clone())
        .console(ctx.console.clone())
        .serial(ScopeOptions::new(), |s| {
            s.invoke("j1");
        })
        .await
        .unwrap_err();

    assert!(matches!(
        failure.error,
        FlowError::Adapter(AdapterError::Transport(_))
    ));
}
