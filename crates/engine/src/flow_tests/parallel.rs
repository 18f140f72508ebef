// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn every_child_invoked_before_any_poll() {
    let ctx = TestContext::new();
    ctx.job("j1", 1.0).job("j2", 3.0).job("j3", 0.5);

    let report = ctx
        .flow()
        .parallel(ScopeOptions::new(), |p| {
            p.invoke("j1");
            p.invoke("j2");
            p.invoke("j3");
        })
        .await
        .unwrap();

    assert_eq!(report.result, BuildResult::Success);
    let calls = ctx.jobs.calls();
    let first_poll = call_index(&calls, |c| matches!(c, JobCall::Poll { .. }));
    for name in ["j1", "j2", "j3"] {
        assert!(call_index(&calls, is_invoke(name)) < first_poll, "{} invoked late", name);
    }
}

#[tokio::test]
async fn siblings_finish_before_failure_propagates() {
    let ctx = TestContext::new();
    ctx.add("fails", FakeJob::new(secs(1)).failing())
        .job("slow", 5.0);

    let failure = ctx
        .flow()
        .parallel(ScopeOptions::new(), |p| {
            p.invoke("fails");
            p.invoke("slow");
        })
        .await
        .unwrap_err();

    assert!(matches!(failure.error, FlowError::FailedChildren { .. }));
    assert_eq!(failure_names(&failure), vec!["fails"]);
    assert_eq!(state(&failure.report, "slow"), (BuildResult::Success, Progress::Idle));
    assert!(stops(&ctx.jobs.calls()).is_empty());
}

#[tokio::test]
async fn failures_of_nested_scopes_are_merged() {
    let ctx = TestContext::new();
    ctx.add("a", FakeJob::new(secs(1)).failing())
        .add("b", FakeJob::new(secs(2)).failing())
        .job("c", 1.0);

    let failure = ctx
        .flow()
        .parallel(ScopeOptions::new(), |p| {
            p.invoke("a");
            p.serial(|s| {
                s.invoke("c");
                s.invoke("b");
            });
        })
        .await
        .unwrap_err();

    assert_eq!(failure_names(&failure), vec!["a", "b"]);
    let text = failure.to_string();
    assert!(text.contains("Failed child job: 'a' FAILURE"));
    assert!(text.contains("Failed child job: 'b' FAILURE"));
}

#[tokio::test]
async fn duplicate_invocations_are_independent() {
    let ctx = TestContext::new();
    ctx.add("j", FakeJob::new(secs(1)).max_fails(1));

    let failure = ctx
        .flow()
        .parallel(ScopeOptions::new(), |p| {
            p.invoke("j").param("n", "1");
            p.invoke("j").param("n", "2");
        })
        .await
        .unwrap_err();

    let records = failure.report.find("j");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].result, BuildResult::Failure);
    assert_eq!(records[1].result, BuildResult::Success);
    assert_eq!(records[0].params["n"], "1");
    assert_eq!(ctx.jobs.invocations("j"), 2);
}

#[tokio::test]
async fn nested_serial_inside_parallel_keeps_order() {
    let ctx = TestContext::new();
    ctx.job("long", 4.0).job("s1", 1.0).job("s2", 1.0);

    let report = ctx
        .flow()
        .parallel(ScopeOptions::new(), |p| {
            p.invoke("long");
            p.serial(|s| {
                s.invoke("s1");
                s.invoke("s2");
            });
        })
        .await
        .unwrap();

    let calls = ctx.jobs.calls();
    let last_s1_poll = calls.iter().rposition(is_poll("s1")).unwrap();
    assert!(call_index(&calls, is_invoke("s2")) > last_s1_poll);
    assert_eq!(
        report.render(),
        "parallel flow: (\n   job: 'long' SUCCESS - IDLE\n   serial flow: [\n      job: 's1' SUCCESS - IDLE\n      job: 's2' SUCCESS - IDLE\n   ]\n)\n"
    );
}
