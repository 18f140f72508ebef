// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use jf_core::Clock;

#[tokio::test]
async fn serial_timeout_aborts_running_job() {
    let ctx = TestContext::new();
    ctx.job("j1", 50.0).job("j2", 1.0);

    let failure = ctx
        .flow()
        .serial(ScopeOptions::new().timeout(secs(5)), |s| {
            s.invoke("j1");
            s.invoke("j2");
        })
        .await
        .unwrap_err();

    match &failure.error {
        FlowError::Timeout {
            scope,
            timeout,
            unfinished,
        } => {
            assert_eq!(scope, "serial");
            assert_eq!(*timeout, secs(5));
            assert_eq!(unfinished, &vec!["j1".to_string()]);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(failure
        .to_string()
        .ends_with("in serial flow, unfinished jobs: 'j1'"));
    assert_eq!(state(&failure.report, "j1"), (BuildResult::Aborted, Progress::Idle));
    assert_eq!(state(&failure.report, "j2"), (BuildResult::Unknown, Progress::Idle));
    assert_eq!(ctx.jobs.invoked(), vec!["j1"]);
    assert!(ctx.printed("Killing all running builds for: 'j1'"));
}

#[tokio::test]
async fn timeout_without_kill_all_leaves_unchecked_running() {
    let ctx = TestContext::new();
    ctx.job("background", 50.0).job("main", 50.0);

    let failure = ctx
        .flow()
        .parallel(ScopeOptions::new().timeout(secs(3)), |p| {
            p.invoke_unchecked("background");
            p.invoke("main");
        })
        .await
        .unwrap_err();

    assert!(matches!(failure.error, FlowError::Timeout { .. }));
    assert_eq!(stops(&ctx.jobs.calls()), vec![("main".to_string(), false)]);
    assert_eq!(
        state(&failure.report, "background"),
        (BuildResult::Unknown, Progress::Running)
    );
    assert_eq!(state(&failure.report, "main"), (BuildResult::Aborted, Progress::Idle));
}

#[tokio::test]
async fn timeout_with_kill_all_stops_everything() {
    let ctx = TestContext::new();
    ctx.job("background", 50.0).job("main", 50.0);

    ctx.flow()
        .parallel(ScopeOptions::new().timeout(secs(3)).kill_all(true), |p| {
            p.invoke_unchecked("background");
            p.invoke("main");
        })
        .await
        .unwrap_err();

    let mut stopped: Vec<String> = stops(&ctx.jobs.calls()).into_iter().map(|(n, _)| n).collect();
    stopped.sort();
    assert_eq!(stopped, vec!["background", "main"]);
}

#[tokio::test]
async fn nested_timeout_fails_enclosing_scope() {
    let ctx = TestContext::new();
    ctx.job("slow", 50.0).job("after", 1.0);

    let failure = ctx
        .flow()
        .serial(ScopeOptions::new(), |s| {
            s.parallel_with(ScopeOptions::new().timeout(secs(2)), |p| {
                p.invoke("slow");
            });
            s.invoke("after");
        })
        .await
        .unwrap_err();

    assert!(matches!(
        &failure.error,
        FlowError::Timeout { scope, .. } if scope == "parallel"
    ));
    assert!(failure.error.failed_jobs().is_empty());
    assert_eq!(ctx.jobs.invoked(), vec!["slow"]);
}

#[tokio::test]
async fn deadline_cuts_the_report_interval_short() {
    let ctx = TestContext::new();
    ctx.job("j1", 50.0);
    let start = ctx.clock.now();

    ctx.flow()
        .serial(
            ScopeOptions::new()
                .timeout(secs(3))
                .report_interval(secs(10)),
            |s| {
                s.invoke("j1");
            },
        )
        .await
        .unwrap_err();

    assert_eq!(ctx.clock.now() - start, secs(3));
}

#[tokio::test]
async fn unrepresentable_timeout_means_no_deadline() {
    let ctx = TestContext::new();
    ctx.job("j1", 3.0);

    let report = ctx
        .flow()
        .serial(ScopeOptions::new().timeout(Duration::MAX), |s| {
            s.invoke("j1");
        })
        .await
        .unwrap();

    assert_eq!(report.result, BuildResult::Success);
}

#[tokio::test]
async fn unrepresentable_kill_grace_waits_for_confirmation() {
    let ctx = TestContext::new();
    ctx.job("long", 50.0)
        .add("fails", FakeJob::new(secs(1)).failing());

    let failure = ctx
        .flow()
        .config(crate::FlowConfig::default().report_interval(secs(1)).kill_grace(Duration::MAX))
        .parallel(ScopeOptions::new().kill_all(true), |p| {
            p.invoke_unchecked("long");
            p.invoke("fails");
        })
        .await
        .unwrap_err();

    assert_eq!(failure_names(&failure), vec!["fails"]);
    assert_eq!(state(&failure.report, "long"), (BuildResult::Aborted, Progress::Idle));
}
