// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn kill_all_aborts_running_siblings() {
    let ctx = TestContext::new();
    ctx.job("j1", 50.0)
        .job("j2", 0.1)
        .add("j3", FakeJob::new(secs(1)).failing());

    let failure = ctx
        .flow()
        .parallel(ScopeOptions::new().kill_all(true), |p| {
            p.invoke_unchecked("j1");
            p.invoke_unchecked("j2");
            p.invoke("j3");
        })
        .await
        .unwrap_err();

    assert_eq!(failure_names(&failure), vec!["j3"]);
    assert_eq!(state(&failure.report, "j1"), (BuildResult::Aborted, Progress::Idle));
    assert_eq!(state(&failure.report, "j2"), (BuildResult::Success, Progress::Idle));
    assert_eq!(stops(&ctx.jobs.calls()), vec![("j1".to_string(), false)]);

    let lines = ctx.lines();
    let killing = lines
        .iter()
        .position(|l| l == "Killing all running builds for: 'j1'")
        .unwrap();
    assert_eq!(lines[killing + 1], "job: 'j1' stopped running");
    assert!(lines[killing + 2].starts_with("unchecked job: 'j1' ABORTED - IDLE - build: "));
}

#[tokio::test]
async fn without_kill_all_siblings_keep_running() {
    let ctx = TestContext::new();
    ctx.job("j1", 8.0).add("j3", FakeJob::new(secs(1)).failing());

    let failure = ctx
        .flow()
        .parallel(ScopeOptions::new(), |p| {
            p.invoke_unchecked("j1");
            p.invoke("j3");
        })
        .await
        .unwrap_err();

    assert_eq!(state(&failure.report, "j1").0, BuildResult::Success);
    assert!(stops(&ctx.jobs.calls()).is_empty());
}

#[tokio::test]
async fn queued_invocations_are_dequeued() {
    let ctx = TestContext::new();
    ctx.add(
        "queued",
        FakeJob::new(secs(5)).invocation_delay(secs(30)),
    )
    .add("fails", FakeJob::new(Duration::ZERO).failing());

    let failure = ctx
        .flow()
        .parallel(ScopeOptions::new().kill_all(true), |p| {
            p.invoke("queued");
            p.invoke("fails");
        })
        .await
        .unwrap_err();

    assert_eq!(stops(&ctx.jobs.calls()), vec![("queued".to_string(), true)]);
    assert_eq!(
        state(&failure.report, "queued"),
        (BuildResult::Dequeued, Progress::Idle)
    );
    assert_eq!(failure_names(&failure), vec!["queued", "fails"]);
}

#[tokio::test]
async fn kill_all_inherited_by_nested_scopes() {
    let ctx = TestContext::new();
    ctx.job("long", 50.0)
        .add("fails", FakeJob::new(secs(2)).failing())
        .job("after", 1.0);

    let failure = ctx
        .flow()
        .serial(ScopeOptions::new().kill_all(true), |s| {
            s.parallel(|p| {
                p.invoke_unchecked("long");
                p.serial(|inner| {
                    inner.invoke("fails");
                });
            });
            s.invoke("after");
        })
        .await
        .unwrap_err();

    assert_eq!(state(&failure.report, "long").0, BuildResult::Aborted);
    assert!(!ctx.jobs.invoked().contains(&"after".to_string()));
    assert_eq!(
        failure.report.render(),
        "serial flow: [\n   parallel flow: (\n      unchecked job: 'long' ABORTED - IDLE\n      serial flow: [\n         job: 'fails' FAILURE - IDLE\n      ]\n   )\n   job: 'after' UNKNOWN - IDLE\n]\n"
    );
}

#[tokio::test]
async fn kill_skips_finished_invocations() {
    let ctx = TestContext::new();
    ctx.job("quick", 0.0)
        .job("long", 50.0)
        .add("fails", FakeJob::new(secs(3)).failing());

    ctx.flow()
        .parallel(ScopeOptions::new().kill_all(true), |p| {
            p.invoke("quick");
            p.invoke_unchecked("long");
            p.invoke("fails");
        })
        .await
        .unwrap_err();

    let stopped: Vec<String> = stops(&ctx.jobs.calls()).into_iter().map(|(n, _)| n).collect();
    assert_eq!(stopped, vec!["long"]);
    assert!(!ctx.printed("Killing all running builds for: 'quick'"));
}

#[tokio::test]
async fn unconfirmed_kill_gives_up_after_grace() {
    let ctx = TestContext::new();
    ctx.add("stubborn", FakeJob::new(secs(500)).ignores_stop())
        .add("fails", FakeJob::new(secs(1)).failing());
    let start = jf_core::Clock::now(&ctx.clock);

    let failure = ctx
        .flow()
        .parallel(ScopeOptions::new().kill_all(true), |p| {
            p.invoke_unchecked("stubborn");
            p.invoke("fails");
        })
        .await
        .unwrap_err();

    assert_eq!(
        state(&failure.report, "stubborn"),
        (BuildResult::Unknown, Progress::Running)
    );
    assert!(!ctx.printed("job: 'stubborn' stopped running"));
    let elapsed = jf_core::Clock::now(&ctx.clock) - start;
    assert!(elapsed >= secs(12) && elapsed < secs(20), "elapsed {:?}", elapsed);
}
