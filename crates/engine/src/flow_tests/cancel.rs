// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::{Flow, FlowConfig};
use jf_adapters::FakeJobSystem;
use jf_core::SystemClock;

#[tokio::test]
async fn cancel_kills_running_jobs_and_skips_the_rest() {
    let ctx = TestContext::new();
    ctx.job("j1", 50.0)
        .job("j2", 1.0)
        .job("j3", 50.0)
        .job("j5", 50.0)
        .job("j7", 1.0);
    let token = CancelToken::new();
    let mut jobs = Hooked::new(ctx.jobs.clone());
    jobs.cancel_on_poll_of = Some(("j3".to_string(), token.clone()));

    let failure = Flow::new(jobs, ctx.clock.clone())
        .config(FlowConfig::default().report_interval(secs(1)))
        .console(ctx.console.clone())
        .cancel_token(token)
        .serial(ScopeOptions::new(), |s| {
            s.parallel(|p| {
                p.invoke("j1");
                p.serial(|inner| {
                    inner.invoke("j2");
                    inner.invoke("j3");
                });
                p.invoke_unchecked("j5");
            });
            s.parallel(|p| {
                p.invoke("j7");
            });
        })
        .await
        .unwrap_err();

    assert!(matches!(
        &failure.error,
        FlowError::Cancelled { signal } if signal == "SIGTERM"
    ));
    assert_eq!(failure.to_string(), "Flow cancelled by SIGTERM");
    assert!(ctx.printed("Got SIGTERM: Killing all builds belonging to current flow"));
    assert!(!ctx.jobs.invoked().contains(&"j7".to_string()));

    let mut stopped: Vec<String> = stops(&ctx.jobs.calls()).into_iter().map(|(n, _)| n).collect();
    stopped.sort();
    assert_eq!(stopped, vec!["j1", "j3", "j5"]);
    assert_eq!(
        failure.report.render(),
        "serial flow: [\n   parallel flow: (\n      job: 'j1' ABORTED - IDLE\n      serial flow: [\n         job: 'j2' SUCCESS - IDLE\n         job: 'j3' ABORTED - IDLE\n      ]\n      unchecked job: 'j5' ABORTED - IDLE\n   )\n]\n"
    );
}

#[tokio::test]
async fn cancel_before_start_invokes_nothing() {
    let ctx = TestContext::new();
    ctx.job("j1", 1.0);
    let token = CancelToken::new();
    token.cancel("SIGINT");

    let failure = ctx
        .flow()
        .cancel_token(token)
        .serial(ScopeOptions::new(), |s| {
            s.invoke("j1");
        })
        .await
        .unwrap_err();

    assert!(matches!(failure.error, FlowError::Cancelled { .. }));
    assert!(ctx.jobs.invoked().is_empty());
    assert_eq!(failure.report.render(), "serial flow: [\n]\n");
    assert!(ctx.printed("Got SIGINT"));
}

#[tokio::test]
async fn cancel_wakes_a_sleeping_flow() {
    let jobs = FakeJobSystem::new(SystemClock);
    jobs.add_job("long", FakeJob::new(secs(50)).invocation_delay(secs(30)));
    let token = CancelToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel("SIGTERM");
    });

    let flow = Flow::new(jobs.clone(), SystemClock)
        .config(FlowConfig::default().report_interval(secs(60)))
        .console(crate::ConsoleCapture::new())
        .cancel_token(token)
        .serial(ScopeOptions::new(), |s| {
            s.invoke("long");
        });
    let failure = tokio::time::timeout(secs(5), flow)
        .await
        .expect("cancellation should interrupt the report interval sleep")
        .unwrap_err();

    assert!(matches!(failure.error, FlowError::Cancelled { .. }));
    assert_eq!(stops(&jobs.calls()), vec![("long".to_string(), true)]);
    assert_eq!(
        state(&failure.report, "long"),
        (BuildResult::Dequeued, Progress::Idle)
    );
}
