// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const SECRETS: [&str; 3] = ["SECRET", "hemmeligt", "not_security"];

fn leaks(text: &str) -> Vec<&'static str> {
    SECRETS.iter().copied().filter(|s| text.contains(s)).collect()
}

#[tokio::test]
async fn secret_values_masked_everywhere_but_the_job_system() {
    let ctx = TestContext::new();
    ctx.add("passwd_args", FakeJob::new(secs(1)).failing());

    let failure = ctx
        .flow()
        .serial(ScopeOptions::new().secret_params(".*PASS.*|.*pass.*"), |s| {
            s.invoke("passwd_args")
                .param("fail", "yes")
                .param("password", "SECRET")
                .param("s1", "no-secret")
                .param("passwd", "hemmeligt")
                .param("PASS", "not_security");
        })
        .await
        .unwrap_err();

    let message = failure.to_string();
    assert!(message.contains(
        "(fail='yes', password='******', s1='no-secret', passwd='******', PASS='******') FAILURE"
    ));
    assert!(leaks(&message).is_empty(), "leaked in error: {}", message);
    assert!(leaks(&ctx.console.contents()).is_empty());
    assert!(leaks(&failure.report.to_json().unwrap()).is_empty());
    assert!(leaks(&format!("{:?}", failure.error)).is_empty());

    let sent = ctx
        .jobs
        .calls()
        .into_iter()
        .find_map(|c| match c {
            JobCall::Invoke { params, .. } => Some(params),
            _ => None,
        })
        .unwrap();
    assert_eq!(sent["password"], "SECRET");
    assert_eq!(sent["passwd"], "hemmeligt");
    assert_eq!(sent["PASS"], "not_security");
}

#[tokio::test]
async fn nested_pattern_replaces_inherited_one() {
    let ctx = TestContext::new();
    ctx.job("outer", 0.0).job("inner", 0.0);

    let report = ctx
        .flow()
        .serial(ScopeOptions::new().secret_params("password"), |s| {
            s.invoke("outer").param("password", "p1").param("api_key", "k1");
            s.serial_with(ScopeOptions::new().secret_params(".*key"), |inner| {
                inner.invoke("inner").param("password", "p2").param("api_key", "k2");
            });
        })
        .await
        .unwrap();

    let outer = &report.find("outer")[0].params;
    assert_eq!(outer["password"], "******");
    assert_eq!(outer["api_key"], "k1");
    let inner = &report.find("inner")[0].params;
    assert_eq!(inner["password"], "p2");
    assert_eq!(inner["api_key"], "******");
}

#[tokio::test]
async fn adapter_error_text_is_scrubbed() {
    let ctx = TestContext::new();
    ctx.job("deploy", 1.0);
    let mut jobs = Hooked::new(ctx.jobs.clone());
    jobs.fail_invoke_of = Some("deploy".to_string());

    let failure = crate::Flow::new(jobs, ctx.clock.clone())
        .console(ctx.console.clone())
        .serial(ScopeOptions::new().secret_params("token"), |s| {
            s.invoke("deploy").param("user", "alice").param("token", "SECRET");
        })
        .await
        .unwrap_err();

    assert!(matches!(failure.error, FlowError::Adapter(_)));
    assert_eq!(
        failure.to_string(),
        "job system error: transport failure: server rejected deploy with alice,******"
    );
}

#[tokio::test]
async fn invalid_pattern_fails_before_any_call() {
    let ctx = TestContext::new();
    ctx.job("j1", 1.0);

    let failure = ctx
        .flow()
        .serial(ScopeOptions::new(), |s| {
            s.serial_with(ScopeOptions::new().secret_params("(unclosed"), |inner| {
                inner.invoke("j1");
            });
        })
        .await
        .unwrap_err();

    assert!(matches!(failure.error, FlowError::InvalidSecretPattern(_)));
    assert!(ctx.jobs.calls().is_empty());
    assert_eq!(failure.report.result, BuildResult::Failure);
}

#[tokio::test]
async fn log_events_carry_only_masked_values() {
    let logs = crate::ConsoleCapture::new();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let ctx = TestContext::new();
    ctx.add("passwd_args", FakeJob::new(secs(1)).failing());
    ctx.flow()
        .serial(ScopeOptions::new().secret_params(".*pass.*"), |s| {
            s.invoke("passwd_args")
                .param("password", "SECRET")
                .param("passwd", "hemmeligt");
        })
        .await
        .unwrap_err();

    let text = logs.contents();
    assert!(text.contains("invoked"), "no invocation event in:\n{}", text);
    assert!(leaks(&text).is_empty(), "leaked in logs:\n{}", text);
}
