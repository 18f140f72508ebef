//! Flows against local job scripts in real time.

use crate::prelude::*;

#[tokio::test]
async fn scripts_run_in_declared_order() {
    let world = ScriptWorld::new(&[
        ("build", "echo \"building $BRANCH\"\n"),
        ("test_a", "exit 0\n"),
        ("test_b", "echo broken\nexit 1\n"),
        ("deploy", "echo \"deploying build $BUILD_NUMBER of $JOB_NAME\"\n"),
    ]);

    let report = within_limit(world.flow().serial(ScopeOptions::new(), |s| {
        s.invoke("build").param("BRANCH", "main");
        s.parallel(|p| {
            p.invoke("test_a");
            p.invoke_unchecked("test_b");
        });
        s.invoke("deploy");
    }))
    .await
    .unwrap();

    assert_eq!(report.result, BuildResult::Success);
    assert_eq!(report.find("test_b")[0].result, BuildResult::Failure);
    assert_eq!(world.log("build").trim(), "building main");
    assert_eq!(world.log("deploy").trim(), "deploying build 1 of deploy");

    let ordinals: Vec<Option<u32>> = ["build", "deploy"]
        .iter()
        .map(|n| report.find(n)[0].ordinal)
        .collect();
    assert_eq!(ordinals, vec![Some(1), Some(4)]);
}

#[tokio::test]
async fn failing_script_fails_the_flow() {
    let world = ScriptWorld::new(&[("compile", "exit 1\n"), ("package", "exit 0\n")]);

    let failure = within_limit(world.flow().serial(ScopeOptions::new(), |s| {
        s.invoke("compile");
        s.invoke("package");
    }))
    .await
    .unwrap_err();

    assert_eq!(failure_names(&failure), vec!["compile"]);
    assert!(failure.report.find("package")[0].ordinal.is_none());
}

#[tokio::test]
async fn unstable_script_respects_invocation_policy() {
    let world = ScriptWorld::new(&[("flaky", "exit 3\n")]);

    let report = within_limit(world.flow().serial(ScopeOptions::new(), |s| {
        s.invoke("flaky");
    }))
    .await
    .unwrap();
    assert_eq!(report.result, BuildResult::Unstable);

    let failure = within_limit(world.flow().serial(ScopeOptions::new(), |s| {
        s.invoke("flaky").unstable_is_failure();
    }))
    .await
    .unwrap_err();
    assert_eq!(failure_names(&failure), vec!["flaky"]);
}

#[tokio::test]
async fn kill_all_stops_sleeping_script() {
    let world = ScriptWorld::new(&[("slow", "exec sleep 30\n"), ("bad", "sleep 0.2\nexit 1\n")]);

    let failure = within_limit(world.flow().parallel(ScopeOptions::new().kill_all(true), |p| {
        p.invoke_unchecked("slow");
        p.invoke("bad");
    }))
    .await
    .unwrap_err();

    assert_eq!(failure_names(&failure), vec!["bad"]);
    let slow = failure.report.find("slow")[0];
    assert_eq!((slow.result, slow.progress), (BuildResult::Aborted, Progress::Idle));
}

#[tokio::test]
async fn scope_timeout_aborts_script() {
    let world = ScriptWorld::new(&[("slow", "exec sleep 30\n")]);

    let failure = within_limit(world.flow().serial(
        ScopeOptions::new().timeout(Duration::from_millis(300)),
        |s| {
            s.invoke("slow");
        },
    ))
    .await
    .unwrap_err();

    assert!(matches!(
        failure.error,
        FlowError::Timeout { ref unfinished, .. } if unfinished == &vec!["slow".to_string()]
    ));
    assert_eq!(failure.report.find("slow")[0].result, BuildResult::Aborted);
}

#[tokio::test]
async fn missing_script_uses_default_fallback() {
    let world = ScriptWorld::new(&[("default", "echo \"generic $JOB_NAME\"\n")]);

    within_limit(world.flow().serial(ScopeOptions::new(), |s| {
        s.invoke("anything");
    }))
    .await
    .unwrap();

    assert_eq!(world.log("anything").trim(), "generic anything");
}
