//! End-to-end flows on the simulated job system.

use crate::prelude::*;

#[tokio::test]
async fn serial_flow_of_two_successful_jobs() {
    let world = World::new();
    world.job("j1", 1.0).job("j2", 1.0);

    let report = world
        .flow()
        .serial(ScopeOptions::new(), |s| {
            s.invoke("j1");
            s.invoke("j2");
        })
        .await
        .unwrap();

    assert_eq!(report.result, BuildResult::Success);
    similar_asserts::assert_eq!(
        world.final_status(),
        "serial flow: [\n   job: 'j1' SUCCESS - IDLE\n   job: 'j2' SUCCESS - IDLE\n]\n"
    );
}

#[tokio::test]
async fn kill_all_aborts_long_sibling_of_failed_job() {
    let world = World::new();
    world.job("j1", 50.0).job("j2", 0.1).failing_job("j3", 2.0);

    let failure = world
        .flow()
        .parallel(ScopeOptions::new().kill_all(true), |p| {
            p.invoke("j1");
            p.invoke("j2");
            p.invoke("j3");
        })
        .await
        .unwrap_err();

    let find = |name: &str| failure.report.find(name)[0].result;
    assert_eq!(find("j1"), BuildResult::Aborted);
    assert_eq!(find("j2"), BuildResult::Success);
    assert_eq!(find("j3"), BuildResult::Failure);
    assert_eq!(failure_names(&failure), vec!["j1", "j3"]);
    assert!(failure.to_string().starts_with("Failed child jobs:\n"));
    similar_asserts::assert_eq!(
        world.final_status(),
        "parallel flow: (\n   job: 'j1' ABORTED - IDLE\n   job: 'j2' SUCCESS - IDLE\n   job: 'j3' FAILURE - IDLE\n)\n"
    );
}

#[tokio::test]
async fn secret_parameters_never_reach_the_failure_message() {
    let world = World::new();
    world.failing_job("passwd_args", 1.0);

    let failure = world
        .flow()
        .serial(ScopeOptions::new().secret_params(".*pass.*"), |s| {
            s.invoke("passwd_args")
                .param("s1", "no-secret")
                .param("password", "SECRET");
        })
        .await
        .unwrap_err();

    let message = failure.to_string();
    assert!(message.contains(jf_core::MASK), "{}", message);
    assert!(!message.contains("SECRET"), "{}", message);
    assert!(message.contains("s1='no-secret'"));
    assert!(!world.console.contents().contains("SECRET"));
}

#[tokio::test]
async fn job_created_during_the_flow_is_invoked() {
    let world = World::new();
    world
        .jobs
        .add_job("j1", FakeJob::new(secs(1.0)).creates("missingA"));
    world.jobs.add_flow_created_job("missingA", FakeJob::new(secs(1.0)));
    world.job("j2", 1.0);

    let report = world
        .flow()
        .serial(ScopeOptions::new().allow_missing_jobs(true), |s| {
            s.invoke("j1");
            s.invoke("missingA");
            s.invoke("j2");
        })
        .await
        .unwrap();

    assert_eq!(world.jobs.invoked(), vec!["j1", "missingA", "j2"]);
    let created = report.find("missingA")[0];
    assert!(!created.missing);
    assert_eq!(created.result, BuildResult::Success);
}

#[tokio::test]
async fn missing_jobs_fail_before_anything_runs() {
    let world = World::new();
    world.job("j1", 1.0);

    let failure = world
        .flow()
        .serial(ScopeOptions::new(), |s| {
            s.invoke("j1");
            s.parallel(|p| {
                p.invoke("ghost1");
                p.invoke("ghost2");
            });
        })
        .await
        .unwrap_err();

    assert_eq!(
        failure.to_string(),
        "Job not found: 'ghost1'\nJob not found: 'ghost2'"
    );
    assert!(world.jobs.invoked().is_empty());
}

#[tokio::test]
async fn unstable_checked_job_makes_flow_unstable() {
    let world = World::new();
    world
        .jobs
        .add_job("flaky", FakeJob::new(secs(1.0)).final_result(BuildResult::Unstable));
    world.job("solid", 1.0);

    let report = world
        .flow()
        .parallel(ScopeOptions::new(), |p| {
            p.invoke("flaky");
            p.invoke("solid");
        })
        .await
        .unwrap();

    assert_eq!(report.result, BuildResult::Unstable);
}

#[tokio::test]
async fn retrying_a_flaky_job_in_a_later_scope() {
    let world = World::new();
    world.jobs.add_job("flaky", FakeJob::new(secs(1.0)).max_fails(1));

    let report = world
        .flow()
        .serial(ScopeOptions::new(), |s| {
            s.invoke_unchecked("flaky");
            s.invoke("flaky");
        })
        .await
        .unwrap();

    let runs: Vec<BuildResult> = report.find("flaky").iter().map(|r| r.result).collect();
    assert_eq!(runs, vec![BuildResult::Failure, BuildResult::Success]);
    assert_eq!(world.jobs.invocations("flaky"), 2);
}
