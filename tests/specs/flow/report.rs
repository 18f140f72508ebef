//! Final report contents and serialization.

use crate::prelude::*;

#[tokio::test]
async fn report_serializes_as_tagged_tree() {
    let world = World::new();
    world.job("build", 1.0).job("lint", 0.5);

    let report = world
        .flow()
        .serial(ScopeOptions::new(), |s| {
            s.invoke("build").param("branch", "main");
            s.parallel(|p| {
                p.invoke_unchecked("lint");
            });
        })
        .await
        .unwrap();

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["result"], "SUCCESS");
    assert_eq!(json["root"]["type"], "scope");
    assert_eq!(json["root"]["kind"], "serial");

    let build = &json["root"]["children"][0];
    assert_eq!(build["type"], "job");
    assert_eq!(build["name"], "build");
    assert_eq!(build["result"], "SUCCESS");
    assert_eq!(build["progress"], "IDLE");
    assert_eq!(build["ordinal"], 1);
    assert_eq!(build["params"]["branch"], "main");

    let nested = &json["root"]["children"][1];
    assert_eq!(nested["kind"], "parallel");
    assert_eq!(nested["children"][0]["checked"], false);
    assert_eq!(nested["children"][0]["ordinal"], 2);
}

#[tokio::test]
async fn failure_carries_every_child_status() {
    let world = World::new();
    world.failing_job("compile", 1.0).job("package", 1.0);

    let failure = world
        .flow()
        .serial(ScopeOptions::new(), |s| {
            s.invoke("compile");
            s.invoke("package");
        })
        .await
        .unwrap_err();

    assert_eq!(failure.report.result, BuildResult::Failure);
    let names: Vec<&str> = failure
        .report
        .records()
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(names, vec!["compile", "package"]);
    assert!(!failure.report.find("package")[0].is_invoked());
    similar_asserts::assert_eq!(world.final_status(), failure.report.render());
}

#[tokio::test]
async fn status_lines_follow_the_console_protocol() {
    let world = World::new();
    world.job("j1", 1.0).failing_job("j2", 1.0);

    world
        .flow()
        .parallel(ScopeOptions::new(), |p| {
            p.invoke("j1").param("target", "arm");
            p.invoke_unchecked("j2");
        })
        .await
        .unwrap();

    let lines = world.console.lines();
    assert_eq!(lines[0], "Invoking job: 'j1' (target='arm')");
    assert_eq!(lines[1], "Invoking job: 'j2'");
    assert!(lines.contains(&"job: 'j1' UNKNOWN - RUNNING - build: http://fake.ci/job/j1/1/console".to_string()));
    assert!(lines.contains(&"job: 'j1' SUCCESS - IDLE - build: http://fake.ci/job/j1/1/console".to_string()));
    assert!(lines.contains(
        &"unchecked job: 'j2' FAILURE - IDLE - build: http://fake.ci/job/j2/1/console".to_string()
    ));
    assert!(lines.contains(&"--- Final status ---".to_string()));
}
