//! Cancellation of a flow running real scripts.

use crate::prelude::*;

#[tokio::test]
async fn cancelled_flow_aborts_running_scripts() {
    let world = ScriptWorld::new(&[("slow", "exec sleep 30\n"), ("next", "exit 0\n")]);
    let token = CancelToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        canceller.cancel("SIGTERM");
    });

    let failure = within_limit(world.flow().cancel_token(token).serial(ScopeOptions::new(), |s| {
        s.invoke("slow");
        s.invoke("next");
    }))
    .await
    .unwrap_err();

    assert!(matches!(failure.error, FlowError::Cancelled { ref signal } if signal == "SIGTERM"));
    assert_eq!(failure.report.find("slow")[0].result, BuildResult::Aborted);
    assert!(failure.report.find("next").is_empty());

    let console = world.console.contents();
    assert!(console.contains("Got SIGTERM: Killing all builds belonging to current flow"));
    assert!(console.contains("Killing all running builds for: 'slow'"));
    assert!(console.contains("job: 'slow' stopped running"));
}
