// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn missing_jobs_listed_and_nothing_invoked() {
    let ctx = TestContext::new();
    ctx.job("j1", 1.0).job("j2", 1.0);

    let failure = ctx
        .flow()
        .serial(ScopeOptions::new(), |s| {
            s.invoke("j1");
            s.invoke("missingA");
            s.parallel(|p| {
                p.invoke("missingB");
                p.invoke("j2");
            });
            s.invoke("missingC");
        })
        .await
        .unwrap_err();

    match &failure.error {
        FlowError::MissingJobs { names } => {
            assert_eq!(names, &vec!["missingA", "missingB", "missingC"]);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(ctx.jobs.invoked().is_empty());
    assert!(failure.to_string().contains("Job not found: 'missingB'"));
    assert!(failure
        .report
        .render()
        .contains("job: 'missingA' - MISSING JOB"));
}

#[tokio::test]
async fn transport_error_during_lookup_counts_as_missing() {
    let ctx = TestContext::new();
    ctx.job("j1", 1.0);
    ctx.jobs.set_unreachable("j1");

    let failure = ctx
        .flow()
        .serial(ScopeOptions::new(), |s| {
            s.invoke("j1");
        })
        .await
        .unwrap_err();

    assert!(matches!(failure.error, FlowError::MissingJobs { ref names } if names == &["j1"]));
}

#[tokio::test]
async fn allowed_missing_checked_job_fails_serial_scope() {
    let ctx = TestContext::new();
    ctx.job("j1", 1.0).job("j2", 1.0);

    let failure = ctx
        .flow()
        .serial(ScopeOptions::new().allow_missing_jobs(true), |s| {
            s.invoke("j1");
            s.invoke("missingA");
            s.invoke("j2");
        })
        .await
        .unwrap_err();

    assert!(matches!(failure.error, FlowError::FailedChild { ref job } if job.missing));
    assert_eq!(failure.to_string(), "Failed child job: 'missingA' - MISSING JOB");
    assert_eq!(ctx.jobs.invoked(), vec!["j1"]);
    assert!(ctx.printed("job: 'missingA' - MISSING JOB"));
}

#[tokio::test]
async fn allowed_missing_checked_job_fails_parallel_scope() {
    let ctx = TestContext::new();
    ctx.job("j1", 1.0).job("j2", 1.0);

    let failure = ctx
        .flow()
        .parallel(ScopeOptions::new().allow_missing_jobs(true), |p| {
            p.invoke("j1");
            p.invoke("missingA");
            p.serial(|s| {
                s.invoke("missingB");
                s.invoke("j2");
            });
        })
        .await
        .unwrap_err();

    assert_eq!(failure_names(&failure), vec!["missingA", "missingB"]);
    assert_eq!(ctx.jobs.invoked(), vec!["j1"]);
}

#[tokio::test]
async fn allowed_missing_unchecked_job_is_skipped() {
    let ctx = TestContext::new();
    ctx.job("j1", 1.0).job("j2", 1.0);

    let report = ctx
        .flow()
        .serial(ScopeOptions::new().allow_missing_jobs(true), |s| {
            s.invoke("j1");
            s.invoke_unchecked("missingA");
            s.invoke("j2");
        })
        .await
        .unwrap();

    assert_eq!(report.result, BuildResult::Success);
    assert_eq!(ctx.jobs.invoked(), vec!["j1", "j2"]);
    assert!(ctx.printed("unchecked job: 'missingA' - MISSING JOB"));
    assert!(report.find("missingA")[0].missing);
}

#[tokio::test]
async fn job_created_during_flow_is_invoked_when_reached() {
    let ctx = TestContext::new();
    ctx.add("j1", FakeJob::new(secs(1)).creates("missingA"))
        .job("j2", 1.0);
    ctx.jobs
        .add_flow_created_job("missingA", FakeJob::new(secs(1)).creates("missingB"));
    ctx.jobs.add_flow_created_job("missingB", FakeJob::new(secs(1)));

    let report = ctx
        .flow()
        .serial(ScopeOptions::new().allow_missing_jobs(true), |s| {
            s.invoke("j1");
            s.invoke("missingA");
            s.parallel(|p| {
                p.invoke("missingB");
                p.invoke("j2");
            });
        })
        .await
        .unwrap();

    assert_eq!(ctx.jobs.invoked(), vec!["j1", "missingA", "missingB", "j2"]);
    assert_eq!(state(&report, "missingA"), (BuildResult::Success, Progress::Idle));
    assert!(!report.find("missingB")[0].missing);
}

#[tokio::test]
async fn job_deleted_after_lookup_is_fatal() {
    let ctx = TestContext::new();
    ctx.job("j1", 1.0);

    let failure = crate::Flow::new(DeleteOnFind::new(ctx.jobs.clone()), ctx.clock.clone())
        .console(ctx.console.clone())
        .serial(ScopeOptions::new().allow_missing_jobs(true), |s| {
            s.invoke("j1");
        })
        .await
        .unwrap_err();

    assert!(matches!(
        failure.error,
        FlowError::Adapter(AdapterError::JobNotFound(ref name)) if name == "j1"
    ));
    assert!(ctx.jobs.invoked().contains(&"j1".to_string()), "invoke was attempted");
}

/// Deletes every job right after it has been found.
#[derive(Clone)]
struct DeleteOnFind {
    inner: jf_adapters::FakeJobSystem<jf_core::FakeClock>,
}

impl DeleteOnFind {
    fn new(inner: jf_adapters::FakeJobSystem<jf_core::FakeClock>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl JobSystem for DeleteOnFind {
    async fn find_job(&self, name: &str) -> Result<JobRef, AdapterError> {
        let found = self.inner.find_job(name).await;
        self.inner.remove_job(name);
        found
    }

    async fn invoke(&self, job: &JobRef, spec: &JobSpec) -> Result<InvocationHandle, AdapterError> {
        self.inner.invoke(job, spec).await
    }

    async fn poll(&self, handle: &InvocationHandle) -> Result<BuildStatus, AdapterError> {
        self.inner.poll(handle).await
    }

    async fn stop(&self, handle: &InvocationHandle, dequeue: bool) -> Result<(), AdapterError> {
        self.inner.stop(handle, dequeue).await
    }
}
