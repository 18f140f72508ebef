// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process environment and exit-status mapping for locally executed jobs

use jf_core::{BuildResult, Params};
use std::path::Path;

/// Content of the result file that requests an UNSTABLE result.
pub const UNSTABLE_REQUEST: &str = "unstable";

/// Identity of one local build, used to derive its environment.
#[derive(Debug, Clone)]
pub struct BuildContext<'a> {
    pub job: &'a str,
    pub build_number: u32,
    pub build_id: String,
    pub script: &'a Path,
    pub script_dir: &'a Path,
    pub workspace: &'a Path,
    pub result_file: &'a Path,
    pub cause: Option<&'a str>,
    /// Security token the flow was given for this invocation
    pub token: Option<&'a str>,
}

/// Environment exported to a job script.
///
/// Mirrors the variables a CI server sets for its builds so job scripts can
/// run unchanged on either, followed by the build parameters.
pub fn job_env(ctx: &BuildContext<'_>, params: &Params) -> Vec<(String, String)> {
    let home = ctx.script_dir.display().to_string();
    let job_url = ctx.script.display().to_string();
    let mut env = vec![
        ("BUILD_NUMBER".to_string(), ctx.build_number.to_string()),
        ("BUILD_ID".to_string(), ctx.build_id.clone()),
        (
            "BUILD_DISPLAY_NAME".to_string(),
            format!("#{}", ctx.build_number),
        ),
        ("JOB_NAME".to_string(), ctx.job.to_string()),
        (
            "BUILD_TAG".to_string(),
            format!("jobflow-{}-{}", ctx.job, ctx.build_number),
        ),
        ("NODE_NAME".to_string(), "master".to_string()),
        ("NODE_LABELS".to_string(), String::new()),
        (
            "WORKSPACE".to_string(),
            ctx.workspace.display().to_string(),
        ),
        ("JENKINS_HOME".to_string(), home.clone()),
        ("JENKINS_URL".to_string(), home.clone()),
        ("HUDSON_URL".to_string(), home),
        (
            "BUILD_URL".to_string(),
            format!("{}/{}", job_url, ctx.build_number),
        ),
        ("JOB_URL".to_string(), job_url),
        (
            "JF_RESULT_FILE".to_string(),
            ctx.result_file.display().to_string(),
        ),
    ];
    if let Some(cause) = ctx.cause {
        env.push(("JF_CAUSE".to_string(), cause.to_string()));
    }
    if let Some(token) = ctx.token {
        env.push(("JF_SECURITY_TOKEN".to_string(), token.to_string()));
    }
    env.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
    env
}

/// Map a finished process to a build result.
///
/// `code` is `None` when the process died from a signal. `requested` is the
/// trimmed content of the build's result file, if the script wrote one.
/// A requested UNSTABLE wins over the exit code; only a stop overrides it.
pub fn result_from_exit(code: Option<i32>, stopped: bool, requested: Option<&str>) -> BuildResult {
    if stopped {
        return BuildResult::Aborted;
    }
    let from_code = match code {
        Some(0) => BuildResult::Success,
        Some(1) | None => BuildResult::Failure,
        Some(_) => BuildResult::Unstable,
    };
    match requested {
        None | Some("") => from_code,
        Some(r) if r.eq_ignore_ascii_case(UNSTABLE_REQUEST) => BuildResult::Unstable,
        Some(other) => {
            tracing::warn!(requested = other, "unknown requested build result");
            BuildResult::Failure
        }
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
