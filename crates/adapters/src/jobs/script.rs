// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job system that runs job scripts as local subprocesses.
//!
//! Job `<name>` runs `<script_dir>/<name>.sh`, or `<script_dir>/default.sh`
//! when no dedicated script exists. Each build runs in the workspace
//! `<script_dir>/<name>/` with stdout and stderr captured to
//! `<log_dir>/<name>.log`. There is no queue: builds start running as soon as
//! they are invoked. A build is forgotten once a poll has reported it
//! finished; later calls with its handle fail with `UnknownInvocation`.

use super::{AdapterError, InvocationHandle, JobRef, JobSystem};
use crate::subprocess::{self, BuildContext};
use async_trait::async_trait;
use jf_core::{BuildStatus, JobSpec};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::{Child, Command};

/// Script used for jobs without a dedicated script.
const DEFAULT_SCRIPT: &str = "default";

/// Where scripts live and where their output goes.
#[derive(Debug, Clone)]
pub struct ScriptConfig {
    pub script_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl ScriptConfig {
    /// Scripts in `script_dir`, logs in the default log directory.
    pub fn new(script_dir: impl Into<PathBuf>) -> Self {
        Self {
            script_dir: script_dir.into(),
            log_dir: crate::env::script_log_dir(),
        }
    }

    pub fn log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    fn script_path(&self, job: &str) -> PathBuf {
        self.script_dir.join(format!("{}.sh", job))
    }

    fn workspace(&self, job: &str) -> PathBuf {
        self.script_dir.join(job)
    }

    fn log_path(&self, job: &str) -> PathBuf {
        self.log_dir.join(format!("{}.log", job))
    }
}

struct ScriptBuild {
    job: String,
    build_number: u32,
    child: Child,
    result_file: PathBuf,
    stopped: bool,
}

#[derive(Default)]
struct ScriptState {
    builds: HashMap<u64, ScriptBuild>,
    build_numbers: HashMap<String, u32>,
    next_id: u64,
}

/// Local subprocess job system
#[derive(Clone)]
pub struct ScriptJobSystem {
    config: Arc<ScriptConfig>,
    inner: Arc<Mutex<ScriptState>>,
}

impl ScriptJobSystem {
    pub fn new(config: ScriptConfig) -> Self {
        Self {
            config: Arc::new(config),
            inner: Arc::new(Mutex::new(ScriptState::default())),
        }
    }

    pub fn config(&self) -> &ScriptConfig {
        &self.config
    }

    fn resolve_script(&self, job: &str) -> Result<PathBuf, AdapterError> {
        let own = self.config.script_path(job);
        if own.is_file() {
            return Ok(own);
        }
        let fallback = self.config.script_path(DEFAULT_SCRIPT);
        if fallback.is_file() {
            return Ok(fallback);
        }
        Err(AdapterError::JobNotFound(format!(
            "{} or {}",
            own.display(),
            fallback.display()
        )))
    }

    /// Write (or append to) the build description file in the job workspace.
    pub fn set_build_description(
        &self,
        job: &str,
        description: &str,
        replace: bool,
        separator: &str,
    ) -> Result<(), AdapterError> {
        let workspace = self.config.workspace(job);
        fs::create_dir_all(&workspace)?;
        let path = workspace.join("description.txt");
        let has_existing = !replace && path.metadata().map(|m| m.len() > 0).unwrap_or(false);
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(!replace)
            .truncate(replace)
            .open(&path)?;
        if has_existing {
            file.write_all(separator.as_bytes())?;
        }
        file.write_all(description.as_bytes())?;
        Ok(())
    }
}

fn read_requested_result(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

#[async_trait]
impl JobSystem for ScriptJobSystem {
    async fn find_job(&self, name: &str) -> Result<JobRef, AdapterError> {
        let script = self.resolve_script(name)?;
        Ok(JobRef {
            name: name.to_string(),
            url: script.display().to_string(),
        })
    }

    async fn invoke(&self, job: &JobRef, spec: &JobSpec) -> Result<InvocationHandle, AdapterError> {
        let script = self.resolve_script(&job.name)?;
        let workspace = self.config.workspace(&job.name);
        let log_path = self.config.log_path(&job.name);
        fs::create_dir_all(&workspace)?;
        fs::create_dir_all(&self.config.log_dir)?;

        let (id, build_number) = {
            let mut inner = self.inner.lock();
            inner.next_id += 1;
            let id = inner.next_id;
            let number = inner.build_numbers.entry(job.name.clone()).or_insert(0);
            *number += 1;
            (id, *number)
        };

        let result_file = workspace.join(format!(".jf_result_{}", build_number));
        if let Err(e) = fs::remove_file(&result_file) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(e.into());
            }
        }

        let ctx = BuildContext {
            job: &job.name,
            build_number,
            build_id: chrono::Utc::now()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
            script: &script,
            script_dir: &self.config.script_dir,
            workspace: &workspace,
            result_file: &result_file,
            cause: spec.cause.as_deref(),
            token: spec.token.as_deref(),
        };

        let log = fs::File::create(&log_path)?;
        let mut cmd = Command::new("sh");
        cmd.arg(&script)
            .arg(&job.name)
            .current_dir(&workspace)
            .envs(subprocess::job_env(&ctx, &spec.params))
            .stdin(Stdio::null())
            .stdout(Stdio::from(log.try_clone()?))
            .stderr(Stdio::from(log))
            .kill_on_drop(true);
        let child = cmd.spawn()?;

        tracing::debug!(job = %job.name, build_number, pid = ?child.id(), "script started");

        self.inner.lock().builds.insert(
            id,
            ScriptBuild {
                job: job.name.clone(),
                build_number,
                child,
                result_file,
                stopped: false,
            },
        );

        Ok(InvocationHandle {
            job: job.name.clone(),
            id,
            console_url: format!("{} - {}", script.display(), log_path.display()),
        })
    }

    async fn poll(&self, handle: &InvocationHandle) -> Result<BuildStatus, AdapterError> {
        let mut inner = self.inner.lock();
        let build = inner
            .builds
            .get_mut(&handle.id)
            .ok_or_else(|| AdapterError::UnknownInvocation(handle.to_string()))?;

        let Some(exit) = build.child.try_wait()? else {
            return Ok(BuildStatus::running(build.build_number));
        };
        let requested = read_requested_result(&build.result_file);
        let result = subprocess::result_from_exit(exit.code(), build.stopped, requested.as_deref());
        tracing::debug!(job = %build.job, build_number = build.build_number, %result, "script finished");
        let status = BuildStatus::finished(result, Some(build.build_number));
        if let Some(done) = inner.builds.remove(&handle.id) {
            if let Err(e) = fs::remove_file(&done.result_file) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(job = %done.job, error = %e, "could not remove result file");
                }
            }
        }
        Ok(status)
    }

    async fn stop(&self, handle: &InvocationHandle, _dequeue: bool) -> Result<(), AdapterError> {
        let mut inner = self.inner.lock();
        let build = inner
            .builds
            .get_mut(&handle.id)
            .ok_or_else(|| AdapterError::UnknownInvocation(handle.to_string()))?;
        if build.stopped {
            return Ok(());
        }
        build.stopped = true;
        build.child.start_kill()?;
        Ok(())
    }

    async fn create_job(&self, name: &str, template: &str) -> Result<(), AdapterError> {
        fs::create_dir_all(&self.config.script_dir)?;
        fs::write(self.config.script_path(name), template)?;
        Ok(())
    }

    async fn delete_job(&self, name: &str) -> Result<(), AdapterError> {
        let script = self.config.script_path(name);
        match fs::remove_file(&script) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AdapterError::JobNotFound(script.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        }
        match fs::remove_dir_all(self.config.workspace(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
