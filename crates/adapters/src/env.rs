// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapters crate.

use std::path::PathBuf;

/// Log directory for locally executed jobs: JF_SCRIPT_LOG_DIR > $TMPDIR/jobflow
pub fn script_log_dir() -> PathBuf {
    std::env::var("JF_SCRIPT_LOG_DIR")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("jobflow"))
}
