// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{BuildResult, InvocationRecord, Params, Progress};

/// Build a parameter map from literal pairs.
pub fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// A finished, invoked record.
pub fn finished_record(name: &str, checked: bool, result: BuildResult) -> InvocationRecord {
    let mut rec = InvocationRecord::new(name, checked, Params::new());
    rec.ordinal = Some(1);
    rec.build_number = Some(1);
    rec.result = result;
    rec.progress = Progress::Idle;
    rec.finished_at_ms = Some(1_000_000);
    rec
}
