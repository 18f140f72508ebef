// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Job system adapters for the jobflow engine

mod env;
pub mod jobs;
pub mod subprocess;
pub mod traced;

pub use jobs::{
    AdapterError, InvocationHandle, JobRef, JobSystem, ScriptConfig, ScriptJobSystem,
};
pub use traced::TracedJobSystem;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use jobs::{FakeJob, FakeJobSystem, JobCall};
