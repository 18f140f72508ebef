// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jf-core: job status model, clocks and secret redaction shared by the
//! jobflow adapters and engine.

pub mod clock;
pub mod job;
pub mod redact;
pub mod status;
pub mod time_fmt;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{AcceleratedClock, Clock, FakeClock, SystemClock, SPEEDUP_RANGE};
pub use job::{InvocationRecord, JobSpec, Params};
pub use redact::{RedactError, SecretRedactor, MASK};
pub use status::{BuildResult, BuildStatus, Progress};
pub use time_fmt::format_duration;
