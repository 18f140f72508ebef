// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Job flow engine: nested serial and parallel scopes of job invocations,
//! driven by a single polling task.

mod builder;
mod cancel;
pub mod config;
pub mod env;
mod error;
mod flow;
mod report;
mod tree;

#[cfg(test)]
mod test_helpers;

pub use builder::{Invocation, ScopeBuilder, ScopeOptions};
pub use cancel::CancelToken;
pub use config::FlowConfig;
pub use error::{FailedJob, FlowError, FlowFailure};
pub use flow::Flow;
pub use report::{ConsoleCapture, FlowReport, ReportNode, ScopeKind};
