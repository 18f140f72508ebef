// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[test]
fn first_reason_wins() {
    let token = CancelToken::new();
    assert!(!token.is_cancelled());

    token.cancel("SIGTERM");
    token.cancel("SIGINT");

    assert!(token.is_cancelled());
    assert_eq!(token.reason().as_deref(), Some("SIGTERM"));
}

#[test]
fn clones_share_state() {
    let token = CancelToken::new();
    token.clone().cancel("operator");
    assert_eq!(token.reason().as_deref(), Some("operator"));
}

#[tokio::test]
async fn cancelled_returns_immediately_when_already_cancelled() {
    let token = CancelToken::new();
    token.cancel("SIGINT");
    tokio::time::timeout(Duration::from_secs(1), token.cancelled())
        .await
        .unwrap();
}

#[tokio::test]
async fn cancelled_wakes_waiter() {
    let token = CancelToken::new();
    let waiter = {
        let token = token.clone();
        tokio::spawn(async move { token.cancelled().await })
    };
    tokio::task::yield_now().await;

    token.cancel("SIGTERM");

    tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .unwrap()
        .unwrap();
}

#[cfg(unix)]
#[tokio::test]
async fn on_signals_installs_listeners() {
    let token = CancelToken::new();
    let handle = token.on_signals().unwrap();
    assert!(!token.is_cancelled());
    handle.abort();
}
