//! Common test utilities shared by the integration tests:
//! a relay on an ephemeral port, a scripted stand-in for a UCI engine,
//! a one-route HTTP server for the remote engine and a recording sound sink.

#![allow(dead_code)]

pub mod fake_engine;
pub mod fake_http;
pub mod relay_utils;
pub mod sound;

use std::future::Future;
use std::time::Duration;

/// Poll `condition` every 10ms until it holds or `limit` passes
pub async fn wait_until<F, Fut>(limit: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        if condition().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
