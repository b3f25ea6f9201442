//! Task polling
//!
//! Mutating calls return a task tag; the cluster finishes the work
//! asynchronously and reports progress under `TaskTag/{tag}`.
//!
//! [`wait_for_task_with`] polls at a fixed interval. A poll is only issued
//! while a full interval still fits before the deadline, so a 5s timeout with
//! a 2s interval polls exactly twice (t=0, t=2) before giving up. Once no
//! further poll fits, the wait sleeps only until the deadline, never past it.

use super::client::{HyperCoreClient, MIN_POLL_INTERVAL};
use super::error::{Error, Result};
use super::http::segment;
use super::session::Session;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

/// Opaque identifier of an asynchronous cluster task
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskTag(pub String);

impl TaskTag {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the `taskTag` of a mutation response, if any
pub fn task_tag_from(response: &Value) -> Option<TaskTag> {
    let tag = response.get("taskTag")?;
    let tag = match tag {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    Some(TaskTag(tag))
}

/// Observed state of a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    /// Any non-terminal state (QUEUED, RUNNING, ...), kept verbatim
    Pending(String),
    Complete,
    Error,
}

impl TaskState {
    pub fn parse(state: &str) -> Self {
        match state {
            "COMPLETE" => Self::Complete,
            "ERROR" => Self::Error,
            other => Self::Pending(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

/// Time source for polling loops
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Wall clock backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// Fetch the current state of a task
pub async fn task_state(
    client: &HyperCoreClient,
    session: &Session,
    tag: &TaskTag,
) -> Result<TaskState> {
    let response = client
        .http
        .get(&format!("TaskTag/{}", segment(tag.as_str())), session)
        .await?;

    let entry = match &response {
        Value::Array(items) => items.first(),
        Value::Object(_) => Some(&response),
        _ => None,
    }
    .ok_or_else(|| Error::NotFound(format!("task {}", tag)))?;

    let state = entry
        .get("state")
        .and_then(|v| v.as_str())
        .unwrap_or("UNKNOWN");

    Ok(TaskState::parse(state))
}

/// Wait for a task using the client's poll interval and the tokio clock
///
/// `Ok(true)` on COMPLETE, `Ok(false)` on ERROR, [`Error::Timeout`] otherwise.
pub async fn wait_for_task(
    client: &HyperCoreClient,
    session: &Session,
    tag: &TaskTag,
    timeout: Duration,
) -> Result<bool> {
    let interval = client.config.poll_interval;
    wait_for_task_with(client, session, tag, timeout, interval, &TokioClock).await
}

/// Wait for a task with an explicit interval and clock
pub async fn wait_for_task_with<C: Clock>(
    client: &HyperCoreClient,
    session: &Session,
    tag: &TaskTag,
    timeout: Duration,
    interval: Duration,
    clock: &C,
) -> Result<bool> {
    let interval = interval.max(MIN_POLL_INTERVAL);
    let deadline = clock.now() + timeout;
    let mut polls = 0u32;

    loop {
        let state = task_state(client, session, tag).await?;
        polls += 1;

        match state {
            TaskState::Complete => {
                tracing::info!("Task {} complete after {} polls", tag, polls);
                return Ok(true);
            }
            TaskState::Error => {
                tracing::warn!("Task {} failed", tag);
                return Ok(false);
            }
            TaskState::Pending(state) => {
                tracing::debug!("Task {} is {}", tag, state);
            }
        }

        let now = clock.now();
        if now + interval + interval > deadline {
            let remaining = deadline.saturating_duration_since(now);
            if !remaining.is_zero() {
                clock.sleep(remaining).await;
            }
            tracing::warn!("Task {} still pending after {} polls", tag, polls);
            return Err(Error::Timeout {
                tag: tag.to_string(),
                timeout,
            });
        }

        clock.sleep(interval).await;
    }
}
