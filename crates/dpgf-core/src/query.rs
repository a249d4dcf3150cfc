//! Per-query display state and retry policy

use std::time::Duration;

use serde::Serialize;

use crate::error::DpgfError;

/// What a view shows for one query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum QueryState<T> {
    Loading,
    Success { data: T },
    Empty { message: String },
    Failed { message: String, retryable: bool },
}

impl<T> QueryState<T> {
    /// Classify a finished query; `is_empty` decides between success and empty
    pub fn from_result(
        result: Result<T, DpgfError>,
        is_empty: impl FnOnce(&T) -> bool,
        empty_message: &str,
    ) -> Self {
        match result {
            Ok(data) if is_empty(&data) => QueryState::Empty {
                message: empty_message.to_string(),
            },
            Ok(data) => QueryState::Success { data },
            Err(err) => QueryState::Failed {
                retryable: err.is_retryable(),
                message: err.to_string(),
            },
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QueryState::Success { data } => Some(data),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryState<U> {
        match self {
            QueryState::Loading => QueryState::Loading,
            QueryState::Success { data } => QueryState::Success { data: f(data) },
            QueryState::Empty { message } => QueryState::Empty { message },
            QueryState::Failed { message, retryable } => QueryState::Failed { message, retryable },
        }
    }
}

/// How often and how long to wait before re-sending a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// Reads: one retry after one second
    pub fn read() -> Self {
        Self {
            max_retries: 1,
            delay: Duration::from_millis(1000),
        }
    }

    /// Mutations are never retried
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }

    /// Whether a failure on attempt `attempt` (0-based) should be retried
    pub fn should_retry(&self, attempt: u32, err: &DpgfError) -> bool {
        attempt < self.max_retries && err.is_retryable()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::read()
    }
}
