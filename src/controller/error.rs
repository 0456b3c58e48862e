//! Error types for the cluster controller

use std::time::Duration;

use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// A remote call or its long-running operation failed; `action` names
    /// the step and the affected host/shard.
    #[error("error while {action} for cluster {cluster}: {source}")]
    Operation {
        action: String,
        cluster: String,
        #[source]
        source: ApiError,
    },

    #[error("cluster {0} not found")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("timed out after {after:?} while {action} cluster {cluster}")]
    Timeout {
        action: &'static str,
        cluster: String,
        after: Duration,
    },
}

impl Error {
    /// Closure for `map_err` that wraps an API failure with the step and
    /// cluster it belongs to.
    pub fn operation(
        action: impl Into<String>,
        cluster: impl Into<String>,
    ) -> impl FnOnce(ApiError) -> Error {
        let action = action.into();
        let cluster = cluster.into();
        move |source| Error::Operation {
            action,
            cluster,
            source,
        }
    }

    /// Check if this error is retryable.
    ///
    /// Retry means re-running the whole reconciliation: the diff is
    /// recomputed from fresh state, so a partially-applied topology
    /// converges on the next pass.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Api(e) | Error::Operation { source: e, .. } => e.is_retryable(),
            Error::NotFound(_) => false,
            Error::Validation(_) => false,
            Error::Timeout { .. } => true,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Exponential backoff configuration for callers that re-run reconciliation
#[derive(Clone, Debug)]
pub struct BackoffConfig {
    /// Initial delay for first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for each subsequent retry
    pub multiplier: f64,
    /// Random jitter factor (0.0 to 1.0)
    pub jitter: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(300),
            multiplier: 2.0,
            jitter: 0.1,
        }
    }
}

impl BackoffConfig {
    /// Calculate the backoff delay for a given retry attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_delay_secs =
            self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);

        let jitter_range = base_delay_secs * self.jitter;
        let jitter = rand::random::<f64>() * jitter_range * 2.0 - jitter_range;
        let delay_with_jitter = (base_delay_secs + jitter).max(0.0);

        let capped_delay = delay_with_jitter.min(self.max_delay.as_secs_f64());

        Duration::from_secs_f64(capped_delay)
    }

    /// Get the delay for an error, with non-retryable errors pushed out to
    /// the maximum so an operator can intervene
    pub fn delay_for_error(&self, error: &Error, attempt: u32) -> Duration {
        if error.is_retryable() {
            self.delay_for_attempt(attempt)
        } else {
            self.max_delay
        }
    }
}
