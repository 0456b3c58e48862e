use std::sync::Arc;
use std::time::Duration;

use crate::api::ClusterApi;

/// Per-phase deadlines, enforced around each lifecycle operation.
///
/// A timeout mid-sequence leaves the topology partially converged; the next
/// invocation reads fresh state and picks up the remainder.
#[derive(Clone, Debug)]
pub struct Timeouts {
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: Duration::from_secs(15 * 60),
            update: Duration::from_secs(60 * 60),
            delete: Duration::from_secs(15 * 60),
        }
    }
}

/// Shared context for the controller.
///
/// Carries the API client and settings explicitly; there is no global
/// configuration object.
#[derive(Clone)]
pub struct Context {
    /// Managed Redis API client
    pub api: Arc<dyn ClusterApi>,
    /// Folder to create clusters in when the spec names none
    pub default_folder_id: Option<String>,
    pub timeouts: Timeouts,
}

impl Context {
    pub fn new(api: Arc<dyn ClusterApi>) -> Self {
        Self {
            api,
            default_folder_id: None,
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_default_folder(mut self, folder_id: impl Into<String>) -> Self {
        self.default_folder_id = Some(folder_id.into());
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}
