use std::{sync::Arc, time::Duration};

use crate::infra::artifacts::ArtifactStore;

use super::{source::LogSource, store::LogTaskStore};

pub const LOG_EXPORT_WAIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Shared context passed to export workers so they can reach the task store,
/// the log source and artifact storage.
#[derive(Clone)]
pub struct LogExportContext {
    pub store: Arc<LogTaskStore>,
    pub source: Arc<dyn LogSource>,
    pub artifacts: Arc<ArtifactStore>,
}

impl LogExportContext {
    pub fn new(
        store: Arc<LogTaskStore>,
        source: Arc<dyn LogSource>,
        artifacts: Arc<ArtifactStore>,
    ) -> Self {
        Self {
            store,
            source,
            artifacts,
        }
    }
}
