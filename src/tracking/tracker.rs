use std::path::Path;

use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::tracking::TrackingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
}

/// Write-only sink for the metadata of training runs.
///
/// At most one run is active at a time. Every `log_*` call requires an
/// active run and fails with [`TrackingError::NoActiveRun`] otherwise.
pub trait ExperimentTracker {
    /// Opens a run and returns its id.
    fn start_run(&mut self) -> Result<String, TrackingError>;

    fn log_param(&mut self, key: &str, value: &str) -> Result<(), TrackingError>;

    fn log_metric(&mut self, key: &str, value: f64) -> Result<(), TrackingError>;

    /// Copies a local file into the run's artifacts.
    fn log_artifact(&mut self, local_path: &Path) -> Result<(), TrackingError>;

    /// Stores a serialized model under `artifact_path` inside the run.
    fn log_model(
        &mut self,
        artifact_path: &str,
        flavor: &str,
        model_bytes: &[u8],
    ) -> Result<(), TrackingError>;

    fn end_run(&mut self, status: RunStatus) -> Result<(), TrackingError>;

    fn active_run_id(&self) -> Option<&str>;
}

/// Accepts every call and records nothing.
#[derive(Debug, Default)]
pub struct NoopTracker {
    active: Option<String>,
}

impl ExperimentTracker for NoopTracker {
    fn start_run(&mut self) -> Result<String, TrackingError> {
        if let Some(id) = &self.active {
            return Err(TrackingError::RunAlreadyActive(id.clone()));
        }
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.active = Some(id.clone());
        Ok(id)
    }

    fn log_param(&mut self, _key: &str, _value: &str) -> Result<(), TrackingError> {
        Ok(())
    }

    fn log_metric(&mut self, _key: &str, _value: f64) -> Result<(), TrackingError> {
        Ok(())
    }

    fn log_artifact(&mut self, _local_path: &Path) -> Result<(), TrackingError> {
        Ok(())
    }

    fn log_model(&mut self, _: &str, _: &str, _: &[u8]) -> Result<(), TrackingError> {
        Ok(())
    }

    fn end_run(&mut self, _status: RunStatus) -> Result<(), TrackingError> {
        self.active.take().map(|_| ()).ok_or(TrackingError::NoActiveRun)
    }

    fn active_run_id(&self) -> Option<&str> {
        self.active.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_names_are_upper_case() {
        assert_eq!(RunStatus::Finished.to_string(), "FINISHED");
        assert_eq!(
            serde_json::to_string(&RunStatus::Failed).unwrap(),
            "\"FAILED\""
        );
    }

    #[test]
    fn noop_tracker_enforces_single_active_run() {
        let mut t = NoopTracker::default();
        let id = t.start_run().unwrap();
        assert_eq!(t.active_run_id(), Some(id.as_str()));
        assert!(matches!(t.start_run(), Err(TrackingError::RunAlreadyActive(_))));
        t.end_run(RunStatus::Finished).unwrap();
        assert!(matches!(
            t.end_run(RunStatus::Finished),
            Err(TrackingError::NoActiveRun)
        ));
    }
}
