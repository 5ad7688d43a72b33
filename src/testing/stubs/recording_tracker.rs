use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::tracking::{ExperimentTracker, RunStatus, TrackingError};

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    Started(String),
    Param(String, String),
    Metric(String, f64),
    Artifact(PathBuf),
    Model {
        artifact_path: String,
        flavor: String,
        size: usize,
    },
    Ended(RunStatus),
}

/// Records every call; can be told to fail on `log_artifact`.
pub struct RecordingTracker {
    events: Arc<Mutex<Vec<TrackerEvent>>>,
    active: Option<String>,
    fail_on_artifact: bool,
}

#[derive(Clone)]
pub struct TrackerHandle(Arc<Mutex<Vec<TrackerEvent>>>);

impl TrackerHandle {
    pub fn events(&self) -> Vec<TrackerEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.events().into_iter().find_map(|e| match e {
            TrackerEvent::Metric(k, v) if k == name => Some(v),
            _ => None,
        })
    }

    pub fn param(&self, name: &str) -> Option<String> {
        self.events().into_iter().find_map(|e| match e {
            TrackerEvent::Param(k, v) if k == name => Some(v),
            _ => None,
        })
    }

    pub fn final_status(&self) -> Option<RunStatus> {
        self.events().into_iter().rev().find_map(|e| match e {
            TrackerEvent::Ended(s) => Some(s),
            _ => None,
        })
    }
}

impl RecordingTracker {
    pub fn new() -> (Self, TrackerHandle) {
        let events = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                events: Arc::clone(&events),
                active: None,
                fail_on_artifact: false,
            },
            TrackerHandle(events),
        )
    }

    pub fn failing_on_artifact() -> (Self, TrackerHandle) {
        let (mut t, h) = Self::new();
        t.fail_on_artifact = true;
        (t, h)
    }

    fn push(&self, e: TrackerEvent) {
        self.events.lock().unwrap().push(e);
    }

    fn require_run(&self) -> Result<(), TrackingError> {
        self.active.as_ref().map(|_| ()).ok_or(TrackingError::NoActiveRun)
    }
}

impl ExperimentTracker for RecordingTracker {
    fn start_run(&mut self) -> Result<String, TrackingError> {
        if let Some(id) = &self.active {
            return Err(TrackingError::RunAlreadyActive(id.clone()));
        }
        let id = "run-0".to_string();
        self.active = Some(id.clone());
        self.push(TrackerEvent::Started(id.clone()));
        Ok(id)
    }

    fn log_param(&mut self, key: &str, value: &str) -> Result<(), TrackingError> {
        self.require_run()?;
        self.push(TrackerEvent::Param(key.into(), value.into()));
        Ok(())
    }

    fn log_metric(&mut self, key: &str, value: f64) -> Result<(), TrackingError> {
        self.require_run()?;
        self.push(TrackerEvent::Metric(key.into(), value));
        Ok(())
    }

    fn log_artifact(&mut self, local_path: &Path) -> Result<(), TrackingError> {
        self.require_run()?;
        if self.fail_on_artifact {
            return Err(TrackingError::io(
                local_path,
                std::io::Error::other("tracking store unreachable"),
            ));
        }
        self.push(TrackerEvent::Artifact(local_path.to_path_buf()));
        Ok(())
    }

    fn log_model(
        &mut self,
        artifact_path: &str,
        flavor: &str,
        model_bytes: &[u8],
    ) -> Result<(), TrackingError> {
        self.require_run()?;
        self.push(TrackerEvent::Model {
            artifact_path: artifact_path.into(),
            flavor: flavor.into(),
            size: model_bytes.len(),
        });
        Ok(())
    }

    fn end_run(&mut self, status: RunStatus) -> Result<(), TrackingError> {
        self.active.take().ok_or(TrackingError::NoActiveRun)?;
        self.push(TrackerEvent::Ended(status));
        Ok(())
    }

    fn active_run_id(&self) -> Option<&str> {
        self.active.as_deref()
    }
}
