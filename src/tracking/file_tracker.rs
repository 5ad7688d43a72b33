use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::tracking::{ExperimentTracker, RunStatus, TrackingError};

const META_FILE: &str = "meta.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentMeta {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub run_id: String,
    pub experiment: String,
    pub status: RunStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct ModelMeta<'a> {
    run_id: &'a str,
    artifact_path: &'a str,
    flavor: &'a str,
    model_file: &'a str,
    size_bytes: usize,
    saved_at: DateTime<Utc>,
}

struct ActiveRun {
    dir: PathBuf,
    meta: RunMeta,
    steps: HashMap<String, u64>,
}

/// Local tracking store.
///
/// Layout under `root`:
///
/// ```text
/// <experiment>/meta.json
/// <experiment>/<run_id>/meta.json
/// <experiment>/<run_id>/params/<key>
/// <experiment>/<run_id>/metrics/<key>      "<epoch_ms> <value> <step>" per line
/// <experiment>/<run_id>/artifacts/...
/// ```
pub struct FileTracker {
    root: PathBuf,
    experiment: String,
    active: Option<ActiveRun>,
}

impl FileTracker {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(root: P, experiment: S) -> Self {
        Self {
            root: root.into(),
            experiment: experiment.into(),
            active: None,
        }
    }

    pub fn experiment_dir(&self) -> PathBuf {
        self.root.join(&self.experiment)
    }

    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.experiment_dir().join(run_id)
    }

    pub fn read_run_meta(&self, run_id: &str) -> Result<RunMeta, TrackingError> {
        let path = self.run_dir(run_id).join(META_FILE);
        let text = fs::read_to_string(&path).map_err(|e| TrackingError::io(&path, e))?;
        Ok(serde_json::from_str(&text)?)
    }

    fn active_mut(&mut self) -> Result<&mut ActiveRun, TrackingError> {
        self.active.as_mut().ok_or(TrackingError::NoActiveRun)
    }

    fn ensure_experiment(&self) -> Result<(), TrackingError> {
        let dir = self.experiment_dir();
        create_dir(&dir)?;
        let meta_path = dir.join(META_FILE);
        if !meta_path.exists() {
            let meta = ExperimentMeta {
                name: self.experiment.clone(),
                created_at: Utc::now(),
            };
            write_json(&meta_path, &meta)?;
            info!(experiment = %self.experiment, "created experiment");
        }
        Ok(())
    }
}

impl ExperimentTracker for FileTracker {
    fn start_run(&mut self) -> Result<String, TrackingError> {
        if let Some(run) = &self.active {
            return Err(TrackingError::RunAlreadyActive(run.meta.run_id.clone()));
        }
        validate_key(&self.experiment)?;
        self.ensure_experiment()?;

        let run_id = uuid::Uuid::new_v4().simple().to_string();
        let dir = self.run_dir(&run_id);
        for sub in ["params", "metrics", "artifacts"] {
            create_dir(&dir.join(sub))?;
        }

        let meta = RunMeta {
            run_id: run_id.clone(),
            experiment: self.experiment.clone(),
            status: RunStatus::Running,
            start_time: Utc::now(),
            end_time: None,
        };
        write_json(&dir.join(META_FILE), &meta)?;
        info!(run_id = %run_id, experiment = %self.experiment, "started tracking run");

        self.active = Some(ActiveRun {
            dir,
            meta,
            steps: HashMap::new(),
        });
        Ok(run_id)
    }

    fn log_param(&mut self, key: &str, value: &str) -> Result<(), TrackingError> {
        validate_key(key)?;
        let run = self.active_mut()?;
        let path = run.dir.join("params").join(key);
        create_parent(&path)?;
        fs::write(&path, value).map_err(|e| TrackingError::io(&path, e))
    }

    fn log_metric(&mut self, key: &str, value: f64) -> Result<(), TrackingError> {
        validate_key(key)?;
        let run = self.active_mut()?;
        let step = run.steps.entry(key.to_string()).or_insert(0);
        let path = run.dir.join("metrics").join(key);
        create_parent(&path)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| TrackingError::io(&path, e))?;
        writeln!(file, "{} {} {}", Utc::now().timestamp_millis(), value, step)
            .map_err(|e| TrackingError::io(&path, e))?;
        *step += 1;
        debug!(metric = key, value, "logged metric");
        Ok(())
    }

    fn log_artifact(&mut self, local_path: &Path) -> Result<(), TrackingError> {
        let file_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| TrackingError::InvalidKey(local_path.display().to_string()))?
            .to_string();
        let run = self.active_mut()?;
        let dest = run.dir.join("artifacts").join(&file_name);
        fs::copy(local_path, &dest).map_err(|e| TrackingError::io(local_path, e))?;
        debug!(artifact = %file_name, "logged artifact");
        Ok(())
    }

    fn log_model(
        &mut self,
        artifact_path: &str,
        flavor: &str,
        model_bytes: &[u8],
    ) -> Result<(), TrackingError> {
        validate_key(artifact_path)?;
        let run = self.active_mut()?;
        let dir = run.dir.join("artifacts").join(artifact_path);
        create_dir(&dir)?;

        let model_file = "model.bin";
        let path = dir.join(model_file);
        fs::write(&path, model_bytes).map_err(|e| TrackingError::io(&path, e))?;

        let meta = ModelMeta {
            run_id: &run.meta.run_id,
            artifact_path,
            flavor,
            model_file,
            size_bytes: model_bytes.len(),
            saved_at: Utc::now(),
        };
        write_json(&dir.join("MLmodel.json"), &meta)?;
        debug!(artifact_path, flavor, "logged model");
        Ok(())
    }

    fn end_run(&mut self, status: RunStatus) -> Result<(), TrackingError> {
        let mut run = self.active.take().ok_or(TrackingError::NoActiveRun)?;
        run.meta.status = status;
        run.meta.end_time = Some(Utc::now());
        write_json(&run.dir.join(META_FILE), &run.meta)?;
        info!(run_id = %run.meta.run_id, %status, "ended tracking run");
        Ok(())
    }

    fn active_run_id(&self) -> Option<&str> {
        self.active.as_ref().map(|r| r.meta.run_id.as_str())
    }
}

/// Keys become file names: non-empty, at most 250 chars, made of
/// alphanumerics, `_`, `-`, `.` and `/`, and never escaping their directory.
fn validate_key(key: &str) -> Result<(), TrackingError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/');
    let escapes = key.starts_with('/') || key.split('/').any(|part| part.is_empty() || part == "..");
    if key.is_empty() || key.len() > 250 || !key.chars().all(allowed) || escapes {
        return Err(TrackingError::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn create_dir(path: &Path) -> Result<(), TrackingError> {
    fs::create_dir_all(path).map_err(|e| TrackingError::io(path, e))
}

fn create_parent(path: &Path) -> Result<(), TrackingError> {
    match path.parent() {
        Some(parent) => create_dir(parent),
        None => Ok(()),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), TrackingError> {
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text).map_err(|e| TrackingError::io(path, e))
}
