use std::path::PathBuf;

use anyhow::{Context, Result};
use strum::{EnumCount, IntoEnumIterator};
use tracing::{debug, info, warn};

use crate::artifact::{encode_model, save_model};
use crate::classifiers::{Classifier, LogisticRegressionClassifier};
use crate::config::{PathsConfig, TrainingConfig};
use crate::core::{Dataset, Species};
use crate::evaluation::{
    BasicEstimator, ClassificationEvaluator, ConfusionMatrix, ConfusionPlot, Measurement,
    PerformanceEvaluator, PlotFormat,
};
use crate::tracking::{ExperimentTracker, RunStatus};

/// Artifact path the fitted model is logged under inside a run.
pub const MODEL_ARTIFACT_PATH: &str = "model";
pub const MODEL_FLAVOR: &str = "linfa-logistic";

/// Outcome of one training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub run_id: String,
    pub accuracy: f64,
    pub measurements: Vec<Measurement>,
    pub confusion_matrix: ConfusionMatrix,
    pub train_size: usize,
    pub test_size: usize,
    pub model_path: PathBuf,
    pub confusion_matrix_path: PathBuf,
}

/// Split, fit, evaluate, record and persist, inside a single tracking run.
///
/// The run is closed as `FINISHED` on success and `FAILED` when any step
/// errors; the error is returned unchanged.
pub struct TrainingTask {
    paths: PathsConfig,
    training: TrainingConfig,
    tracker: Box<dyn ExperimentTracker>,
    dataset: Option<Dataset>,
}

impl TrainingTask {
    pub fn new(
        paths: PathsConfig,
        training: TrainingConfig,
        tracker: Box<dyn ExperimentTracker>,
    ) -> Self {
        Self {
            paths,
            training,
            tracker,
            dataset: None,
        }
    }

    /// Trains on `dataset` instead of the bundled Iris data.
    pub fn with_dataset(mut self, dataset: Dataset) -> Self {
        self.dataset = Some(dataset);
        self
    }

    pub fn run(&mut self) -> Result<TrainingReport> {
        let dataset = match &self.dataset {
            Some(d) => d.clone(),
            None => Dataset::bundled_iris().context("loading bundled Iris dataset")?,
        };

        let run_id = self
            .tracker
            .start_run()
            .context("starting tracking run")?;
        info!(run_id = %run_id, experiment = %self.training.experiment_name, "training run started");

        match self.run_inner(&run_id, &dataset) {
            Ok(report) => {
                self.tracker
                    .end_run(RunStatus::Finished)
                    .context("closing tracking run")?;
                info!(
                    "Model saved to {}, accuracy = {:.4}",
                    report.model_path.display(),
                    report.accuracy
                );
                Ok(report)
            }
            Err(e) => {
                if let Err(end_err) = self.tracker.end_run(RunStatus::Failed) {
                    warn!(run_id = %run_id, error = %end_err, "could not mark run as failed");
                }
                Err(e)
            }
        }
    }

    fn run_inner(&mut self, run_id: &str, dataset: &Dataset) -> Result<TrainingReport> {
        let cfg = &self.training;
        let (train, test) = dataset
            .stratified_split(cfg.test_size, cfg.seed)
            .context("splitting dataset")?;
        debug!(
            train = ?train.class_counts(),
            test = ?test.class_counts(),
            "dataset split per class"
        );

        let params = cfg.model_params();
        let model = LogisticRegressionClassifier::fit(&train, &params)
            .context("fitting logistic regression")?;

        let mut evaluator = ClassificationEvaluator::<BasicEstimator>::new(Species::COUNT);
        for (record, label) in test.iter() {
            let votes = model
                .get_votes_for_features(&record.to_array())
                .context("scoring test partition")?;
            evaluator.add_result(label, &votes);
        }
        let measurements = evaluator.performance();
        let accuracy = measurements
            .iter()
            .find(|m| m.name == "accuracy")
            .map(|m| m.value)
            .unwrap_or(f64::NAN);
        debug!(instances = evaluator.instances_seen(), "test partition scored");
        for m in &measurements {
            debug!(%m, "evaluation");
        }

        let labels: Vec<String> = Species::iter().map(|s| s.to_string()).collect();
        let plot_path = &self.paths.confusion_matrix_path;
        ConfusionPlot::new(evaluator.confusion_matrix(), &labels)
            .export(plot_path, PlotFormat::from_path(plot_path))
            .with_context(|| format!("writing confusion matrix to {}", plot_path.display()))?;

        let tracker = &mut self.tracker;
        for (key, value) in [
            ("test_size", cfg.test_size.to_string()),
            ("seed", cfg.seed.to_string()),
            ("max_iterations", params.max_iterations.to_string()),
            ("alpha", params.alpha.to_string()),
            ("train_size", train.len().to_string()),
            ("test_rows", test.len().to_string()),
        ] {
            tracker
                .log_param(key, &value)
                .with_context(|| format!("logging param {key}"))?;
        }
        for m in &measurements {
            tracker
                .log_metric(&m.name, m.value)
                .with_context(|| format!("logging metric {}", m.name))?;
        }
        tracker
            .log_artifact(plot_path)
            .context("logging confusion matrix artifact")?;
        let bytes = encode_model(&model)?;
        tracker
            .log_model(MODEL_ARTIFACT_PATH, MODEL_FLAVOR, &bytes)
            .context("logging model")?;

        save_model(&model, &self.paths.model_path)?;

        Ok(TrainingReport {
            run_id: run_id.to_string(),
            accuracy,
            measurements,
            confusion_matrix: evaluator.confusion_matrix().clone(),
            train_size: train.len(),
            test_size: test.len(),
            model_path: self.paths.model_path.clone(),
            confusion_matrix_path: plot_path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::load_model;
    use crate::testing::{RecordingTracker, TrackerEvent, reference_features, tiny_dataset};
    use tempfile::tempdir;

    fn paths_in(dir: &std::path::Path) -> PathsConfig {
        PathsConfig {
            model_path: dir.join("artifacts/model.bin"),
            confusion_matrix_path: dir.join("confusion_matrix.svg"),
        }
    }

    #[test]
    fn trains_on_bundled_iris_and_persists_model() {
        let dir = tempdir().unwrap();
        let (tracker, handle) = RecordingTracker::new();
        let mut task =
            TrainingTask::new(paths_in(dir.path()), TrainingConfig::default(), Box::new(tracker));

        let report = task.run().unwrap();
        assert_eq!(report.train_size, 120);
        assert_eq!(report.test_size, 30);
        assert!(report.accuracy >= 0.9, "accuracy {}", report.accuracy);
        assert_eq!(report.confusion_matrix.total(), 30);

        let model = load_model(&report.model_path).unwrap();
        for (features, expected) in reference_features() {
            assert_eq!(model.classify(&features.to_array()).unwrap(), expected);
        }

        let svg = std::fs::read_to_string(&report.confusion_matrix_path).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("versicolor"));

        let events = handle.events();
        assert_eq!(events.first(), Some(&TrackerEvent::Started("run-0".into())));
        assert_eq!(handle.final_status(), Some(RunStatus::Finished));
        assert_eq!(handle.param("seed").as_deref(), Some("42"));
        assert_eq!(handle.param("test_size").as_deref(), Some("0.2"));
        assert_eq!(handle.metric("accuracy"), Some(report.accuracy));
        assert!(handle.metric("kappa").is_some());
        assert!(events.iter().any(|e| matches!(
            e,
            TrackerEvent::Model { artifact_path, flavor, size }
                if artifact_path == "model" && flavor == MODEL_FLAVOR && *size > 0
        )));
        assert!(
            events
                .iter()
                .any(|e| *e == TrackerEvent::Artifact(report.confusion_matrix_path.clone()))
        );
    }

    #[test]
    fn same_seed_gives_same_evaluation() {
        let dir = tempdir().unwrap();
        let run = || {
            let (tracker, _) = RecordingTracker::new();
            TrainingTask::new(paths_in(dir.path()), TrainingConfig::default(), Box::new(tracker))
                .run()
                .unwrap()
        };
        let a = run();
        let b = run();
        assert_eq!(a.accuracy, b.accuracy);
        assert_eq!(a.confusion_matrix, b.confusion_matrix);
    }

    #[test]
    fn custom_dataset_is_used() {
        let dir = tempdir().unwrap();
        let (tracker, handle) = RecordingTracker::new();
        let training = TrainingConfig {
            test_size: 0.25,
            ..TrainingConfig::default()
        };
        let report = TrainingTask::new(paths_in(dir.path()), training, Box::new(tracker))
            .with_dataset(tiny_dataset())
            .run()
            .unwrap();
        assert_eq!(report.train_size, 9);
        assert_eq!(report.test_size, 3);
        assert_eq!(handle.param("test_rows").as_deref(), Some("3"));
    }

    #[test]
    fn tracker_failure_marks_run_failed_and_skips_save() {
        let dir = tempdir().unwrap();
        let paths = paths_in(dir.path());
        let (tracker, handle) = RecordingTracker::failing_on_artifact();
        let err = TrainingTask::new(paths.clone(), TrainingConfig::default(), Box::new(tracker))
            .run()
            .unwrap_err();
        assert!(format!("{err:#}").contains("tracking store unreachable"));
        assert_eq!(handle.final_status(), Some(RunStatus::Failed));
        assert!(!paths.model_path.exists());
    }

    #[test]
    fn invalid_split_fails_the_run() {
        let dir = tempdir().unwrap();
        let (tracker, handle) = RecordingTracker::new();
        let training = TrainingConfig {
            test_size: 1.5,
            ..TrainingConfig::default()
        };
        let err = TrainingTask::new(paths_in(dir.path()), training, Box::new(tracker))
            .run()
            .unwrap_err();
        assert!(format!("{err:#}").contains("splitting dataset"));
        assert_eq!(handle.final_status(), Some(RunStatus::Failed));
    }
}
