mod training;

pub use training::{MODEL_ARTIFACT_PATH, MODEL_FLAVOR, TrainingReport, TrainingTask};
