mod confusion_matrix;
mod estimators;
mod evaluators;
mod measurement;
mod preview;

pub use confusion_matrix::ConfusionMatrix;
pub use estimators::{BasicEstimator, Estimator};
pub use evaluators::{ClassificationEvaluator, PerformanceEvaluator, PerformanceEvaluatorExt};
pub use measurement::Measurement;
pub use preview::{ConfusionPlot, PlotFormat};
