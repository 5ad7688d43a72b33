mod classifier;
mod error;
mod logistic_regression;

pub use classifier::{Classifier, argmax};
pub use error::{InferenceError, TrainingError};
pub use logistic_regression::{LogisticRegressionClassifier, LogisticRegressionParams};
