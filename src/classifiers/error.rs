use thiserror::Error;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("expected {expected} features, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("model produced no finite class score")]
    NoFiniteVote,

    #[error("model backend failure: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("cannot fit on an empty training set")]
    EmptyTrainingSet,

    #[error("training set has a single class ({0}); at least two are required")]
    SingleClass(usize),

    #[error("invalid hyperparameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    #[error("logistic regression failed to fit: {0}")]
    Fit(String),
}
