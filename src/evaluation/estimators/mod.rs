mod basic_estimator;
mod estimator;

pub use basic_estimator::BasicEstimator;
pub use estimator::Estimator;
