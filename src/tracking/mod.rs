mod error;
mod file_tracker;
mod tracker;

pub use error::TrackingError;
pub use file_tracker::{ExperimentMeta, FileTracker, RunMeta};
pub use tracker::{ExperimentTracker, NoopTracker, RunStatus};
