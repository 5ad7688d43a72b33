//! Test doubles shared by unit and integration tests.

pub mod dummies;
pub mod stubs;

pub use dummies::{reference_features, tiny_dataset};
pub use stubs::{
    FailingClassifier, FixedVotesClassifier, PanickingClassifier, RecordingTracker,
    TrackerEvent, TrackerHandle,
};
