mod classifiers;
mod recording_tracker;

pub use classifiers::{FailingClassifier, FixedVotesClassifier, PanickingClassifier};
pub use recording_tracker::{RecordingTracker, TrackerEvent, TrackerHandle};
