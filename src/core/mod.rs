mod dataset;
mod features;
mod species;

pub use dataset::{Dataset, DatasetError};
pub use features::{FEATURE_NAMES, FeatureVector, NUMBER_OF_FEATURES};
pub use species::Species;
