mod datasets;

pub use datasets::{reference_features, tiny_dataset};
