pub mod artifact;
pub mod classifiers;
pub mod config;
pub mod core;
pub mod evaluation;
pub mod serving;
pub mod tasks;
pub mod tracking;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;
