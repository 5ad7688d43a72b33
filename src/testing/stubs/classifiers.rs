use crate::classifiers::{Classifier, InferenceError};
use crate::core::NUMBER_OF_FEATURES;

/// Returns the same votes for every input.
pub struct FixedVotesClassifier {
    votes: Vec<f64>,
}

impl FixedVotesClassifier {
    pub fn new(votes: Vec<f64>) -> Self {
        Self { votes }
    }

    /// Always predicts `label` out of three classes.
    pub fn predicting(label: usize) -> Self {
        let mut votes = vec![0.0; 3.max(label + 1)];
        votes[label] = 1.0;
        Self { votes }
    }
}

impl Classifier for FixedVotesClassifier {
    fn number_of_features(&self) -> usize {
        NUMBER_OF_FEATURES
    }

    fn number_of_classes(&self) -> usize {
        self.votes.len()
    }

    fn get_votes_for_features(&self, _features: &[f64]) -> Result<Vec<f64>, InferenceError> {
        Ok(self.votes.clone())
    }
}

/// Fails every inference with a backend error.
#[derive(Default)]
pub struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn number_of_features(&self) -> usize {
        NUMBER_OF_FEATURES
    }

    fn number_of_classes(&self) -> usize {
        3
    }

    fn get_votes_for_features(&self, _features: &[f64]) -> Result<Vec<f64>, InferenceError> {
        Err(InferenceError::Backend("weights are corrupted".into()))
    }
}

/// Panics on every inference.
#[derive(Default)]
pub struct PanickingClassifier;

impl Classifier for PanickingClassifier {
    fn number_of_features(&self) -> usize {
        NUMBER_OF_FEATURES
    }

    fn number_of_classes(&self) -> usize {
        3
    }

    fn get_votes_for_features(&self, _features: &[f64]) -> Result<Vec<f64>, InferenceError> {
        panic!("model exploded")
    }
}
