use crate::classifiers::InferenceError;

/// A fitted model that maps one feature vector to a class label.
///
/// Implementations are immutable once built and are shared across request
/// handlers, hence the `Send + Sync` bound.
pub trait Classifier: Send + Sync {
    /// Length of the feature vectors the model accepts.
    fn number_of_features(&self) -> usize;

    fn number_of_classes(&self) -> usize;

    /// Per-class scores, indexed by class label.
    fn get_votes_for_features(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError>;

    /// Label with the highest finite vote.
    fn classify(&self, features: &[f64]) -> Result<usize, InferenceError> {
        let votes = self.get_votes_for_features(features)?;
        argmax(&votes).ok_or(InferenceError::NoFiniteVote)
    }
}

/// Index of the largest finite value; ties go to the lowest index.
#[inline]
pub fn argmax(v: &[f64]) -> Option<usize> {
    let mut best = None;
    let mut best_value = f64::NEG_INFINITY;
    for (i, &x) in v.iter().enumerate() {
        if !x.is_finite() {
            continue;
        }
        if best.is_none() || x > best_value {
            best = Some(i);
            best_value = x;
        }
    }
    best
}
