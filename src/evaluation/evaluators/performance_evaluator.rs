use crate::evaluation::Measurement;

/// Accumulates predictions against ground truth and reports metrics.
pub trait PerformanceEvaluator {
    /// Clears every accumulated count.
    fn reset(&mut self);

    /// Feeds one labelled example and the model's votes (one score per
    /// class label). Updates with no finite vote are skipped.
    fn add_result(&mut self, true_class: usize, class_votes: &[f64]);

    fn performance(&self) -> Vec<Measurement>;
}

pub trait PerformanceEvaluatorExt {
    fn metric(&self, name: &str) -> Option<f64>;
}

impl<T: PerformanceEvaluator + ?Sized> PerformanceEvaluatorExt for T {
    fn metric(&self, name: &str) -> Option<f64> {
        self.performance()
            .into_iter()
            .find(|m| m.name == name)
            .map(|m| m.value)
    }
}
