use crate::classifiers::argmax;
use crate::evaluation::{ConfusionMatrix, Estimator, Measurement, PerformanceEvaluator};

/// Batch classification evaluator.
///
/// Tracks:
/// - accuracy;
/// - marginals of true and predicted classes for Cohen's κ;
/// - per-class precision and recall, macro-averaged in `performance()`
///   together with the macro F1;
/// - the full confusion matrix.
///
/// Classes are discovered from the labels and vote vectors, so the table
/// widens when a larger label shows up.
pub struct ClassificationEvaluator<E: Estimator + Default> {
    correct: E,
    true_marginals: Vec<E>,
    predicted_marginals: Vec<E>,
    precision: Vec<E>,
    recall: Vec<E>,
    num_classes: usize,
    confusion: ConfusionMatrix,
}

impl<E: Estimator + Default> ClassificationEvaluator<E> {
    pub fn new(num_classes: usize) -> Self {
        let make_vec = || (0..num_classes).map(|_| E::default()).collect::<Vec<_>>();
        Self {
            correct: E::default(),
            true_marginals: make_vec(),
            predicted_marginals: make_vec(),
            precision: make_vec(),
            recall: make_vec(),
            num_classes,
            confusion: ConfusionMatrix::new(num_classes),
        }
    }

    pub fn confusion_matrix(&self) -> &ConfusionMatrix {
        &self.confusion
    }

    pub fn instances_seen(&self) -> u64 {
        self.correct.count()
    }

    #[inline]
    fn ensure_classes(&mut self, k: usize) {
        if k <= self.num_classes {
            return;
        }
        let add = k - self.num_classes;
        self.true_marginals.extend((0..add).map(|_| E::default()));
        self.predicted_marginals.extend((0..add).map(|_| E::default()));
        self.precision.extend((0..add).map(|_| E::default()));
        self.recall.extend((0..add).map(|_| E::default()));
        self.confusion.grow(k);
        self.num_classes = k;
    }

    fn kappa(&self) -> f64 {
        let p_o = self.correct.estimation();
        let mut p_e = 0.0;
        for c in 0..self.num_classes {
            let pt = self.true_marginals[c].estimation();
            let pp = self.predicted_marginals[c].estimation();
            if pt.is_finite() && pp.is_finite() {
                p_e += pt * pp;
            }
        }
        let denom = 1.0 - p_e;
        if denom.abs() > f64::EPSILON {
            (p_o - p_e) / denom
        } else {
            f64::NAN
        }
    }

    fn macro_average(estimators: &[E]) -> f64 {
        let (sum, n) = estimators
            .iter()
            .map(|e| e.estimation())
            .filter(|v| v.is_finite())
            .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
        if n > 0 { sum / n as f64 } else { f64::NAN }
    }
}

impl<E: Estimator + Default> PerformanceEvaluator for ClassificationEvaluator<E> {
    fn reset(&mut self) {
        *self = Self::new(self.num_classes);
    }

    fn add_result(&mut self, true_class: usize, class_votes: &[f64]) {
        let Some(predicted) = argmax(class_votes) else {
            return;
        };
        self.ensure_classes(class_votes.len().max(true_class + 1));

        let hit = if predicted == true_class { 1.0 } else { 0.0 };
        self.correct.add(hit);

        for (c, est) in self.predicted_marginals.iter_mut().enumerate() {
            est.add(if c == predicted { 1.0 } else { 0.0 });
        }
        for (c, est) in self.true_marginals.iter_mut().enumerate() {
            est.add(if c == true_class { 1.0 } else { 0.0 });
        }
        for (c, est) in self.precision.iter_mut().enumerate() {
            est.add(if c == predicted { hit } else { f64::NAN });
        }
        for (c, est) in self.recall.iter_mut().enumerate() {
            est.add(if c == true_class { hit } else { f64::NAN });
        }

        self.confusion.add(true_class, predicted);
    }

    fn performance(&self) -> Vec<Measurement> {
        let mut m = vec![Measurement::new("accuracy", self.correct.estimation())];

        if self.correct.count() == 0 {
            m.push(Measurement::new("kappa", 0.0));
            return m;
        }
        m.push(Measurement::new("kappa", self.kappa()));

        let precision = Self::macro_average(&self.precision);
        let recall = Self::macro_average(&self.recall);
        let f1 = {
            let s = precision + recall;
            if precision.is_finite() && recall.is_finite() && s > f64::EPSILON {
                2.0 * precision * recall / s
            } else {
                f64::NAN
            }
        };
        m.push(Measurement::new("precision_macro", precision));
        m.push(Measurement::new("recall_macro", recall));
        m.push(Measurement::new("f1_macro", f1));
        m
    }
}
