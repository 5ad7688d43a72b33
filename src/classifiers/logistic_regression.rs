use linfa::traits::Fit;
use linfa_logistic::{MultiFittedLogisticRegression, MultiLogisticRegression};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::classifiers::{Classifier, InferenceError, TrainingError};
use crate::core::{Dataset, NUMBER_OF_FEATURES};

/// Hyperparameters of the multinomial logistic regression.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegressionParams {
    /// Upper bound on L-BFGS iterations.
    pub max_iterations: u64,
    /// L2 penalty strength; `0.0` disables regularization.
    pub alpha: f64,
}

impl Default for LogisticRegressionParams {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            alpha: 1.0,
        }
    }
}

/// Multinomial (softmax) logistic regression over the four Iris measurements.
///
/// Votes are the per-class probabilities, placed at the index of their class
/// label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegressionClassifier {
    model: MultiFittedLogisticRegression<f64, usize>,
    classes: Vec<usize>,
    number_of_features: usize,
}

impl LogisticRegressionClassifier {
    pub fn fit(
        train: &Dataset,
        params: &LogisticRegressionParams,
    ) -> Result<Self, TrainingError> {
        if train.is_empty() {
            return Err(TrainingError::EmptyTrainingSet);
        }
        if params.max_iterations == 0 {
            return Err(TrainingError::InvalidParameter(
                "max_iterations must be > 0".into(),
            ));
        }
        if !params.alpha.is_finite() || params.alpha < 0.0 {
            return Err(TrainingError::InvalidParameter(format!(
                "alpha must be a finite value >= 0, got {}",
                params.alpha
            )));
        }

        // linfa orders probability columns by sorted class value.
        let mut classes = train.labels().to_vec();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() < 2 {
            return Err(TrainingError::SingleClass(classes[0]));
        }

        let records = Array2::from_shape_vec((train.len(), NUMBER_OF_FEATURES), train.flat_records())?;
        let targets = Array1::from(train.labels().to_vec());
        let dataset = linfa::Dataset::new(records, targets);

        let model = MultiLogisticRegression::default()
            .max_iterations(params.max_iterations)
            .alpha(params.alpha)
            .fit(&dataset)
            .map_err(|e| TrainingError::Fit(e.to_string()))?;

        Ok(Self {
            model,
            classes,
            number_of_features: NUMBER_OF_FEATURES,
        })
    }

    /// Class labels seen during fitting, ascending.
    pub fn classes(&self) -> &[usize] {
        &self.classes
    }
}

impl Classifier for LogisticRegressionClassifier {
    fn number_of_features(&self) -> usize {
        self.number_of_features
    }

    fn number_of_classes(&self) -> usize {
        self.classes.last().map_or(0, |&c| c + 1)
    }

    fn get_votes_for_features(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError> {
        if features.len() != self.number_of_features {
            return Err(InferenceError::DimensionMismatch {
                expected: self.number_of_features,
                found: features.len(),
            });
        }

        let x = Array2::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| InferenceError::Backend(e.to_string()))?;
        let probabilities = self.model.predict_probabilities(&x);
        if probabilities.ncols() != self.classes.len() {
            return Err(InferenceError::Backend(format!(
                "model returned {} class columns, expected {}",
                probabilities.ncols(),
                self.classes.len()
            )));
        }

        let mut votes = vec![0.0; self.number_of_classes()];
        for (column, &class) in self.classes.iter().enumerate() {
            votes[class] = probabilities[[0, column]];
        }
        Ok(votes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FeatureVector;

    fn fitted_on_iris() -> LogisticRegressionClassifier {
        let ds = Dataset::bundled_iris().unwrap();
        let (train, _) = ds.stratified_split(0.2, 42).unwrap();
        LogisticRegressionClassifier::fit(&train, &LogisticRegressionParams::default()).unwrap()
    }

    #[test]
    fn predicts_reference_specimens() {
        let model = fitted_on_iris();
        let setosa = FeatureVector::new(5.1, 3.5, 1.4, 0.2).to_array();
        let virginica = FeatureVector::new(6.2, 3.4, 5.4, 2.3).to_array();
        assert_eq!(model.classify(&setosa).unwrap(), 0);
        assert_eq!(model.classify(&virginica).unwrap(), 2);
    }

    #[test]
    fn held_out_accuracy_is_high() {
        let ds = Dataset::bundled_iris().unwrap();
        let (train, test) = ds.stratified_split(0.2, 42).unwrap();
        let model =
            LogisticRegressionClassifier::fit(&train, &LogisticRegressionParams::default()).unwrap();

        let correct = test
            .iter()
            .filter(|(x, y)| model.classify(&x.to_array()).unwrap() == *y)
            .count();
        let acc = correct as f64 / test.len() as f64;
        assert!(acc >= 0.9, "accuracy too low: {acc}");
    }

    #[test]
    fn votes_are_probabilities_indexed_by_label() {
        let model = fitted_on_iris();
        assert_eq!(model.classes(), &[0, 1, 2]);
        assert_eq!(model.number_of_classes(), 3);

        let votes = model.get_votes_for_features(&[5.9, 3.0, 4.2, 1.5]).unwrap();
        assert_eq!(votes.len(), 3);
        assert!(votes.iter().all(|&p| (0.0..=1.0).contains(&p)));
        assert!((votes.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn same_input_gives_same_label() {
        let model = fitted_on_iris();
        let x = [6.0, 2.9, 4.5, 1.5];
        assert_eq!(model.classify(&x).unwrap(), model.classify(&x).unwrap());
    }

    #[test]
    fn negative_measurements_still_classify() {
        let model = fitted_on_iris();
        let label = model.classify(&[-1.0, 3.5, 1.4, 0.2]).unwrap();
        assert!(label <= 2);
    }

    #[test]
    fn rejects_wrong_dimension() {
        let model = fitted_on_iris();
        let err = model.classify(&[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::DimensionMismatch {
                expected: 4,
                found: 3
            }
        ));
    }

    #[test]
    fn fit_guards() {
        let single = Dataset::from_csv_str(
            "sepal_length,sepal_width,petal_length,petal_width,species\n\
             5.1,3.5,1.4,0.2,setosa\n\
             4.9,3.0,1.4,0.2,setosa\n",
        )
        .unwrap();
        assert!(matches!(
            LogisticRegressionClassifier::fit(&single, &LogisticRegressionParams::default()),
            Err(TrainingError::SingleClass(0))
        ));

        assert!(matches!(
            LogisticRegressionClassifier::fit(&Dataset::default(), &LogisticRegressionParams::default()),
            Err(TrainingError::EmptyTrainingSet)
        ));

        let ds = Dataset::bundled_iris().unwrap();
        let zero_iters = LogisticRegressionParams {
            max_iterations: 0,
            ..Default::default()
        };
        assert!(matches!(
            LogisticRegressionClassifier::fit(&ds, &zero_iters),
            Err(TrainingError::InvalidParameter(_))
        ));
        let negative_alpha = LogisticRegressionParams {
            alpha: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            LogisticRegressionClassifier::fit(&ds, &negative_alpha),
            Err(TrainingError::InvalidParameter(_))
        ));
    }
}
