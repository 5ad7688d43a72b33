use serde::{Deserialize, Serialize};

/// Column names of the four measurements, in model input order.
pub const FEATURE_NAMES: [&str; 4] = ["sepal_length", "sepal_width", "petal_length", "petal_width"];

pub const NUMBER_OF_FEATURES: usize = FEATURE_NAMES.len();

/// One specimen's measurements in centimetres.
///
/// No range checks are applied: negative or implausible values are kept as
/// given and handed to the model unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub sepal_length: f64,
    pub sepal_width: f64,
    pub petal_length: f64,
    pub petal_width: f64,
}

impl FeatureVector {
    pub fn new(sepal_length: f64, sepal_width: f64, petal_length: f64, petal_width: f64) -> Self {
        Self {
            sepal_length,
            sepal_width,
            petal_length,
            petal_width,
        }
    }

    #[inline]
    pub fn to_array(&self) -> [f64; NUMBER_OF_FEATURES] {
        [
            self.sepal_length,
            self.sepal_width,
            self.petal_length,
            self.petal_width,
        ]
    }
}

impl From<[f64; NUMBER_OF_FEATURES]> for FeatureVector {
    fn from(v: [f64; NUMBER_OF_FEATURES]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_order_matches_feature_names() {
        let fv = FeatureVector::new(5.1, 3.5, 1.4, 0.2);
        assert_eq!(fv.to_array(), [5.1, 3.5, 1.4, 0.2]);
        assert_eq!(FeatureVector::from(fv.to_array()), fv);
        assert_eq!(FEATURE_NAMES[2], "petal_length");
    }

    #[test]
    fn negative_values_are_kept() {
        let fv = FeatureVector::new(-1.0, 3.5, 1.4, 0.2);
        assert_eq!(fv.to_array()[0], -1.0);
    }
}
