use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumCount, EnumIter};

/// The three Iris species, in class-label order.
///
/// The discriminant is the integer label the classifier is trained on and the
/// value returned by the prediction endpoint.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumCount,
    EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Species {
    #[serde(alias = "Iris-setosa")]
    Setosa = 0,
    #[serde(alias = "Iris-versicolor")]
    Versicolor = 1,
    #[serde(alias = "Iris-virginica")]
    Virginica = 2,
}

impl Species {
    #[inline]
    pub fn label(self) -> usize {
        self as usize
    }

    pub fn from_label(label: usize) -> Option<Self> {
        match label {
            0 => Some(Species::Setosa),
            1 => Some(Species::Versicolor),
            2 => Some(Species::Virginica),
            _ => None,
        }
    }
}
