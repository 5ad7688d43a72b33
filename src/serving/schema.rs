use schemars::{JsonSchema, Schema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::FeatureVector;

/// Body of `POST /predict`. All four fields are required; unknown fields are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IrisInput {
    #[schemars(title = "Sepal length", description = "Sepal length in centimetres")]
    pub sepal_length: f64,
    #[schemars(title = "Sepal width", description = "Sepal width in centimetres")]
    pub sepal_width: f64,
    #[schemars(title = "Petal length", description = "Petal length in centimetres")]
    pub petal_length: f64,
    #[schemars(title = "Petal width", description = "Petal width in centimetres")]
    pub petal_width: f64,
}

impl IrisInput {
    /// Decodes a request body. Only a JSON object is accepted, never the
    /// positional array form.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        if !value.is_object() {
            return Err(serde::de::Error::custom("expected a JSON object"));
        }
        serde_json::from_value(value)
    }

    pub fn to_features(self) -> FeatureVector {
        FeatureVector::new(
            self.sepal_length,
            self.sepal_width,
            self.petal_length,
            self.petal_width,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PredictionResponse {
    #[schemars(description = "0 = setosa, 1 = versicolor, 2 = virginica")]
    pub prediction: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ApiError {
    pub error: String,
    /// Machine-readable error code
    pub code: String,
}

/// Schemas served by `GET /schema`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiSchemas {
    pub predict_request: Schema,
    pub predict_response: Schema,
    pub error: Schema,
}

impl ApiSchemas {
    pub fn generate() -> Self {
        Self {
            predict_request: schema_for!(IrisInput),
            predict_response: schema_for!(PredictionResponse),
            error: schema_for!(ApiError),
        }
    }
}
