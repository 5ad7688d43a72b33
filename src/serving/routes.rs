use std::any::Any;
use std::convert::Infallible;
use std::panic::{AssertUnwindSafe, catch_unwind};

use serde_json::Value;
use tracing::{debug, error};
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::classifiers::InferenceError;
use crate::core::Species;
use crate::serving::context::AppContext;
use crate::serving::rejection::{error_response, handle_rejection};
use crate::serving::schema::{ApiSchemas, HealthResponse, IrisInput, PredictionResponse};

/// `GET /health`, `POST /predict` and `GET /schema`, with rejections
/// rendered as JSON errors.
pub fn routes(ctx: AppContext) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(handle_health);

    let predict = warp::path("predict")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with_context(ctx))
        .and_then(handle_predict);

    let schema = warp::path("schema")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(handle_schema);

    health
        .or(predict)
        .or(schema)
        .with(warp::trace::request())
        .recover(handle_rejection)
}

fn with_context(ctx: AppContext) -> impl Filter<Extract = (AppContext,), Error = Infallible> + Clone {
    warp::any().map(move || ctx.clone())
}

async fn handle_health() -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&HealthResponse::ok()))
}

async fn handle_schema() -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&ApiSchemas::generate()))
}

async fn handle_predict(body: Value, ctx: AppContext) -> Result<impl Reply, Infallible> {
    let input = match IrisInput::from_json(body) {
        Ok(input) => input,
        Err(e) => {
            return Ok(error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_request",
                &format!("Invalid request body: {e}"),
            ));
        }
    };

    let Some(model) = ctx.model() else {
        return Ok(error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "model_unavailable",
            &format!(
                "Model not loaded. Run `iris-classifier train` to write {} and restart the service.",
                ctx.model_path().display()
            ),
        ));
    };

    let features = input.to_features().to_array();
    let outcome = catch_unwind(AssertUnwindSafe(|| model.classify(&features)));

    match outcome {
        Ok(Ok(prediction)) => {
            debug!(
                ?features,
                prediction,
                species = ?Species::from_label(prediction),
                "prediction served"
            );
            let body = PredictionResponse { prediction };
            Ok(warp::reply::with_status(warp::reply::json(&body), StatusCode::OK).into_response())
        }
        Ok(Err(e)) => Ok(inference_failure(&e)),
        Err(payload) => {
            let e = InferenceError::Backend(format!(
                "inference panicked: {}",
                panic_message(&*payload)
            ));
            Ok(inference_failure(&e))
        }
    }
}

fn inference_failure(e: &InferenceError) -> warp::reply::Response {
    error!("Inference failed: {e}");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "inference_error", &e.to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use crate::classifiers::{Classifier, LogisticRegressionClassifier, LogisticRegressionParams};
    use crate::core::Dataset;
    use crate::testing::{FailingClassifier, FixedVotesClassifier, PanickingClassifier};

    fn iris_context() -> AppContext {
        let model = LogisticRegressionClassifier::fit(
            &Dataset::bundled_iris().unwrap(),
            &LogisticRegressionParams::default(),
        )
        .unwrap();
        AppContext::with_model(Arc::new(model))
    }

    fn stub_context(model: impl Classifier + 'static) -> AppContext {
        AppContext::with_model(Arc::new(model))
    }

    fn body(res: &warp::http::Response<warp::hyper::body::Bytes>) -> Value {
        serde_json::from_slice(res.body()).unwrap()
    }

    async fn predict(
        ctx: AppContext,
        payload: Value,
    ) -> warp::http::Response<warp::hyper::body::Bytes> {
        warp::test::request()
            .method("POST")
            .path("/predict")
            .json(&payload)
            .reply(&routes(ctx))
            .await
    }

    fn setosa() -> Value {
        json!({"sepal_length": 5.1, "sepal_width": 3.5, "petal_length": 1.4, "petal_width": 0.2})
    }

    #[tokio::test]
    async fn health_is_ok_with_or_without_model() {
        for ctx in [
            AppContext::unavailable("missing.bin"),
            stub_context(FixedVotesClassifier::predicting(1)),
        ] {
            let res = warp::test::request()
                .method("GET")
                .path("/health")
                .reply(&routes(ctx))
                .await;
            assert_eq!(res.status(), 200);
            assert_eq!(body(&res), json!({"status": "ok"}));
        }
    }

    #[tokio::test]
    async fn predicts_reference_specimens() {
        let ctx = iris_context();

        let res = predict(ctx.clone(), setosa()).await;
        assert_eq!(res.status(), 200);
        assert_eq!(body(&res), json!({"prediction": 0}));

        let res = predict(
            ctx,
            json!({"sepal_length": 6.2, "sepal_width": 3.4, "petal_length": 5.4, "petal_width": 2.3}),
        )
        .await;
        assert_eq!(res.status(), 200);
        assert_eq!(body(&res), json!({"prediction": 2}));
    }

    #[tokio::test]
    async fn repeated_requests_agree() {
        let ctx = iris_context();
        let first = body(&predict(ctx.clone(), setosa()).await);
        for _ in 0..5 {
            assert_eq!(body(&predict(ctx.clone(), setosa()).await), first);
        }
    }

    #[tokio::test]
    async fn negative_values_pass_through() {
        let res = predict(
            stub_context(FixedVotesClassifier::predicting(2)),
            json!({"sepal_length": -1.0, "sepal_width": -2.0, "petal_length": 0.0, "petal_width": -0.5}),
        )
        .await;
        assert_eq!(res.status(), 200);
        assert_eq!(body(&res), json!({"prediction": 2}));
    }

    #[tokio::test]
    async fn missing_field_is_422_even_without_model() {
        for ctx in [AppContext::unavailable("missing.bin"), iris_context()] {
            let res = predict(ctx, json!({"sepal_length": 5.1})).await;
            assert_eq!(res.status(), 422);
            let b = body(&res);
            assert_eq!(b["code"], "invalid_request");
            assert!(b["error"].as_str().unwrap().contains("sepal_width"));
        }
    }

    #[tokio::test]
    async fn wrong_types_are_422() {
        let ctx = stub_context(FixedVotesClassifier::predicting(0));
        for payload in [
            json!({"sepal_length": "5.1", "sepal_width": 3.5, "petal_length": 1.4, "petal_width": 0.2}),
            json!({"sepal_length": 5.1, "sepal_width": 3.5, "petal_length": 1.4, "petal_width": true}),
            json!(null),
        ] {
            let res = predict(ctx.clone(), payload).await;
            assert_eq!(res.status(), 422);
        }
    }

    #[tokio::test]
    async fn positional_array_is_422() {
        for ctx in [
            AppContext::unavailable("missing.bin"),
            stub_context(FixedVotesClassifier::predicting(0)),
        ] {
            let res = predict(ctx, json!([5.1, 3.5, 1.4, 0.2])).await;
            assert_eq!(res.status(), 422);
            let b = body(&res);
            assert_eq!(b["code"], "invalid_request");
            assert!(b["error"].as_str().unwrap().contains("JSON object"));
        }
    }

    #[tokio::test]
    async fn malformed_json_is_422() {
        let res = warp::test::request()
            .method("POST")
            .path("/predict")
            .header("content-type", "application/json")
            .body("{\"sepal_length\": 5.1,")
            .reply(&routes(stub_context(FixedVotesClassifier::predicting(0))))
            .await;
        assert_eq!(res.status(), 422);
    }

    #[tokio::test]
    async fn non_json_content_type_is_415() {
        let res = warp::test::request()
            .method("POST")
            .path("/predict")
            .header("content-type", "text/plain")
            .body("5.1,3.5,1.4,0.2")
            .reply(&routes(stub_context(FixedVotesClassifier::predicting(0))))
            .await;
        assert_eq!(res.status(), 415);
        assert_eq!(body(&res)["code"], "unsupported_media_type");
    }

    #[tokio::test]
    async fn missing_model_is_503_with_hint() {
        let res = predict(AppContext::unavailable("artifacts/model.bin"), setosa()).await;
        assert_eq!(res.status(), 503);
        let b = body(&res);
        assert_eq!(b["code"], "model_unavailable");
        let msg = b["error"].as_str().unwrap();
        assert!(msg.contains("iris-classifier train"));
        assert!(msg.contains("artifacts/model.bin"));
    }

    #[tokio::test]
    async fn inference_error_is_500() {
        let res = predict(stub_context(FailingClassifier), setosa()).await;
        assert_eq!(res.status(), 500);
        let b = body(&res);
        assert_eq!(b["code"], "inference_error");
        assert!(b["error"].as_str().unwrap().contains("weights are corrupted"));
    }

    #[tokio::test]
    async fn inference_panic_is_500() {
        let ctx = stub_context(PanickingClassifier);
        let res = predict(ctx.clone(), setosa()).await;
        assert_eq!(res.status(), 500);
        assert!(body(&res)["error"].as_str().unwrap().contains("model exploded"));

        // the service keeps answering after a panic
        let res = warp::test::request()
            .method("GET")
            .path("/health")
            .reply(&routes(ctx))
            .await;
        assert_eq!(res.status(), 200);
    }

    #[tokio::test]
    async fn unknown_path_and_wrong_method() {
        let ctx = stub_context(FixedVotesClassifier::predicting(0));
        let res = warp::test::request()
            .method("GET")
            .path("/nope")
            .reply(&routes(ctx.clone()))
            .await;
        assert_eq!(res.status(), 404);
        assert_eq!(body(&res)["code"], "not_found");

        let res = warp::test::request()
            .method("GET")
            .path("/predict")
            .reply(&routes(ctx))
            .await;
        assert_eq!(res.status(), 405);
    }

    #[tokio::test]
    async fn schema_lists_request_fields() {
        let res = warp::test::request()
            .method("GET")
            .path("/schema")
            .reply(&routes(AppContext::unavailable("missing.bin")))
            .await;
        assert_eq!(res.status(), 200);
        let b = body(&res);
        assert!(b["predict_request"]["properties"]["petal_width"].is_object());
        assert!(b["predict_response"]["properties"]["prediction"].is_object());
        assert!(b["error"]["properties"]["code"].is_object());
    }
}
