use std::convert::Infallible;

use tracing::error;
use warp::http::StatusCode;
use warp::{Rejection, Reply};

use crate::serving::schema::ApiError;

pub(crate) fn error_response(status: StatusCode, code: &str, message: &str) -> warp::reply::Response {
    let body = ApiError {
        error: message.to_string(),
        code: code.to_string(),
    };
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

/// Turns filter rejections into `{"error", "code"}` bodies.
///
/// Body problems are checked first: a request rejected by `/predict` for its
/// body is also rejected by every other route for its path.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, code, message) =
        if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_request",
                format!("Invalid request body: {e}"),
            )
        } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
            (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_media_type",
                "Expected an application/json body".to_string(),
            )
        } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
            (
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large",
                "Request payload too large".to_string(),
            )
        } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
            (
                StatusCode::METHOD_NOT_ALLOWED,
                "method_not_allowed",
                "Method not allowed".to_string(),
            )
        } else if err.is_not_found() {
            (StatusCode::NOT_FOUND, "not_found", "Not found".to_string())
        } else {
            error!("Unhandled rejection: {:?}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error".to_string(),
            )
        };

    Ok(error_response(status, code, &message))
}
