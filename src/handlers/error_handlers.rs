// Server error fallback for the transcribe gateway
//
// Handlers already answer with JSON. Faults raised by actix itself (missing
// app data, extractor failures, a handler panic caught upstream) come back
// as plain text; they are rewritten into the generic JSON 500.

use actix_web::{
    dev::ServiceResponse,
    http::header::CONTENT_TYPE,
    middleware::{ErrorHandlerResponse, ErrorHandlers},
    ResponseError, Result,
};
use log::error;

use crate::error::GatewayError;

/// Error handler middleware applied around the whole app
pub fn json_errors<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new().default_handler_server(internal_error)
}

fn is_json(res: &ServiceResponse<impl Sized>) -> bool {
    res.response()
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

fn internal_error<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    if is_json(&res) {
        return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
    }

    let cause = res
        .response()
        .error()
        .map_or_else(|| res.status().to_string(), |e| e.to_string());
    error!(
        "Unhandled fault on {} {}: {}",
        res.request().method(),
        res.request().path(),
        cause
    );

    let (req, _) = res.into_parts();
    let response = GatewayError::Internal(cause).error_response();
    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, response).map_into_right_body(),
    ))
}
