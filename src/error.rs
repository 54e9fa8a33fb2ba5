// Error handling for the transcribe gateway
//
// This module defines the single error type returned by handlers and the
// middleware, and how each variant maps onto a status code and a fixed public
// message. The `Display` text may carry internal detail for the logs; clients
// only ever see `public_message`.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::transcription::EngineError;

/// Errors that can occur while admitting or serving a request
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Missing, invalid or oversized credential
    #[error("Unauthorized")]
    Unauthorized,

    /// Rate window full for the caller identity
    #[error("Too Many Requests")]
    TooManyRequests,

    /// Body is not a JSON object
    #[error("Invalid JSON body")]
    InvalidJson,

    /// `path` missing, not a string, or empty
    #[error("Field 'path' must be a non-empty string")]
    MissingPath,

    /// `path` does not reference an existing entry
    #[error("Invalid file path: {0}")]
    InvalidPath(String),

    /// No multipart `file` field
    #[error("Missing file field")]
    MissingFile,

    /// `file` field present with an empty filename
    #[error("Empty filename")]
    EmptyFilename,

    /// Extension or content type outside the allow-list
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Multipart stream could not be read
    #[error("Malformed upload: {0}")]
    MalformedUpload(String),

    /// Body larger than the configured ceiling
    #[error("File too large: limit is {0} bytes")]
    PayloadTooLarge(usize),

    /// Engine failure in path mode
    #[error("Failed to transcribe audio: {0}")]
    TranscriptionFailed(#[source] EngineError),

    /// Engine or staging failure in upload mode
    #[error("Failed to transcribe uploaded file: {0}")]
    UploadTranscriptionFailed(#[source] EngineError),

    #[error("Not Found")]
    NotFound,

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// Anything unanticipated
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// The message sent to clients; never contains internal detail
    pub fn public_message(&self) -> &'static str {
        match self {
            GatewayError::Unauthorized => "Unauthorized",
            GatewayError::TooManyRequests => "Too Many Requests",
            GatewayError::InvalidJson => "Invalid JSON body",
            GatewayError::MissingPath => "Field 'path' must be a non-empty string",
            GatewayError::InvalidPath(_) => "Invalid file path",
            GatewayError::MissingFile => "Missing file field",
            GatewayError::EmptyFilename => "Empty filename",
            GatewayError::UnsupportedFileType(_) => "Unsupported file type",
            GatewayError::MalformedUpload(_) => "Bad Request",
            GatewayError::PayloadTooLarge(_) => "File too large",
            GatewayError::TranscriptionFailed(_) => "Failed to transcribe audio",
            GatewayError::UploadTranscriptionFailed(_) => "Failed to transcribe uploaded file",
            GatewayError::NotFound => "Not Found",
            GatewayError::MethodNotAllowed => "Method Not Allowed",
            GatewayError::Internal(_) => "Internal Server Error",
        }
    }
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::InvalidJson
            | GatewayError::MissingPath
            | GatewayError::InvalidPath(_)
            | GatewayError::MissingFile
            | GatewayError::EmptyFilename
            | GatewayError::UnsupportedFileType(_)
            | GatewayError::MalformedUpload(_) => StatusCode::BAD_REQUEST,
            GatewayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::TranscriptionFailed(_)
            | GatewayError::UploadTranscriptionFailed(_)
            | GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.public_message().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_codes() {
        assert_eq!(GatewayError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(GatewayError::TooManyRequests.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(GatewayError::InvalidJson.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            GatewayError::PayloadTooLarge(1).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(GatewayError::MethodNotAllowed.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            GatewayError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn test_engine_detail_is_not_exposed() {
        let err = GatewayError::TranscriptionFailed(EngineError::CommandFailed(
            "CUDA out of memory at /opt/secret/model.bin".into(),
        ));
        assert!(err.to_string().contains("CUDA"));

        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body()).await.unwrap();
        assert_eq!(
            body.as_ref(),
            br#"{"error":"Failed to transcribe audio"}"#.as_slice()
        );
    }

    #[actix_web::test]
    async fn test_invalid_path_body_hides_the_path() {
        let response = GatewayError::InvalidPath("/etc/shadow".into()).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        assert_eq!(body.as_ref(), br#"{"error":"Invalid file path"}"#.as_slice());
    }
}
