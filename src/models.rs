// Transcribe gateway data models
//
// Request and response types shared by the handlers. Every response body has
// exactly one top level field.

use serde::{Deserialize, Serialize};

/// Successful transcription
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranscriptResponse {
    pub transcript: String,
}

/// Error response for API
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

/// Liveness response
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Validated body of `POST /transcribe`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscribeRequest {
    /// Server-side audio path, non-empty
    pub path: String,
}

/// Metadata of an uploaded multipart file, as declared by the client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadedFile {
    /// Client supplied filename
    pub filename: String,
    /// Declared content type without parameters, empty when absent
    pub content_type: String,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
        }
    }

    /// Lowercased text after the last `.`, if any
    pub fn extension(&self) -> Option<String> {
        self.filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }
}
