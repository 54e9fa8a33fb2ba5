// Request body processing for the transcribe gateway
//
// This module reads request bodies under the configured size ceiling: the JSON
// body of `/transcribe` and the multipart upload of `/transcribe-file`. The
// ceiling is checked against `Content-Length` first and then while streaming,
// so an oversized body is never buffered or written out in full.

use std::cell::Cell;
use std::rc::Rc;

use actix_multipart::{Multipart, MultipartError};
use actix_web::error::PayloadError;
use actix_web::http::header::{self, HeaderMap};
use actix_web::{web, HttpRequest};
use futures::{StreamExt, TryStreamExt};
use log::{debug, info, warn};
use serde_json::Value;

use crate::admission::upload;
use crate::config::HandlerConfig;
use crate::error::GatewayError;
use crate::file_utils::UploadedAudio;
use crate::models::{TranscribeRequest, UploadedFile};
use crate::transcription::EngineError;

/// Name of the multipart field carrying the audio
pub const FILE_FIELD: &str = "file";

/// Reject early when the declared length is already over the limit
pub fn check_content_length(headers: &HeaderMap, limit: usize) -> Result<(), GatewayError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok());

    match declared {
        Some(len) if len > limit as u64 => {
            warn!("Declared body of {} bytes exceeds limit of {}", len, limit);
            Err(GatewayError::PayloadTooLarge(limit))
        }
        _ => Ok(()),
    }
}

/// Read the whole body, failing as soon as it grows past `limit`
pub async fn read_limited_body(
    req: &HttpRequest,
    mut payload: web::Payload,
    limit: usize,
) -> Result<web::BytesMut, GatewayError> {
    check_content_length(req.headers(), limit)?;

    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| GatewayError::MalformedUpload(e.to_string()))?;
        if body.len() + chunk.len() > limit {
            return Err(GatewayError::PayloadTooLarge(limit));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// True for `application/json` and `application/*+json`
fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

/// Validate a `/transcribe` body into a request
pub fn parse_transcribe_request(headers: &HeaderMap, body: &[u8]) -> Result<TranscribeRequest, GatewayError> {
    if !is_json(headers) {
        return Err(GatewayError::InvalidJson);
    }

    let data: Value = serde_json::from_slice(body).map_err(|e| {
        debug!("Rejecting JSON body: {}", e);
        GatewayError::InvalidJson
    })?;
    let Value::Object(data) = data else {
        return Err(GatewayError::InvalidJson);
    };

    match data.get("path").and_then(Value::as_str) {
        Some(path) if !path.is_empty() => Ok(TranscribeRequest {
            path: path.to_string(),
        }),
        _ => Err(GatewayError::MissingPath),
    }
}

/// Read and validate the body of `POST /transcribe`
pub async fn extract_transcribe_request(
    req: &HttpRequest,
    payload: web::Payload,
    config: &HandlerConfig,
) -> Result<TranscribeRequest, GatewayError> {
    let body = read_limited_body(req, payload, config.max_body_bytes).await?;
    parse_transcribe_request(req.headers(), &body)
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

/// Wrap the payload so the whole multipart body is counted against `limit`
///
/// The returned flag is raised when the stream was cut for being too large,
/// which lets the caller tell an overflow apart from a malformed body.
fn limited_multipart(headers: &HeaderMap, payload: web::Payload, limit: usize) -> (Multipart, Rc<Cell<bool>>) {
    let overflowed = Rc::new(Cell::new(false));
    let flag = Rc::clone(&overflowed);
    let mut seen = 0usize;

    let limited = payload.map(move |chunk| {
        let chunk = chunk?;
        seen += chunk.len();
        if seen > limit {
            flag.set(true);
            return Err(PayloadError::Overflow);
        }
        Ok(chunk)
    });

    (Multipart::new(headers, limited), overflowed)
}

/// Extract the `file` field of a multipart upload into a staged temp file
///
/// The upload is validated against the allow-list before anything is written.
/// On any error after staging started, the staged file is dropped and thereby
/// removed before this function returns.
pub async fn extract_upload(
    req: &HttpRequest,
    payload: web::Payload,
    config: &HandlerConfig,
) -> Result<(UploadedFile, UploadedAudio), GatewayError> {
    let limit = config.max_body_bytes;
    check_content_length(req.headers(), limit)?;

    if !is_multipart(req.headers()) {
        return Err(GatewayError::MissingFile);
    }

    let (mut form, overflowed) = limited_multipart(req.headers(), payload, limit);
    let stream_error = |e: MultipartError| {
        if overflowed.get() {
            GatewayError::PayloadTooLarge(limit)
        } else {
            GatewayError::MalformedUpload(e.to_string())
        }
    };

    while let Some(mut field) = form.try_next().await.map_err(stream_error)? {
        let content_disposition = field.content_disposition();
        let field_name = content_disposition
            .and_then(|cd| cd.get_name().map(|name| name.to_string()))
            .unwrap_or_default();
        let filename = content_disposition.and_then(|cd| cd.get_filename().map(|f| f.to_string()));

        // Parts without a filename are plain form values, not files
        let filename = match filename {
            Some(filename) if field_name == FILE_FIELD => filename,
            _ => {
                while field.try_next().await.map_err(stream_error)?.is_some() {}
                continue;
            }
        };

        let uploaded = UploadedFile::new(
            filename,
            field
                .content_type()
                .map(|m| m.essence_str().to_string())
                .unwrap_or_default(),
        );

        if uploaded.filename.is_empty() {
            return Err(GatewayError::EmptyFilename);
        }
        if !upload::is_allowed(Some(&uploaded)) {
            warn!(
                "Rejected upload {:?} declared as {:?}",
                uploaded.filename, uploaded.content_type
            );
            return Err(GatewayError::UnsupportedFileType(uploaded.filename));
        }

        let mut staged = UploadedAudio::create(&config.upload_dir, &upload::staging_suffix(&uploaded))
            .map_err(|e| GatewayError::UploadTranscriptionFailed(EngineError::Io(e)))?;

        while let Some(chunk) = field.try_next().await.map_err(stream_error)? {
            staged
                .write_all(&chunk)
                .map_err(|e| GatewayError::UploadTranscriptionFailed(EngineError::Io(e)))?;
        }

        info!(
            "Staged upload {:?} ({} bytes) at {}",
            uploaded.filename,
            staged.size(),
            staged.path().display()
        );
        return Ok((uploaded, staged));
    }

    Err(GatewayError::MissingFile)
}
