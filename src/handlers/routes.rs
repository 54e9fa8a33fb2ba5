// API route handlers for the transcribe gateway
//
// Admission has already happened in middleware by the time these run.

use std::path::PathBuf;

use actix_web::{web, HttpRequest, HttpResponse};
use log::{error, info};

use crate::config::HandlerConfig;
use crate::error::GatewayError;
use crate::handlers::form::{extract_transcribe_request, extract_upload};
use crate::models::{HealthResponse, TranscriptResponse};
use crate::transcription::Transcriber;

/// Handler for transcription of a file already on the server
///
/// The path is only read; it is never moved or deleted.
pub async fn transcribe(
    req: HttpRequest,
    payload: web::Payload,
    config: web::Data<HandlerConfig>,
    transcriber: web::Data<Transcriber>,
) -> Result<HttpResponse, GatewayError> {
    let request = extract_transcribe_request(&req, payload, &config).await?;

    // Unreadable metadata counts as missing
    if !tokio::fs::try_exists(&request.path).await.unwrap_or(false) {
        return Err(GatewayError::InvalidPath(request.path));
    }

    let transcript = transcriber
        .transcribe(PathBuf::from(&request.path))
        .await
        .map_err(|e| {
            error!("Transcription of {} failed: {}", request.path, e);
            GatewayError::TranscriptionFailed(e)
        })?;

    info!("Transcribed {} ({} chars)", request.path, transcript.len());
    Ok(HttpResponse::Ok().json(TranscriptResponse { transcript }))
}

/// Handler for transcription of an uploaded file
///
/// The upload is staged in a temp file which is removed before the response
/// is built, whether transcription succeeded or not.
pub async fn transcribe_file(
    req: HttpRequest,
    payload: web::Payload,
    config: web::Data<HandlerConfig>,
    transcriber: web::Data<Transcriber>,
) -> Result<HttpResponse, GatewayError> {
    let (uploaded, staged) = extract_upload(&req, payload, &config).await?;

    let result = transcriber.transcribe(staged.path().to_path_buf()).await;
    staged.remove();

    let transcript = result.map_err(|e| {
        error!("Transcription of upload {:?} failed: {}", uploaded.filename, e);
        GatewayError::UploadTranscriptionFailed(e)
    })?;

    info!(
        "Transcribed upload {:?} ({} chars)",
        uploaded.filename,
        transcript.len()
    );
    Ok(HttpResponse::Ok().json(TranscriptResponse { transcript }))
}

/// Liveness endpoint
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse::ok())
}

/// Fallback for unknown paths
pub async fn not_found() -> Result<HttpResponse, GatewayError> {
    Err(GatewayError::NotFound)
}

/// Fallback for known paths hit with the wrong method
pub async fn method_not_allowed() -> Result<HttpResponse, GatewayError> {
    Err(GatewayError::MethodNotAllowed)
}
