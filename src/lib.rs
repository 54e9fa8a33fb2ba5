// Transcribe Gateway Library
//
// This crate provides an HTTP gateway in front of a speech-to-text engine.
// Every request passes an admission pipeline (API key check and per-caller
// sliding window rate limiting) before any audio reaches the engine.

pub mod admission;
pub mod config;
pub mod config_loader;
pub mod error;
pub mod file_utils;
pub mod handlers;
pub mod models;
pub mod transcription;

// Re-export common types for easier access
pub use admission::{CredentialGate, GuardDecision, RateLimiter, Rejection, RequestGuard};
pub use config::{GuardConfig, HandlerConfig, ServerConfig, WhisperConfig};
pub use error::GatewayError;
pub use handlers::{configure, json_errors, not_found, Admission};
pub use models::{ErrorResponse, HealthResponse, TranscriptResponse};
pub use transcription::{CommandEngine, EngineError, Segment, Transcriber, TranscriptionEngine};
