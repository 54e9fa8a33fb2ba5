//! Transcription boundary.
//!
//! The engine itself is a black box: it takes a path to an audio file and
//! either returns the text segments it recognised or fails. Engines are
//! blocking, so `Transcriber` runs them on actix's blocking thread pool and
//! joins their segments into one transcript.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use actix_web::web;
use serde::Deserialize;
use thiserror::Error;

pub mod command;

pub use self::command::CommandEngine;

/// One piece of recognised text, in engine order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Segment {
    pub text: String,
}

impl Segment {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Failures of the transcription capability.
///
/// The messages are for logs only; clients get a fixed message.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine could not be started
    #[error("failed to run engine: {0}")]
    Spawn(String),

    /// The engine ran and reported failure
    #[error("engine failed: {0}")]
    CommandFailed(String),

    /// The engine's output could not be understood
    #[error("unreadable engine output: {0}")]
    MalformedOutput(String),

    /// File handling around the engine failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The engine panicked or its worker was lost
    #[error("engine task aborted")]
    Aborted,
}

/// A blocking speech-to-text capability.
pub trait TranscriptionEngine: Send + Sync {
    fn transcribe(&self, audio: &Path) -> Result<Vec<Segment>, EngineError>;
}

/// Runs the engine off the async workers and assembles the transcript.
#[derive(Clone)]
pub struct Transcriber {
    engine: Arc<dyn TranscriptionEngine>,
}

impl Transcriber {
    pub fn new(engine: Arc<dyn TranscriptionEngine>) -> Self {
        Self { engine }
    }

    /// Transcribe the file at `audio`.
    ///
    /// The caller keeps ownership of the file; it must stay in place until
    /// this future resolves.
    pub async fn transcribe(&self, audio: PathBuf) -> Result<String, EngineError> {
        let engine = Arc::clone(&self.engine);
        let segments = web::block(move || engine.transcribe(&audio))
            .await
            .map_err(|_| EngineError::Aborted)??;
        Ok(join_segments(&segments))
    }
}

/// Join segment texts with single spaces, keeping their order.
pub fn join_segments(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
