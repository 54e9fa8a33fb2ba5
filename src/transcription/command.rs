// Whisper command engine
//
// Runs the whisper CLI on an audio file and reads back its JSON output. Each
// call writes into its own scratch directory, removed once the output has been
// read.

use std::fs;
use std::path::Path;
use std::process::Command;

use log::{debug, error, info};
use serde::Deserialize;

use super::{EngineError, Segment, TranscriptionEngine};
use crate::config::WhisperConfig;
use crate::file_utils::{cleanup_folder, create_unique_dir};

/// Shape of the whisper JSON output; only segments are used
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    segments: Vec<Segment>,
}

/// Engine backed by the whisper command line tool
#[derive(Debug, Clone)]
pub struct CommandEngine {
    config: WhisperConfig,
}

impl CommandEngine {
    pub fn new(config: WhisperConfig) -> Self {
        Self { config }
    }

    /// Ensures the scratch output directory exists
    pub fn ensure_output_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.config.output_dir)
    }

    fn build_command(&self, audio: &Path, output_dir: &Path) -> Command {
        let mut command = Command::new(&self.config.command_path);
        command
            .arg(audio)
            .arg("--model")
            .arg(&self.config.model)
            .arg("--device")
            .arg(&self.config.device)
            .arg("--output_dir")
            .arg(output_dir)
            .arg("--output_format")
            .arg("json");
        command
    }

    fn run(&self, audio: &Path, output_dir: &Path) -> Result<Vec<Segment>, EngineError> {
        let output = self
            .build_command(audio, output_dir)
            .output()
            .map_err(|e| EngineError::Spawn(format!("{}: {}", self.config.command_path, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!("Whisper exited with {}: {}", output.status, stderr);
            return Err(EngineError::CommandFailed(stderr));
        }

        // Whisper names its output after the input file stem
        let stem = audio
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("audio");
        let output_file = output_dir.join(format!("{}.json", stem));
        let content = fs::read_to_string(&output_file).map_err(|e| {
            EngineError::MalformedOutput(format!("{}: {}", output_file.display(), e))
        })?;

        parse_output(&content)
    }
}

impl TranscriptionEngine for CommandEngine {
    fn transcribe(&self, audio: &Path) -> Result<Vec<Segment>, EngineError> {
        let output_dir = create_unique_dir(&self.config.output_dir)?;
        debug!(
            "Running whisper on {} into {}",
            audio.display(),
            output_dir.display()
        );

        let result = self.run(audio, &output_dir);
        cleanup_folder(&output_dir);

        if let Ok(segments) = &result {
            info!("Whisper produced {} segments", segments.len());
        }
        result
    }
}

/// Parse whisper's JSON output into segments
pub fn parse_output(content: &str) -> Result<Vec<Segment>, EngineError> {
    serde_json::from_str::<WhisperOutput>(content)
        .map(|output| output.segments)
        .map_err(|e| EngineError::MalformedOutput(e.to_string()))
}
