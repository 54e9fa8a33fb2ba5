//! HTTP level tests for the gateway
//!
//! Requests go through the same middleware and route table as the server,
//! with a scripted engine and a hand-driven clock.

use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use crate::admission::rate_limiter::ManualClock;
use crate::admission::{CredentialGate, RateLimiter, RequestGuard};
use crate::config::HandlerConfig;
use crate::transcription::fake::{FakeEngine, Script};
use crate::transcription::Transcriber;

pub const SECRET: &str = "correct-horse-battery-staple";
pub const BOUNDARY: &str = "----gatewaytestboundary";

/// Everything a test app needs, kept alive for the duration of the test
pub struct Harness {
    pub guard: Arc<RequestGuard>,
    pub clock: Arc<ManualClock>,
    pub engine: Arc<FakeEngine>,
    pub transcriber: Transcriber,
    pub config: HandlerConfig,
    pub upload_dir: TempDir,
}

impl Harness {
    pub fn new(secret: Option<&str>, script: Script) -> Self {
        Self::with_limits(secret, script, 60, 1024 * 1024)
    }

    pub fn with_limits(secret: Option<&str>, script: Script, rate_limit: usize, max_body_bytes: usize) -> Self {
        let clock = Arc::new(ManualClock::new());
        let limiter = RateLimiter::with_clock(rate_limit, Duration::from_secs(60), clock.clone());
        let guard = RequestGuard::new(CredentialGate::new(secret.map(String::from)), Arc::new(limiter));
        let engine = FakeEngine::new(script);
        let upload_dir = TempDir::new().expect("temp dir");

        Self {
            guard: Arc::new(guard),
            clock,
            transcriber: Transcriber::new(engine.clone()),
            engine,
            config: HandlerConfig {
                max_body_bytes,
                upload_dir: upload_dir.path().to_path_buf(),
            },
            upload_dir,
        }
    }

    /// Files currently staged in the upload directory
    pub fn staged_files(&self) -> usize {
        fs::read_dir(self.upload_dir.path()).expect("read upload dir").count()
    }
}

/// Build an initialised test service from a `Harness`
macro_rules! test_app {
    ($harness:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(crate::handlers::Admission::new($harness.guard.clone()))
                .wrap(crate::handlers::json_errors())
                .app_data(actix_web::web::Data::new($harness.config.clone()))
                .app_data(actix_web::web::Data::new($harness.transcriber.clone()))
                .configure(crate::handlers::configure)
                .default_service(actix_web::web::to(crate::handlers::not_found)),
        )
        .await
    };
}

mod admission_tests;

pub fn peer() -> SocketAddr {
    "10.0.0.1:40123".parse().unwrap()
}

/// Multipart body with a single part; returns (content type header, body)
pub fn multipart(field: &str, filename: Option<&str>, content_type: Option<&str>, data: &[u8]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());

    let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", field);
    if let Some(filename) = filename {
        disposition.push_str(&format!("; filename=\"{}\"", filename));
    }
    body.extend_from_slice(disposition.as_bytes());
    body.extend_from_slice(b"\r\n");

    if let Some(content_type) = content_type {
        body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}

pub fn ok_script() -> Script {
    Script::Segments(vec!["hello", "world"])
}
