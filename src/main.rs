use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::{info, warn};

use transcribe_gateway::config_loader::load_config;
use transcribe_gateway::{
    configure, json_errors, not_found, Admission, CommandEngine, CredentialGate, GuardConfig,
    HandlerConfig, RateLimiter, RequestGuard, ServerConfig, Transcriber, WhisperConfig,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // Seed the environment from the config file, then read configuration
    if let Err(e) = load_config() {
        warn!("Ignoring configuration file: {}", e);
    }
    let server_config = ServerConfig::default();
    let guard_config = GuardConfig::default();
    let handler_config = HandlerConfig::default();
    let whisper_config = WhisperConfig::default();

    if let Err(e) = handler_config.ensure_upload_dir() {
        warn!(
            "Failed to create upload directory {}: {}",
            handler_config.upload_dir.display(),
            e
        );
    }

    let engine = CommandEngine::new(whisper_config.clone());
    if let Err(e) = engine.ensure_output_dir() {
        warn!(
            "Failed to create whisper output directory {}: {}",
            whisper_config.output_dir.display(),
            e
        );
    }
    let transcriber = Transcriber::new(Arc::new(engine));

    let limiter = Arc::new(RateLimiter::new(
        guard_config.rate_limit,
        guard_config.rate_window,
    ));
    let guard = Arc::new(RequestGuard::new(
        CredentialGate::new(guard_config.api_key.clone()),
        limiter,
    ));

    info!(
        "Starting transcribe gateway on http://{}:{} with {} workers",
        server_config.host, server_config.port, server_config.workers
    );
    info!(
        "Authentication {}",
        if guard_config.auth_enabled() { "enabled" } else { "disabled" }
    );
    info!(
        "Rate limit: {} requests per {}s per caller",
        guard_config.rate_limit,
        guard_config.rate_window.as_secs()
    );
    info!(
        "Upload limit: {} bytes, staged in {}",
        handler_config.max_body_bytes,
        handler_config.upload_dir.display()
    );
    info!(
        "Whisper command: {} (model {}, device {})",
        whisper_config.command_path, whisper_config.model, whisper_config.device
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Admission::new(Arc::clone(&guard)))
            .wrap(json_errors())
            .wrap(Logger::default())
            .app_data(web::Data::new(handler_config.clone()))
            .app_data(web::Data::new(transcriber.clone()))
            .configure(configure)
            .default_service(web::to(not_found))
    })
    .workers(server_config.workers)
    .bind((server_config.host.as_str(), server_config.port))?
    .run()
    .await
}
