// Transcribe gateway HTTP handlers
//
// This module contains the HTTP handlers, the admission and error
// middleware and the route table shared by the server and the tests.

pub mod error_handlers;
pub mod form;
pub mod request_guard;
pub mod routes;

#[cfg(test)]
mod tests;

use actix_web::web;

// Re-export handlers for easier access
pub use self::routes::{health, method_not_allowed, not_found, transcribe, transcribe_file};
// Re-export middleware
pub use self::error_handlers::json_errors;
pub use self::request_guard::Admission;

/// Register the API routes
///
/// Each resource answers unsupported methods with a JSON 405; the app level
/// default service (`not_found`) is set by the caller.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/transcribe")
            .route(web::post().to(transcribe))
            .default_service(web::to(method_not_allowed)),
    )
    .service(
        web::resource("/transcribe-file")
            .route(web::post().to(transcribe_file))
            .default_service(web::to(method_not_allowed)),
    )
    .service(
        web::resource("/health")
            .route(web::get().to(health))
            .default_service(web::to(method_not_allowed)),
    );
}
