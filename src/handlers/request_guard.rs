// Admission middleware for the transcribe gateway
//
// Wraps every service with the request guard. Rejected requests never reach
// the handler, so their bodies are never read.

use std::sync::Arc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use log::info;

use crate::admission::{GuardDecision, RequestGuard};
use crate::error::GatewayError;

/// Middleware factory for the request guard
#[derive(Clone)]
pub struct Admission {
    guard: Arc<RequestGuard>,
}

impl Admission {
    pub fn new(guard: Arc<RequestGuard>) -> Self {
        Self { guard }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Admission
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AdmissionMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        if !self.guard.auth_enabled() {
            info!("API key not configured; authentication is disabled");
        }
        ok(AdmissionMiddleware {
            service,
            guard: Arc::clone(&self.guard),
        })
    }
}

/// Admission middleware implementation
pub struct AdmissionMiddleware<S> {
    service: S,
    guard: Arc<RequestGuard>,
}

impl<S, B> Service<ServiceRequest> for AdmissionMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match self.guard.check(req.headers(), req.peer_addr()) {
            GuardDecision::Allow => {
                let fut = self.service.call(req);
                Box::pin(async move {
                    let res = fut.await?;
                    Ok(res.map_into_left_body())
                })
            }
            GuardDecision::Reject(rejection) => {
                let response = req
                    .error_response(GatewayError::from(rejection))
                    .map_into_right_body();
                Box::pin(async move { Ok(response) })
            }
        }
    }
}
