// Request guard: credential gate plus rate limiter
//
// One decision per request, taken before any handler reads the body.

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::http::header::HeaderMap;
use log::warn;

use super::credentials::CredentialGate;
use super::identity;
use super::rate_limiter::RateLimiter;
use crate::error::GatewayError;

/// Why a request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Unauthorized,
    TooManyRequests,
}

impl From<Rejection> for GatewayError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Unauthorized => GatewayError::Unauthorized,
            Rejection::TooManyRequests => GatewayError::TooManyRequests,
        }
    }
}

/// Outcome of the admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Reject(Rejection),
}

/// Admission control applied to every endpoint
#[derive(Debug, Clone)]
pub struct RequestGuard {
    gate: CredentialGate,
    limiter: Arc<RateLimiter>,
}

impl RequestGuard {
    pub fn new(gate: CredentialGate, limiter: Arc<RateLimiter>) -> Self {
        Self { gate, limiter }
    }

    pub fn auth_enabled(&self) -> bool {
        self.gate.is_enabled()
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Decide whether a request may proceed
    ///
    /// Every attempt goes through the limiter, failed authentications
    /// included; they land in the bucket of the key they presented (or
    /// `no-key`), never in the bucket of the real key. A bad credential
    /// is reported as 401 even when that bucket is also full.
    pub fn check(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> GuardDecision {
        let presented = identity::presented_key(headers);
        let caller = identity::resolve(self.gate.is_enabled(), presented, peer);

        let authorized = self.gate.check(presented);
        let admitted = self.limiter.admit(&caller);

        if !authorized {
            warn!(
                "Rejected request from {}: invalid or missing API key",
                peer.map_or_else(|| identity::UNKNOWN_ORIGIN.to_string(), |p| p.ip().to_string())
            );
            return GuardDecision::Reject(Rejection::Unauthorized);
        }

        if !admitted {
            warn!(
                "Rate limit of {} per {}s reached for {} ({} identities tracked)",
                self.limiter.limit(),
                self.limiter.window().as_secs(),
                peer.map_or_else(|| identity::UNKNOWN_ORIGIN.to_string(), |p| p.ip().to_string()),
                self.limiter.tracked_identities()
            );
            return GuardDecision::Reject(Rejection::TooManyRequests);
        }

        GuardDecision::Allow
    }
}
