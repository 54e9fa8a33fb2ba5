// Request admission
//
// Everything that decides whether a request may reach the transcription
// engine: caller identity, credential check, rate limiting and the upload
// allow-list.

pub mod credentials;
pub mod guard;
pub mod identity;
pub mod rate_limiter;
pub mod upload;

pub use self::credentials::CredentialGate;
pub use self::guard::{GuardDecision, Rejection, RequestGuard};
pub use self::rate_limiter::{Clock, RateLimiter, SystemClock};
