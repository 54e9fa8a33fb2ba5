// Caller identity used as the rate limiting key

use actix_web::http::header::HeaderMap;
use std::net::SocketAddr;

/// Header carrying the client API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Bucket used when auth is enabled and no key was presented
pub const NO_KEY: &str = "no-key";

/// Origin used when the peer address is unknown
pub const UNKNOWN_ORIGIN: &str = "unknown";

/// Returns the presented API key, if it is readable as a header string
pub fn presented_key(headers: &HeaderMap) -> Option<&str> {
    headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok())
}

/// Builds the rate limiting key for a request
///
/// With auth enabled the key is `<presented key or "no-key">|<origin>`, so
/// callers are bucketed per presented key. Without auth it is the origin.
pub fn resolve(auth_enabled: bool, presented: Option<&str>, peer: Option<SocketAddr>) -> String {
    let origin = peer
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_ORIGIN.to_string());

    if !auth_enabled {
        return origin;
    }

    let key = presented.filter(|k| !k.is_empty()).unwrap_or(NO_KEY);
    format!("{}|{}", key, origin)
}
