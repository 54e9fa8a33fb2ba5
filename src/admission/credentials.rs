// Shared secret verification

use std::fmt;

use subtle::ConstantTimeEq;

use crate::config::defaults::MAX_API_KEY_LEN;

/// Compares presented API keys against the configured secret
#[derive(Clone, Default)]
pub struct CredentialGate {
    secret: Option<String>,
}

impl fmt::Debug for CredentialGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialGate")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl CredentialGate {
    /// `None` disables authentication
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Returns true when the request may proceed
    ///
    /// Keys longer than `MAX_API_KEY_LEN` characters are refused before any
    /// comparison. The comparison itself is constant time over the key bytes.
    pub fn check(&self, provided: Option<&str>) -> bool {
        let Some(secret) = &self.secret else {
            return true;
        };

        match provided {
            Some(key) if !key.is_empty() && key.chars().count() <= MAX_API_KEY_LEN => {
                key.as_bytes().ct_eq(secret.as_bytes()).into()
            }
            _ => false,
        }
    }
}
