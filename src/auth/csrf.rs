use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Stateless CSRF tokens: an HMAC of the session token, so a form token is only
/// valid together with the cookie it was rendered for.
pub struct CsrfService {
    mac: HmacSha256,
}

impl CsrfService {
    pub fn new(secret: &str) -> Result<Self> {
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| AppError::Internal(format!("Invalid CSRF key: {}", e)))?;
        Ok(Self { mac })
    }

    /// Generate the CSRF token for a session
    pub fn generate_token(&self, session_token: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(b"csrf:");
        mac.update(session_token.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Validate a submitted CSRF token for a session
    pub fn validate_token(&self, session_token: &str, candidate: &str) -> bool {
        if candidate.is_empty() {
            return false;
        }
        let expected = self.generate_token(session_token);
        expected.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}
