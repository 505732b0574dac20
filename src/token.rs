//! Signed time-limited access tokens.
//!
//! A token grants access to one storage key for a fixed window (10 minutes
//! by default). Format: `base64url(json claims) . base64url(hmac-sha256)`,
//! signed with a per-deployment secret. Verification yields the embedded
//! key; anything else — bad encoding, bad signature, expiry — is a 401 at
//! the HTTP layer.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Default token lifetime: 10 minutes.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(600);

/// Why a token failed verification.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
}

#[derive(Serialize, Deserialize)]
struct Claims {
    key: String,
    exp: u64,
}

/// Issues and verifies HMAC-signed access tokens.
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: Vec<u8>, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    /// Signer with a random per-process secret: tokens survive only as
    /// long as this instance.
    pub fn ephemeral(ttl: Duration) -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let secret: [u8; 32] = rng.gen();
        Self::new(secret.to_vec(), ttl)
    }

    /// Issue a token granting access to `key` until the TTL elapses.
    pub fn issue(&self, key: &str) -> String {
        let exp = now_secs() + self.ttl.as_secs();
        self.issue_with_expiry(key, exp)
    }

    fn issue_with_expiry(&self, key: &str, exp: u64) -> String {
        let claims = Claims {
            key: key.to_string(),
            exp,
        };
        // Claims is two plain fields; serialization cannot fail.
        let payload =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap_or_default());
        let tag = URL_SAFE_NO_PAD.encode(self.mac(payload.as_bytes()));
        format!("{payload}.{tag}")
    }

    /// Verify signature and expiry, returning the embedded storage key.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        let (payload, tag) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let tag = URL_SAFE_NO_PAD
            .decode(tag)
            .map_err(|_| TokenError::Malformed)?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| TokenError::BadSignature)?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&tag).map_err(|_| TokenError::BadSignature)?;

        let claims: Claims = URL_SAFE_NO_PAD
            .decode(payload)
            .ok()
            .and_then(|json| serde_json::from_slice(&json).ok())
            .ok_or(TokenError::Malformed)?;

        if now_secs() >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims.key)
    }

    fn mac(&self, data: &[u8]) -> Vec<u8> {
        // HMAC accepts keys of any length, so this cannot fail.
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("hmac accepts any key length");
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Generate a random hex secret suitable for the `token.secret` config key.
pub fn generate_secret() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new(b"test-secret".to_vec(), DEFAULT_TOKEN_TTL)
    }

    #[test]
    fn round_trip_yields_original_key() {
        let s = signer();
        let token = s.issue("movie.mp4");
        assert_eq!(s.verify(&token).unwrap(), "movie.mp4");
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let s = signer();
        let token = s.issue("movie.mp4");
        let other = s.issue("other.mp4");

        // Payload from one token with the signature of another.
        let payload = other.split('.').next().unwrap();
        let tag = token.split('.').nth(1).unwrap();
        assert_eq!(
            s.verify(&format!("{payload}.{tag}")),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = signer().issue("movie.mp4");
        let other = TokenSigner::new(b"different-secret".to_vec(), DEFAULT_TOKEN_TTL);
        assert_eq!(other.verify(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn expired_token_is_rejected() {
        let s = signer();
        let token = s.issue_with_expiry("movie.mp4", now_secs().saturating_sub(1));
        assert_eq!(s.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn garbage_is_malformed() {
        let s = signer();
        for t in ["", "no-dot", "a.b.c.d", "!!!.???"] {
            assert!(s.verify(t).is_err(), "token {t:?}");
        }
    }

    #[test]
    fn ephemeral_signers_do_not_trust_each_other() {
        let a = TokenSigner::ephemeral(DEFAULT_TOKEN_TTL);
        let b = TokenSigner::ephemeral(DEFAULT_TOKEN_TTL);
        let token = a.issue("movie.mp4");
        assert!(a.verify(&token).is_ok());
        assert!(b.verify(&token).is_err());
    }

    #[test]
    fn generate_secret_is_hex_of_32_bytes() {
        let s = generate_secret();
        assert_eq!(s.len(), 64);
        assert!(hex::decode(&s).is_ok());
    }
}
