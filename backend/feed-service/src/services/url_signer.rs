/// URL signing - HMAC-SHA256 based, time-limited access URLs for stored
/// media objects.
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Issues a fresh, scoped, time-limited access credential for one stored
/// object key. The broker treats issuance failure as non-fatal.
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    async fn issue(&self, object_key: &str, ttl_seconds: u32) -> Result<String>;
}

/// URL signer with HMAC-SHA256 signatures
#[derive(Clone)]
pub struct UrlSigner {
    secret_key: String,
    domain: String,
}

impl UrlSigner {
    pub fn new(secret_key: String, domain: String) -> Self {
        Self { secret_key, domain }
    }

    /// Sign URL with expiration timestamp
    /// Format: https://{domain}/{object_key}?exp={timestamp}&sig={hmac_hex}
    pub fn sign_url(&self, object_key: &str, ttl_seconds: u32) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Internal(format!("Time error: {}", e)))?
            .as_secs();

        let expiration = now + ttl_seconds as u64;
        let payload = format!("{}:{}", object_key, expiration);
        let signature = self.compute_signature(&payload)?;

        Ok(format!(
            "https://{}/{}?exp={}&sig={}",
            self.domain, object_key, expiration, signature
        ))
    }

    /// Verify URL signature and check expiration.
    ///
    /// Production verification happens at the CDN edge against the shared
    /// secret; this mirrors the edge check so signing stays covered by tests.
    #[cfg(test)]
    fn verify_signature(&self, url: &str) -> Result<()> {
        let parsed = url::Url::parse(url)
            .map_err(|e| AppError::Validation(format!("Invalid URL: {}", e)))?;

        let exp = parsed
            .query_pairs()
            .find(|(k, _)| k == "exp")
            .ok_or_else(|| AppError::Validation("Missing exp parameter".into()))?
            .1
            .parse::<u64>()
            .map_err(|_| AppError::Validation("Invalid exp format".into()))?;

        let provided_sig = parsed
            .query_pairs()
            .find(|(k, _)| k == "sig")
            .ok_or_else(|| AppError::Validation("Missing sig parameter".into()))?
            .1
            .to_string();

        // Check expiration first (fail fast)
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Internal(format!("Time error: {}", e)))?
            .as_secs();

        if now > exp {
            return Err(AppError::Validation("URL expired".into()));
        }

        let object_key = parsed
            .path()
            .strip_prefix('/')
            .ok_or_else(|| AppError::Validation("Invalid path".into()))?;

        let payload = format!("{}:{}", object_key, exp);
        let expected_sig = self.compute_signature(&payload)?;

        if provided_sig != expected_sig {
            return Err(AppError::Validation("Invalid signature".into()));
        }

        Ok(())
    }

    fn compute_signature(&self, payload: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| AppError::Internal(format!("HMAC error: {}", e)))?;

        mac.update(payload.as_bytes());
        let result = mac.finalize();

        Ok(hex::encode(result.into_bytes()))
    }
}

#[async_trait]
impl CredentialIssuer for UrlSigner {
    async fn issue(&self, object_key: &str, ttl_seconds: u32) -> Result<String> {
        self.sign_url(object_key, ttl_seconds)
    }
}
