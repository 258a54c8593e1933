/// Media URL Broker
///
/// Turns stored object keys into time-limited access URLs. Resolution is
/// recomputed on every fetch (never cached) and degrades to the original key
/// when credential issuance fails, so a broker outage can't fail a page.
use futures::future::join_all;
use std::sync::Arc;
use tracing::warn;

use crate::services::url_signer::CredentialIssuer;

/// Prefixes that are already usable direct references (ephemeral local
/// previews); issuing a credential for them would be meaningless.
const PASSTHROUGH_PREFIXES: [&str; 2] = ["blob:", "data:"];

/// Validity window picked by call context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlContext {
    /// Long window: URLs embedded in feed responses
    FeedDisplay,
    /// Short window: edit-time previews
    EditPreview,
}

pub struct MediaBroker {
    issuer: Arc<dyn CredentialIssuer>,
    feed_ttl_secs: u32,
    preview_ttl_secs: u32,
}

impl MediaBroker {
    pub fn new(issuer: Arc<dyn CredentialIssuer>, feed_ttl_secs: u32, preview_ttl_secs: u32) -> Self {
        Self {
            issuer,
            feed_ttl_secs,
            preview_ttl_secs,
        }
    }

    fn ttl_for(&self, ctx: TtlContext) -> u32 {
        match ctx {
            TtlContext::FeedDisplay => self.feed_ttl_secs,
            TtlContext::EditPreview => self.preview_ttl_secs,
        }
    }

    /// Resolve one key to an access URL.
    ///
    /// None/empty keys resolve to None; pass-through keys come back
    /// unchanged; issuance failure falls back to the original key.
    pub async fn resolve(&self, key: Option<&str>, ctx: TtlContext) -> Option<String> {
        let key = match key {
            Some(k) if !k.is_empty() => k,
            _ => return None,
        };

        if PASSTHROUGH_PREFIXES.iter().any(|p| key.starts_with(p)) {
            return Some(key.to_string());
        }

        match self.issuer.issue(key, self.ttl_for(ctx)).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(object_key = %key, error = %e, "Credential issuance failed, falling back to raw key");
                Some(key.to_string())
            }
        }
    }

    /// Resolve a batch of keys concurrently. Each key succeeds or degrades
    /// on its own; one failing resolution never blocks the others.
    pub async fn resolve_many(
        &self,
        keys: Vec<Option<String>>,
        ctx: TtlContext,
    ) -> Vec<Option<String>> {
        join_all(
            keys.iter()
                .map(|key| self.resolve(key.as_deref(), ctx)),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, Result};
    use crate::services::url_signer::UrlSigner;
    use async_trait::async_trait;

    struct FailingIssuer;

    #[async_trait]
    impl CredentialIssuer for FailingIssuer {
        async fn issue(&self, _object_key: &str, _ttl_seconds: u32) -> Result<String> {
            Err(AppError::Internal("object store unreachable".into()))
        }
    }

    fn broker() -> MediaBroker {
        let signer = UrlSigner::new("secret".to_string(), "cdn.example.com".to_string());
        MediaBroker::new(Arc::new(signer), 86400, 300)
    }

    #[tokio::test]
    async fn null_and_empty_keys_resolve_to_none() {
        let broker = broker();
        assert_eq!(broker.resolve(None, TtlContext::FeedDisplay).await, None);
        assert_eq!(broker.resolve(Some(""), TtlContext::FeedDisplay).await, None);
    }

    #[tokio::test]
    async fn ephemeral_tokens_pass_through_unchanged() {
        let broker = broker();
        let key = "blob:c0ffee-1234";
        assert_eq!(
            broker.resolve(Some(key), TtlContext::EditPreview).await,
            Some(key.to_string())
        );
    }

    #[tokio::test]
    async fn stored_keys_get_signed_urls() {
        let broker = broker();
        let url = broker
            .resolve(Some("avatars/a.jpg"), TtlContext::FeedDisplay)
            .await
            .unwrap();
        assert!(url.starts_with("https://cdn.example.com/avatars/a.jpg?exp="));
        assert!(url.contains("&sig="));
    }

    #[tokio::test]
    async fn issuance_failure_degrades_to_original_key() {
        let broker = MediaBroker::new(Arc::new(FailingIssuer), 86400, 300);
        assert_eq!(
            broker
                .resolve(Some("posts/img.png"), TtlContext::FeedDisplay)
                .await,
            Some("posts/img.png".to_string())
        );
    }

    #[tokio::test]
    async fn batch_resolution_isolates_failures() {
        let broker = MediaBroker::new(Arc::new(FailingIssuer), 86400, 300);
        let resolved = broker
            .resolve_many(
                vec![
                    Some("a.jpg".to_string()),
                    None,
                    Some("blob:preview".to_string()),
                ],
                TtlContext::FeedDisplay,
            )
            .await;
        assert_eq!(
            resolved,
            vec![
                Some("a.jpg".to_string()),
                None,
                Some("blob:preview".to_string()),
            ]
        );
    }
}
