//! OAuth token state for provider access
//!
//! Token state is an explicit value owned by whoever drives the provider
//! client — nothing global, nothing hidden in a session. The store checks
//! expiry against a caller-supplied clock so tests never sleep.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::Result;

/// A full set of provider tokens with their expiry times
#[derive(Debug, Clone)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

impl TokenSet {
    pub fn access_token_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.access_expires_at
    }

    pub fn refresh_token_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.refresh_expires_at
    }
}

/// Where fresh tokens come from (the provider's token endpoint)
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Obtain a brand-new token set using the configured credentials
    async fn obtain(&self) -> Result<TokenSet>;

    /// Exchange a still-valid refresh token for a new set
    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet>;
}

/// Holds the current token set and refreshes it on expiry
#[derive(Debug, Default)]
pub struct TokenStore {
    tokens: Option<TokenSet>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: TokenSet) -> Self {
        Self {
            tokens: Some(tokens),
        }
    }

    pub fn tokens(&self) -> Option<&TokenSet> {
        self.tokens.as_ref()
    }

    /// A valid access token, refreshing or re-obtaining as needed
    pub async fn access_token<S: TokenSource>(
        &mut self,
        source: &S,
        now: DateTime<Utc>,
    ) -> Result<String> {
        if let Some(tokens) = &self.tokens {
            if tokens.access_token_valid(now) && tokens.refresh_token_valid(now) {
                return Ok(tokens.access_token.clone());
            }
            if tokens.refresh_token_valid(now) {
                debug!("Access token expired, refreshing.");
                let fresh = source.refresh(&tokens.refresh_token).await?;
                let access_token = fresh.access_token.clone();
                self.tokens = Some(fresh);
                return Ok(access_token);
            }
            debug!("Both tokens expired, requesting a new set.");
        }
        let fresh = source.obtain().await?;
        let access_token = fresh.access_token.clone();
        self.tokens = Some(fresh);
        Ok(access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        obtained: AtomicUsize,
        refreshed: AtomicUsize,
    }

    impl CountingSource {
        fn new() -> Self {
            Self {
                obtained: AtomicUsize::new(0),
                refreshed: AtomicUsize::new(0),
            }
        }

        fn set(&self, label: &str) -> TokenSet {
            TokenSet {
                access_token: format!("access-{}", label),
                refresh_token: format!("refresh-{}", label),
                access_expires_at: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
                refresh_expires_at: Utc.with_ymd_and_hms(2031, 1, 1, 0, 0, 0).unwrap(),
            }
        }
    }

    #[async_trait]
    impl TokenSource for CountingSource {
        async fn obtain(&self) -> Result<TokenSet> {
            self.obtained.fetch_add(1, Ordering::SeqCst);
            Ok(self.set("obtained"))
        }

        async fn refresh(&self, _refresh_token: &str) -> Result<TokenSet> {
            self.refreshed.fetch_add(1, Ordering::SeqCst);
            Ok(self.set("refreshed"))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_empty_store_obtains_a_new_set() {
        let source = CountingSource::new();
        let mut store = TokenStore::new();
        let token = store.access_token(&source, now()).await.unwrap();
        assert_eq!(token, "access-obtained");
        assert_eq!(source.obtained.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_valid_tokens_are_reused() {
        let source = CountingSource::new();
        let mut store = TokenStore::with_tokens(source.set("cached"));
        let token = store.access_token(&source, now()).await.unwrap();
        assert_eq!(token, "access-cached");
        assert_eq!(source.obtained.load(Ordering::SeqCst), 0);
        assert_eq!(source.refreshed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_expired_access_token_triggers_refresh() {
        let source = CountingSource::new();
        let mut expired = source.set("cached");
        expired.access_expires_at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut store = TokenStore::with_tokens(expired);

        let token = store.access_token(&source, now()).await.unwrap();
        assert_eq!(token, "access-refreshed");
        assert_eq!(source.refreshed.load(Ordering::SeqCst), 1);
        assert_eq!(source.obtained.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_expired_refresh_token_obtains_a_full_set() {
        let source = CountingSource::new();
        let mut expired = source.set("cached");
        expired.access_expires_at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        expired.refresh_expires_at = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let mut store = TokenStore::with_tokens(expired);

        let token = store.access_token(&source, now()).await.unwrap();
        assert_eq!(token, "access-obtained");
        assert_eq!(source.obtained.load(Ordering::SeqCst), 1);
    }
}
