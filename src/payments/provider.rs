use crate::payments::error::PaymentResult;
use crate::payments::types::AccessToken;
use async_trait::async_trait;

/// Source of bearer tokens for the provider API
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Fetch a fresh token. Implementations must not cache.
    async fn access_token(&self) -> PaymentResult<AccessToken>;
}
