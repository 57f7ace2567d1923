//! Mutation effect interface.

use async_trait::async_trait;

use super::mutation::Mutation;
use crate::error::Result;

/// Applies a single mutation against the backend.
///
/// Implementations own transport concerns such as timeouts; the executor never
/// retries a failed call.
#[async_trait]
pub trait ModerationBackend: Send + Sync {
    async fn apply(&self, mutation: &Mutation) -> Result<()>;
}
