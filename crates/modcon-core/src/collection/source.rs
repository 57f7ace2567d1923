//! Fetch interface for collection datasets.

use std::collections::HashMap;

use async_trait::async_trait;

use super::model::FetchKey;
use super::record::Record;
use crate::error::Result;
use crate::permission::PermissionSet;

/// Result of one fetch round-trip.
#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    /// Replacement records per requested dataset. Keys the backend did not
    /// answer for are absent and must not be touched by the caller.
    pub datasets: HashMap<FetchKey, Vec<Record>>,
    /// Operator permissions, when the backend sent them along.
    pub permissions: Option<PermissionSet>,
}

/// Retrieves authoritative datasets from the backend.
#[async_trait]
pub trait DashboardSource: Send + Sync {
    async fn fetch(&self, keys: &[FetchKey]) -> Result<DashboardData>;
}

/// Re-fetches datasets after a batch.
///
/// Failures are reported to the operator by the implementation, so callers only
/// learn whether the records were replaced.
#[async_trait]
pub trait Refresher: Send + Sync {
    async fn refresh(&self, keys: &[FetchKey]) -> bool;
}
