//! Resource Store and Interaction/Event Log
//!
//! Both stores are traits so the HTTP layer and reporting layer can run
//! against MongoDB in production and an in-memory backend in dev mode and
//! tests. Handles are constructed once at startup and injected via
//! [`Stores`].

mod memory;
mod mongo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::db::{
    CategoryCount, LinkInteraction, NewResource, Resource, ResourceDownload, ResourceFilter,
    StatusCheck, AnalyticsEvent,
};
use crate::types::{ApiError, Result};

pub use memory::{MemoryActivityLog, MemoryResourceStore};
pub use mongo::{MongoActivityLog, MongoResourceStore};

/// Cap on list-style reads (resources, status checks, trend windows)
pub const MAX_LIST_RESULTS: usize = 1000;

/// Persisted catalog of downloadable resources
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Resources matching the filter, in insertion order
    async fn list(&self, filter: &ResourceFilter) -> Result<Vec<Resource>>;

    async fn get(&self, id: &str) -> Result<Option<Resource>>;

    /// Resources whose id is in `ids`; unknown ids are skipped
    async fn get_many(&self, ids: &[String]) -> Result<Vec<Resource>>;

    /// Persist a new resource with server-assigned fields
    async fn create(&self, new: NewResource) -> Result<Resource>;

    /// Increment `download_count` and refresh `updated_at`.
    ///
    /// A resource that vanished since it was looked up is ignored.
    async fn record_download(&self, id: &str) -> Result<()>;

    /// Top resources by `download_count` descending, ties in insertion order
    async fn top_by_downloads(&self, limit: usize) -> Result<Vec<Resource>>;

    /// Remove every resource, returning how many were deleted (seeding only)
    async fn clear(&self) -> Result<u64>;

    /// Connectivity check for the health endpoint
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    /// Short backend label reported by the health endpoint
    fn backend(&self) -> &'static str;
}

/// Append-only logs of downloads, link interactions, analytics events and
/// status-check pings
#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn append_download(&self, record: ResourceDownload) -> Result<ResourceDownload>;

    async fn append_interaction(&self, record: LinkInteraction) -> Result<LinkInteraction>;

    async fn append_event(&self, record: AnalyticsEvent) -> Result<AnalyticsEvent>;

    async fn append_status_check(&self, record: StatusCheck) -> Result<StatusCheck>;

    async fn list_status_checks(&self, limit: usize) -> Result<Vec<StatusCheck>>;

    /// Download-log count for one resource (independent of its counter)
    async fn count_downloads(&self, resource_id: &str) -> Result<u64>;

    async fn count_all_downloads(&self) -> Result<u64>;

    async fn count_interactions(&self) -> Result<u64>;

    /// Most recent downloads first, optionally for one resource only
    async fn recent_downloads(
        &self,
        resource_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ResourceDownload>>;

    /// Most recent interactions first
    async fn recent_interactions(&self, limit: usize) -> Result<Vec<LinkInteraction>>;

    /// Interactions grouped by `link_category`, count descending
    /// (ties by category ascending)
    async fn interaction_categories(&self, limit: usize) -> Result<Vec<CategoryCount>>;

    /// Downloads grouped by `resource_id` (no ordering guarantee)
    async fn download_counts_by_resource(&self) -> Result<Vec<(String, u64)>>;

    /// Downloads with `timestamp >= cutoff`, oldest first
    async fn downloads_since(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ResourceDownload>>;
}

/// Injected store handles plus the per-call deadline
#[derive(Clone)]
pub struct Stores {
    pub resources: Arc<dyn ResourceStore>,
    pub activity: Arc<dyn ActivityLog>,
    timeout: Duration,
}

impl Stores {
    pub fn new(
        resources: Arc<dyn ResourceStore>,
        activity: Arc<dyn ActivityLog>,
        timeout: Duration,
    ) -> Self {
        Self {
            resources,
            activity,
            timeout,
        }
    }

    /// In-memory backend (dev mode, tests)
    pub fn memory(timeout: Duration) -> Self {
        Self::new(
            Arc::new(MemoryResourceStore::new()),
            Arc::new(MemoryActivityLog::new()),
            timeout,
        )
    }

    /// MongoDB backend; creates collections and indexes
    pub async fn mongo(client: &crate::db::MongoClient, timeout: Duration) -> Result<Self> {
        let resources = MongoResourceStore::new(client).await?;
        let activity = MongoActivityLog::new(client).await?;
        Ok(Self::new(Arc::new(resources), Arc::new(activity), timeout))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one store call under the configured deadline
    pub async fn timed<T, F>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(op, timeout_ms = self.timeout.as_millis() as u64, "Store call timed out");
                Err(ApiError::Timeout(op))
            }
        }
    }
}
