//! In-memory store backend
//!
//! Vectors in insertion order behind `tokio::sync::RwLock`. Used when MongoDB
//! is unavailable in dev mode, and by the test suite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{ActivityLog, ResourceStore};
use crate::db::mongo::Identified;
use crate::db::schemas::timestamp;
use crate::db::{
    AnalyticsEvent, CategoryCount, LinkInteraction, NewResource, Resource, ResourceDownload,
    ResourceFilter, StatusCheck,
};
use crate::store::MAX_LIST_RESULTS;
use crate::types::Result;

#[derive(Default)]
pub struct MemoryResourceStore {
    resources: RwLock<Vec<Resource>>,
}

impl MemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResourceStore for MemoryResourceStore {
    async fn list(&self, filter: &ResourceFilter) -> Result<Vec<Resource>> {
        let resources = self.resources.read().await;
        Ok(resources
            .iter()
            .filter(|r| filter.matches(r))
            .take(MAX_LIST_RESULTS)
            .cloned()
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Resource>> {
        let resources = self.resources.read().await;
        Ok(resources.iter().find(|r| r.id == id).cloned())
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<Resource>> {
        let resources = self.resources.read().await;
        Ok(resources
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn create(&self, new: NewResource) -> Result<Resource> {
        let resource = Resource::from_new(new);
        self.resources.write().await.push(resource.clone());
        Ok(resource)
    }

    async fn record_download(&self, id: &str) -> Result<()> {
        let mut resources = self.resources.write().await;
        if let Some(resource) = resources.iter_mut().find(|r| r.id == id) {
            resource.download_count += 1;
            resource.updated_at = timestamp::now().max(resource.updated_at);
        }
        Ok(())
    }

    async fn top_by_downloads(&self, limit: usize) -> Result<Vec<Resource>> {
        let mut ranked = self.resources.read().await.clone();
        // Stable sort keeps insertion order among equal counts
        ranked.sort_by(|a, b| b.download_count.cmp(&a.download_count));
        ranked.truncate(limit);
        Ok(ranked)
    }

    async fn clear(&self) -> Result<u64> {
        let mut resources = self.resources.write().await;
        let removed = resources.len() as u64;
        resources.clear();
        Ok(removed)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[derive(Default)]
pub struct MemoryActivityLog {
    downloads: RwLock<Vec<ResourceDownload>>,
    interactions: RwLock<Vec<LinkInteraction>>,
    events: RwLock<Vec<AnalyticsEvent>>,
    status_checks: RwLock<Vec<StatusCheck>>,
}

impl MemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }
}

/// Newest-first copy of `records`, truncated to `limit`
fn newest_first<T: Clone>(
    records: &[T],
    timestamp: impl Fn(&T) -> DateTime<Utc>,
    limit: usize,
) -> Vec<T> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| timestamp(b).cmp(&timestamp(a)));
    sorted.truncate(limit);
    sorted
}

#[async_trait]
impl ActivityLog for MemoryActivityLog {
    async fn append_download(&self, mut record: ResourceDownload) -> Result<ResourceDownload> {
        record.ensure_id();
        self.downloads.write().await.push(record.clone());
        Ok(record)
    }

    async fn append_interaction(&self, mut record: LinkInteraction) -> Result<LinkInteraction> {
        record.ensure_id();
        self.interactions.write().await.push(record.clone());
        Ok(record)
    }

    async fn append_event(&self, mut record: AnalyticsEvent) -> Result<AnalyticsEvent> {
        record.ensure_id();
        self.events.write().await.push(record.clone());
        Ok(record)
    }

    async fn append_status_check(&self, mut record: StatusCheck) -> Result<StatusCheck> {
        record.ensure_id();
        self.status_checks.write().await.push(record.clone());
        Ok(record)
    }

    async fn list_status_checks(&self, limit: usize) -> Result<Vec<StatusCheck>> {
        let checks = self.status_checks.read().await;
        Ok(checks.iter().take(limit).cloned().collect())
    }

    async fn count_downloads(&self, resource_id: &str) -> Result<u64> {
        let downloads = self.downloads.read().await;
        Ok(downloads.iter().filter(|d| d.resource_id == resource_id).count() as u64)
    }

    async fn count_all_downloads(&self) -> Result<u64> {
        Ok(self.downloads.read().await.len() as u64)
    }

    async fn count_interactions(&self) -> Result<u64> {
        Ok(self.interactions.read().await.len() as u64)
    }

    async fn recent_downloads(
        &self,
        resource_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ResourceDownload>> {
        let downloads = self.downloads.read().await;
        let matching: Vec<ResourceDownload> = downloads
            .iter()
            .filter(|d| resource_id.map_or(true, |id| d.resource_id == id))
            .cloned()
            .collect();
        Ok(newest_first(&matching, |d| d.timestamp, limit))
    }

    async fn recent_interactions(&self, limit: usize) -> Result<Vec<LinkInteraction>> {
        let interactions = self.interactions.read().await;
        Ok(newest_first(&interactions, |i| i.timestamp, limit))
    }

    async fn interaction_categories(&self, limit: usize) -> Result<Vec<CategoryCount>> {
        let interactions = self.interactions.read().await;
        let mut counts: HashMap<&str, i64> = HashMap::new();
        for interaction in interactions.iter() {
            *counts.entry(interaction.link_category.as_str()).or_default() += 1;
        }

        let mut rows: Vec<CategoryCount> = counts
            .into_iter()
            .map(|(category, count)| CategoryCount {
                category: Some(category.to_string()),
                count,
            })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn download_counts_by_resource(&self) -> Result<Vec<(String, u64)>> {
        let downloads = self.downloads.read().await;
        let mut counts: HashMap<String, u64> = HashMap::new();
        for download in downloads.iter() {
            *counts.entry(download.resource_id.clone()).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn downloads_since(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ResourceDownload>> {
        let downloads = self.downloads.read().await;
        let mut window: Vec<ResourceDownload> = downloads
            .iter()
            .filter(|d| d.timestamp >= cutoff)
            .cloned()
            .collect();
        window.sort_by_key(|d| d.timestamp);
        window.truncate(limit);
        Ok(window)
    }
}
