//! Reporting layer
//!
//! Read-only aggregate reports over the resource catalog and activity logs.
//! Nothing is cached or materialized: every report aggregates on read.
//!
//! ## Reports
//!
//! - **Dashboard**: all-time totals, top-5 resources, top-10 interaction
//!   categories, the 10 newest downloads and interactions
//! - **Resource analytics**: downloads per resource category, top-10
//!   resources, and the 30-day download trend
//! - **Resource stats**: log count vs. denormalized counter for one resource

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::db::{CategoryCount, LinkInteraction, Resource, ResourceDownload};
use crate::store::{Stores, MAX_LIST_RESULTS};
use crate::types::{ApiError, Result};

/// Resources listed in the dashboard's popularity ranking
pub const DASHBOARD_TOP_RESOURCES: usize = 5;
/// Rows in category breakdowns and the analytics popularity ranking
pub const TOP_N: usize = 10;
/// Entries in "recent activity" lists
pub const RECENT_LIMIT: usize = 10;
/// Look-back of the download trend window
pub const TREND_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub summary: SummaryTotals,
    pub interaction_categories: Vec<CategoryCount>,
    pub recent_activity: RecentActivity,
}

#[derive(Debug, Serialize)]
pub struct SummaryTotals {
    pub total_downloads: u64,
    pub total_interactions: u64,
    pub popular_resources: Vec<Resource>,
}

#[derive(Debug, Serialize)]
pub struct RecentActivity {
    pub downloads: Vec<ResourceDownload>,
    pub interactions: Vec<LinkInteraction>,
}

#[derive(Debug, Serialize)]
pub struct ResourceAnalytics {
    pub downloads_by_category: Vec<CategoryCount>,
    pub most_downloaded: Vec<Resource>,
    pub recent_downloads_count: usize,
    pub download_trend: Vec<ResourceDownload>,
}

#[derive(Debug, Serialize)]
pub struct ResourceStats {
    pub resource_id: String,
    /// Count of download-log records
    pub total_downloads: u64,
    /// The resource's own denormalized counter
    pub resource_download_count: i64,
    pub recent_downloads: Vec<ResourceDownload>,
}

/// Aggregate queries over the injected stores
#[derive(Clone)]
pub struct ReportingService {
    stores: Stores,
}

impl ReportingService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn dashboard(&self) -> Result<DashboardSummary> {
        let s = &self.stores;

        let (total_downloads, popular_resources, total_interactions, categories, downloads, interactions) = tokio::try_join!(
            s.timed("count_all_downloads", s.activity.count_all_downloads()),
            s.timed(
                "top_by_downloads",
                s.resources.top_by_downloads(DASHBOARD_TOP_RESOURCES)
            ),
            s.timed("count_interactions", s.activity.count_interactions()),
            s.timed(
                "interaction_categories",
                s.activity.interaction_categories(TOP_N)
            ),
            s.timed(
                "recent_downloads",
                s.activity.recent_downloads(None, RECENT_LIMIT)
            ),
            s.timed(
                "recent_interactions",
                s.activity.recent_interactions(RECENT_LIMIT)
            ),
        )?;

        Ok(DashboardSummary {
            summary: SummaryTotals {
                total_downloads,
                total_interactions,
                popular_resources,
            },
            interaction_categories: categories,
            recent_activity: RecentActivity {
                downloads,
                interactions,
            },
        })
    }

    pub async fn resource_analytics(&self) -> Result<ResourceAnalytics> {
        self.resource_analytics_at(Utc::now()).await
    }

    /// Resource analytics with the trend window anchored at `now`.
    ///
    /// The window is inclusive: a download at exactly `now - 30 days` counts.
    pub async fn resource_analytics_at(&self, now: DateTime<Utc>) -> Result<ResourceAnalytics> {
        let s = &self.stores;
        let cutoff = now - Duration::days(TREND_WINDOW_DAYS);

        let (downloads_by_category, most_downloaded, download_trend) = tokio::try_join!(
            self.downloads_by_category(),
            s.timed("top_by_downloads", s.resources.top_by_downloads(TOP_N)),
            s.timed(
                "downloads_since",
                s.activity.downloads_since(cutoff, MAX_LIST_RESULTS)
            ),
        )?;

        Ok(ResourceAnalytics {
            downloads_by_category,
            most_downloaded,
            recent_downloads_count: download_trend.len(),
            download_trend,
        })
    }

    /// Join downloads to their resource's category and count per category.
    ///
    /// Downloads whose resource no longer exists are skipped.
    async fn downloads_by_category(&self) -> Result<Vec<CategoryCount>> {
        let s = &self.stores;

        let per_resource = s
            .timed(
                "download_counts_by_resource",
                s.activity.download_counts_by_resource(),
            )
            .await?;
        if per_resource.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = per_resource.iter().map(|(id, _)| id.clone()).collect();
        let resources = s.timed("get_many", s.resources.get_many(&ids)).await?;
        let category_of: HashMap<&str, &str> = resources
            .iter()
            .map(|r| (r.id.as_str(), r.category.as_str()))
            .collect();

        let mut totals: HashMap<&str, i64> = HashMap::new();
        let mut orphaned = 0u64;
        for (resource_id, count) in &per_resource {
            match category_of.get(resource_id.as_str()) {
                Some(category) => *totals.entry(category).or_default() += *count as i64,
                None => orphaned += count,
            }
        }
        if orphaned > 0 {
            debug!(orphaned, "Skipped downloads referencing missing resources");
        }

        let mut rows: Vec<CategoryCount> = totals
            .into_iter()
            .map(|(category, count)| CategoryCount {
                category: Some(category.to_string()),
                count,
            })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
        rows.truncate(TOP_N);
        Ok(rows)
    }

    /// Download statistics for one resource; NotFound if it is absent
    pub async fn resource_stats(&self, resource_id: &str) -> Result<ResourceStats> {
        let s = &self.stores;

        let resource = s
            .timed("get_resource", s.resources.get(resource_id))
            .await?
            .ok_or_else(ApiError::resource_not_found)?;

        let (total_downloads, recent_downloads) = tokio::try_join!(
            s.timed("count_downloads", s.activity.count_downloads(resource_id)),
            s.timed(
                "recent_downloads",
                s.activity.recent_downloads(Some(resource_id), RECENT_LIMIT)
            ),
        )?;

        Ok(ResourceStats {
            resource_id: resource_id.to_string(),
            total_downloads,
            resource_download_count: resource.download_count,
            recent_downloads,
        })
    }
}
