//! MongoDB store backend

use async_trait::async_trait;
use bson::{doc, DateTime as BsonDateTime};
use chrono::{DateTime, Utc};
use mongodb::options::FindOptions;
use serde::Deserialize;

use super::{ActivityLog, ResourceStore};
use crate::db::schemas::{
    DOWNLOAD_COLLECTION, EVENT_COLLECTION, INTERACTION_COLLECTION, RESOURCE_COLLECTION,
    STATUS_CHECK_COLLECTION,
};
use crate::db::{
    AnalyticsEvent, CategoryCount, LinkInteraction, MongoClient, MongoCollection, NewResource,
    Resource, ResourceDownload, ResourceFilter, StatusCheck,
};
use crate::store::MAX_LIST_RESULTS;
use crate::types::Result;

fn limited(limit: usize) -> FindOptions {
    FindOptions::builder().limit(limit as i64).build()
}

fn sorted(sort: bson::Document, limit: usize) -> FindOptions {
    FindOptions::builder().sort(sort).limit(limit as i64).build()
}

pub struct MongoResourceStore {
    client: MongoClient,
    resources: MongoCollection<Resource>,
}

impl MongoResourceStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            client: client.clone(),
            resources: client.collection(RESOURCE_COLLECTION).await?,
        })
    }
}

#[async_trait]
impl ResourceStore for MongoResourceStore {
    async fn list(&self, filter: &ResourceFilter) -> Result<Vec<Resource>> {
        self.resources
            .find_many(filter.to_filter(), Some(limited(MAX_LIST_RESULTS)))
            .await
    }

    async fn get(&self, id: &str) -> Result<Option<Resource>> {
        self.resources.find_one(doc! { "id": id }).await
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<Resource>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.resources
            .find_many(doc! { "id": { "$in": ids.to_vec() } }, None)
            .await
    }

    async fn create(&self, new: NewResource) -> Result<Resource> {
        self.resources.insert_one(Resource::from_new(new)).await
    }

    async fn record_download(&self, id: &str) -> Result<()> {
        // Single-document $inc is atomic; a vanished resource matches nothing
        self.resources
            .update_one(
                doc! { "id": id },
                doc! {
                    "$inc": { "download_count": 1_i64 },
                    "$set": { "updated_at": BsonDateTime::now() },
                },
            )
            .await?;
        Ok(())
    }

    async fn top_by_downloads(&self, limit: usize) -> Result<Vec<Resource>> {
        // _id (ObjectId) ascending approximates insertion order for ties
        self.resources
            .find_many(
                doc! {},
                Some(sorted(doc! { "download_count": -1, "_id": 1 }, limit)),
            )
            .await
    }

    async fn clear(&self) -> Result<u64> {
        self.resources.delete_many(doc! {}).await
    }

    async fn ping(&self) -> Result<()> {
        self.client.ping().await
    }

    fn backend(&self) -> &'static str {
        "mongodb"
    }
}

pub struct MongoActivityLog {
    downloads: MongoCollection<ResourceDownload>,
    interactions: MongoCollection<LinkInteraction>,
    events: MongoCollection<AnalyticsEvent>,
    status_checks: MongoCollection<StatusCheck>,
}

impl MongoActivityLog {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            downloads: client.collection(DOWNLOAD_COLLECTION).await?,
            interactions: client.collection(INTERACTION_COLLECTION).await?,
            events: client.collection(EVENT_COLLECTION).await?,
            status_checks: client.collection(STATUS_CHECK_COLLECTION).await?,
        })
    }
}

/// Output row of the `$group` by resource_id pipeline
#[derive(Deserialize)]
struct ResourceCount {
    #[serde(rename = "_id")]
    resource_id: Option<String>,
    count: i64,
}

#[async_trait]
impl ActivityLog for MongoActivityLog {
    async fn append_download(&self, record: ResourceDownload) -> Result<ResourceDownload> {
        self.downloads.insert_one(record).await
    }

    async fn append_interaction(&self, record: LinkInteraction) -> Result<LinkInteraction> {
        self.interactions.insert_one(record).await
    }

    async fn append_event(&self, record: AnalyticsEvent) -> Result<AnalyticsEvent> {
        self.events.insert_one(record).await
    }

    async fn append_status_check(&self, record: StatusCheck) -> Result<StatusCheck> {
        self.status_checks.insert_one(record).await
    }

    async fn list_status_checks(&self, limit: usize) -> Result<Vec<StatusCheck>> {
        self.status_checks.find_many(doc! {}, Some(limited(limit))).await
    }

    async fn count_downloads(&self, resource_id: &str) -> Result<u64> {
        self.downloads.count(doc! { "resource_id": resource_id }).await
    }

    async fn count_all_downloads(&self) -> Result<u64> {
        self.downloads.count(doc! {}).await
    }

    async fn count_interactions(&self) -> Result<u64> {
        self.interactions.count(doc! {}).await
    }

    async fn recent_downloads(
        &self,
        resource_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ResourceDownload>> {
        let filter = match resource_id {
            Some(id) => doc! { "resource_id": id },
            None => doc! {},
        };
        self.downloads
            .find_many(filter, Some(sorted(doc! { "timestamp": -1 }, limit)))
            .await
    }

    async fn recent_interactions(&self, limit: usize) -> Result<Vec<LinkInteraction>> {
        self.interactions
            .find_many(doc! {}, Some(sorted(doc! { "timestamp": -1 }, limit)))
            .await
    }

    async fn interaction_categories(&self, limit: usize) -> Result<Vec<CategoryCount>> {
        let pipeline = vec![
            doc! { "$group": { "_id": "$link_category", "count": { "$sum": 1 } } },
            doc! { "$sort": { "count": -1, "_id": 1 } },
            doc! { "$limit": limit as i64 },
        ];
        self.interactions.aggregate(pipeline).await
    }

    async fn download_counts_by_resource(&self) -> Result<Vec<(String, u64)>> {
        let pipeline = vec![doc! {
            "$group": { "_id": "$resource_id", "count": { "$sum": 1 } }
        }];
        let rows: Vec<ResourceCount> = self.downloads.aggregate(pipeline).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.resource_id.map(|id| (id, row.count.max(0) as u64)))
            .collect())
    }

    async fn downloads_since(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ResourceDownload>> {
        self.downloads
            .find_many(
                doc! { "timestamp": { "$gte": BsonDateTime::from_chrono(cutoff) } },
                Some(sorted(doc! { "timestamp": 1 }, limit)),
            )
            .await
    }
}
