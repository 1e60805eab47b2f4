//! Append-only activity records: downloads, link interactions, analytics
//! events and status-check pings.

use bson::{doc, Document};
use chrono::{DateTime, Utc};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use super::{timestamp, Metadata};
use crate::db::mongo::{Identified, IntoIndexes};

pub const DOWNLOAD_COLLECTION: &str = "resource_downloads";
pub const INTERACTION_COLLECTION: &str = "link_interactions";
pub const EVENT_COLLECTION: &str = "analytics_events";
pub const STATUS_CHECK_COLLECTION: &str = "status_checks";

/// Request-derived client details attached to tracked records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

/// One successful resource download.
///
/// `resource_id` is a soft reference: the resource may no longer exist.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ResourceDownload {
    pub id: String,
    pub resource_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl ResourceDownload {
    pub fn new(resource_id: &str, session_id: Option<String>, client: &ClientInfo) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            resource_id: resource_id.to_string(),
            session_id,
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
            referrer: client.referrer.clone(),
            timestamp: timestamp::now(),
        }
    }
}

/// A click/download/view action on a named link
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LinkInteraction {
    pub id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    pub link_id: String,
    pub link_category: String,
    /// click, download, view
    pub action_type: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl LinkInteraction {
    pub fn new(
        link_id: String,
        link_category: String,
        action_type: &str,
        session_id: Option<String>,
        client: &ClientInfo,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id,
            link_id,
            link_category,
            action_type: action_type.to_string(),
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
            referrer: client.referrer.clone(),
            metadata: Metadata::new(),
            timestamp: timestamp::now(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Generic UI analytics event (page views, custom events)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AnalyticsEvent {
    pub id: String,
    pub event_type: String,
    pub element_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub page_url: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub fn new(event_type: String, element_id: String, client: &ClientInfo) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type,
            element_id,
            session_id: None,
            page_url: None,
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
            metadata: Metadata::new(),
            timestamp: timestamp::now(),
        }
    }
}

/// Client liveness ping recorded via `POST /api/status`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StatusCheck {
    pub id: String,
    pub client_name: String,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl StatusCheck {
    pub fn new(client_name: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            client_name,
            timestamp: timestamp::now(),
        }
    }
}

/// `{ "_id": <group key>, "count": n }` row produced by grouping pipelines.
///
/// The key is null when the grouped field was missing on the source records.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CategoryCount {
    #[serde(rename = "_id")]
    pub category: Option<String>,
    pub count: i64,
}

impl IntoIndexes for ResourceDownload {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (doc! { "resource_id": 1 }, None),
            (doc! { "timestamp": 1 }, None),
        ]
    }
}

impl IntoIndexes for LinkInteraction {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (doc! { "link_category": 1 }, None),
            (doc! { "timestamp": 1 }, None),
        ]
    }
}

impl IntoIndexes for AnalyticsEvent {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(doc! { "event_type": 1, "timestamp": -1 }, None)]
    }
}

impl IntoIndexes for StatusCheck {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        Vec::new()
    }
}

impl Identified for ResourceDownload {
    fn id_mut(&mut self) -> &mut String {
        &mut self.id
    }
}

impl Identified for LinkInteraction {
    fn id_mut(&mut self) -> &mut String {
        &mut self.id
    }
}

impl Identified for AnalyticsEvent {
    fn id_mut(&mut self) -> &mut String {
        &mut self.id
    }
}

impl Identified for StatusCheck {
    fn id_mut(&mut self) -> &mut String {
        &mut self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_copies_client_info() {
        let client = ClientInfo {
            ip_address: Some("203.0.113.7".into()),
            user_agent: Some("curl/8".into()),
            referrer: None,
        };
        let download = ResourceDownload::new("r-1", Some("sess".into()), &client);
        assert_eq!(download.resource_id, "r-1");
        assert_eq!(download.ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(download.session_id.as_deref(), Some("sess"));
    }

    #[test]
    fn test_category_count_wire_shape() {
        let row = CategoryCount {
            category: Some("download".into()),
            count: 3,
        };
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            serde_json::json!({ "_id": "download", "count": 3 })
        );
    }
}
