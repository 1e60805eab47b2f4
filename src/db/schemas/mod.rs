//! Database schemas
//!
//! MongoDB document structures for the resource catalog and the activity logs.

mod activity;
mod resource;
pub mod timestamp;

pub use activity::{
    AnalyticsEvent, CategoryCount, ClientInfo, LinkInteraction, ResourceDownload, StatusCheck,
    DOWNLOAD_COLLECTION, EVENT_COLLECTION, INTERACTION_COLLECTION, STATUS_CHECK_COLLECTION,
};
pub use resource::{NewResource, Resource, ResourceFilter, RESOURCE_COLLECTION};

/// Open key-value bag attached to resources, interactions and events
pub type Metadata = serde_json::Map<String, serde_json::Value>;
