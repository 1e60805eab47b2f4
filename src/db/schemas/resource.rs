//! Resource document schema
//!
//! A downloadable marketing asset (case study, whitepaper, guide, ...).

use bson::{doc, Document};
use chrono::{DateTime, Utc};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use super::{timestamp, Metadata};
use crate::db::mongo::{Identified, IntoIndexes};

/// Collection name for resources
pub const RESOURCE_COLLECTION: &str = "resources";

/// Resource document stored in MongoDB and returned by the API
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Resource {
    /// Application-level identifier (UUID v4)
    pub id: String,

    pub title: String,

    pub description: String,

    /// Free-form type tag, e.g. "pdf"
    #[serde(rename = "type")]
    pub resource_type: String,

    /// case-studies, whitepapers, guides, presentations, ...
    pub category: String,

    /// Path relative to the resource root
    pub file_path: String,

    /// Size of the backing file in bytes, if known
    #[serde(default)]
    pub file_size: Option<i64>,

    /// Server-maintained; only ever incremented
    #[serde(default)]
    pub download_count: i64,

    #[serde(default)]
    pub featured: bool,

    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,

    /// Refreshed whenever `download_count` changes
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub metadata: Metadata,
}

/// Client-supplied fields for creating a resource
#[derive(Deserialize, Clone, Debug)]
pub struct NewResource {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub category: String,
    pub file_path: String,
    #[serde(default)]
    pub file_size: Option<i64>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Resource {
    /// Build a fresh resource: new id, zero downloads, both timestamps now
    pub fn from_new(new: NewResource) -> Self {
        let now = timestamp::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: new.title,
            description: new.description,
            resource_type: new.resource_type,
            category: new.category,
            file_path: new.file_path,
            file_size: new.file_size,
            download_count: 0,
            featured: new.featured,
            created_at: now,
            updated_at: now,
            metadata: new.metadata,
        }
    }
}

/// Filter for listing resources; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceFilter {
    pub category: Option<String>,
    pub featured: Option<bool>,
}

impl ResourceFilter {
    pub fn matches(&self, resource: &Resource) -> bool {
        if let Some(ref category) = self.category {
            if resource.category != *category {
                return false;
            }
        }
        if let Some(featured) = self.featured {
            if resource.featured != featured {
                return false;
            }
        }
        true
    }

    pub fn to_filter(&self) -> Document {
        let mut filter = doc! {};
        if let Some(ref category) = self.category {
            filter.insert("category", category.clone());
        }
        if let Some(featured) = self.featured {
            filter.insert("featured", featured);
        }
        filter
    }
}

impl IntoIndexes for Resource {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("id_unique".to_string())
                        .build(),
                ),
            ),
            (doc! { "category": 1 }, None),
            (doc! { "featured": 1 }, None),
            // Popularity rankings
            (doc! { "download_count": -1 }, None),
        ]
    }
}

impl Identified for Resource {
    fn id_mut(&mut self) -> &mut String {
        &mut self.id
    }
}
