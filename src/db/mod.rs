//! Database layer
//!
//! MongoDB client, typed collections, and the document schemas for the
//! resource catalog and activity logs.

pub mod mongo;
pub mod schemas;

pub use mongo::{MongoClient, MongoCollection};
pub use schemas::{
    AnalyticsEvent, CategoryCount, ClientInfo, LinkInteraction, Metadata, NewResource, Resource,
    ResourceDownload, ResourceFilter, StatusCheck,
};
