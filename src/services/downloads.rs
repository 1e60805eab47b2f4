//! Resource download flow
//!
//! A download is served only after the resource exists and its file is on
//! disk. Three writes then run concurrently and independently:
//!
//! 1. download-log insert
//! 2. link-interaction insert (`link_category = "download"`)
//! 3. `download_count` increment on the resource
//!
//! None of them is rolled back if another fails; the request fails with the
//! first error and whatever completed stays written.

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::db::{ClientInfo, LinkInteraction, Metadata, Resource, ResourceDownload};
use crate::files::{ResourceFile, ResourceFiles};
use crate::store::Stores;
use crate::types::{ApiError, Result};

/// Link category and action type of download interactions
pub const DOWNLOAD_CATEGORY: &str = "download";

/// A completed download, ready to stream back
#[derive(Debug)]
pub struct Download {
    pub resource: Resource,
    pub file: ResourceFile,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct DownloadService {
    stores: Stores,
    files: ResourceFiles,
}

impl DownloadService {
    pub fn new(stores: Stores, files: ResourceFiles) -> Self {
        Self { stores, files }
    }

    pub async fn download(
        &self,
        resource_id: &str,
        session_id: Option<String>,
        client: &ClientInfo,
    ) -> Result<Download> {
        let s = &self.stores;

        let resource = s
            .timed("get_resource", s.resources.get(resource_id))
            .await?
            .ok_or_else(ApiError::resource_not_found)?;

        let file = match self.files.locate(&resource.file_path).await {
            Ok(file) => file,
            Err(e) => {
                warn!(
                    resource_id,
                    file_path = %resource.file_path,
                    "Resource file missing, download not recorded"
                );
                return Err(e);
            }
        };

        let record = ResourceDownload::new(&resource.id, session_id.clone(), client);
        let interaction = LinkInteraction::new(
            format!("download-{}", resource.id),
            DOWNLOAD_CATEGORY.to_string(),
            DOWNLOAD_CATEGORY,
            session_id,
            client,
        )
        .with_metadata(download_metadata(&resource));

        let (logged, interacted, counted) = tokio::join!(
            s.timed("append_download", s.activity.append_download(record)),
            s.timed("append_interaction", s.activity.append_interaction(interaction)),
            s.timed("record_download", s.resources.record_download(&resource.id)),
        );

        for (op, result) in [
            ("append_download", logged.map(|_| ())),
            ("append_interaction", interacted.map(|_| ())),
            ("record_download", counted),
        ] {
            if let Err(e) = result {
                warn!(op, resource_id, error = %e, "Download write failed");
                return Err(e);
            }
        }

        let bytes = file.read().await?;
        debug!(resource_id, bytes = bytes.len(), "Serving resource file");

        Ok(Download {
            resource,
            file,
            bytes,
        })
    }
}

fn download_metadata(resource: &Resource) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("resource_title".into(), Value::from(resource.title.clone()));
    metadata.insert(
        "resource_category".into(),
        Value::from(resource.category.clone()),
    );
    metadata.insert("file_size".into(), json!(resource.file_size.unwrap_or(0)));
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewResource;
    use crate::reporting::ReportingService;
    use std::time::Duration;

    struct Fixture {
        _dir: tempfile::TempDir,
        stores: Stores,
        files: ResourceFiles,
        downloads: DownloadService,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let stores = Stores::memory(Duration::from_secs(5));
        let files = ResourceFiles::new(dir.path());
        let downloads = DownloadService::new(stores.clone(), files.clone());
        Fixture {
            _dir: dir,
            stores,
            files,
            downloads,
        }
    }

    fn guide(file_path: &str) -> NewResource {
        NewResource {
            title: "T".into(),
            description: "d".into(),
            resource_type: "pdf".into(),
            category: "guides".into(),
            file_path: file_path.into(),
            file_size: None,
            featured: false,
            metadata: Metadata::new(),
        }
    }

    fn client() -> ClientInfo {
        ClientInfo {
            ip_address: Some("10.0.0.7".into()),
            user_agent: Some("test-agent".into()),
            referrer: Some("https://example.com/resources".into()),
        }
    }

    #[tokio::test]
    async fn test_download_records_all_three_writes() {
        let fx = fixture();
        fx.files.write("guides/t.pdf", b"%PDF-1.4").await.unwrap();
        let r = fx.stores.resources.create(guide("guides/t.pdf")).await.unwrap();

        let download = fx
            .downloads
            .download(&r.id, Some("sess-1".into()), &client())
            .await
            .unwrap();
        assert_eq!(download.bytes, b"%PDF-1.4");
        assert_eq!(download.file.file_name, "t.pdf");

        let stored = fx.stores.resources.get(&r.id).await.unwrap().unwrap();
        assert_eq!(stored.download_count, 1);
        assert!(stored.updated_at >= r.updated_at);

        let logged = fx.stores.activity.recent_downloads(Some(&r.id), 10).await.unwrap();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].session_id.as_deref(), Some("sess-1"));
        assert_eq!(logged[0].ip_address.as_deref(), Some("10.0.0.7"));
        assert_eq!(logged[0].referrer.as_deref(), Some("https://example.com/resources"));

        let interactions = fx.stores.activity.recent_interactions(10).await.unwrap();
        assert_eq!(interactions.len(), 1);
        let interaction = &interactions[0];
        assert_eq!(interaction.link_id, format!("download-{}", r.id));
        assert_eq!(interaction.link_category, "download");
        assert_eq!(interaction.action_type, "download");
        assert_eq!(interaction.metadata["resource_title"], "T");
        assert_eq!(interaction.metadata["resource_category"], "guides");
        assert_eq!(interaction.metadata["file_size"], 0);
    }

    #[tokio::test]
    async fn test_missing_file_records_nothing() {
        let fx = fixture();
        let r = fx.stores.resources.create(guide("guides/absent.pdf")).await.unwrap();

        let err = fx.downloads.download(&r.id, None, &client()).await.unwrap_err();
        assert_eq!(err.status_code(), hyper::StatusCode::NOT_FOUND);
        assert_eq!(err.detail(), "File not found");

        let stored = fx.stores.resources.get(&r.id).await.unwrap().unwrap();
        assert_eq!(stored.download_count, 0);
        assert_eq!(fx.stores.activity.count_all_downloads().await.unwrap(), 0);
        assert_eq!(fx.stores.activity.count_interactions().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_resource() {
        let fx = fixture();
        let err = fx.downloads.download("nope", None, &client()).await.unwrap_err();
        assert_eq!(err.detail(), "Resource not found");
    }

    #[tokio::test]
    async fn test_repeated_downloads_match_stats() {
        let fx = fixture();
        fx.files.write("guides/t.pdf", b"x").await.unwrap();
        let r = fx.stores.resources.create(guide("guides/t.pdf")).await.unwrap();

        fx.downloads.download(&r.id, None, &client()).await.unwrap();
        fx.downloads.download(&r.id, None, &client()).await.unwrap();

        let stats = ReportingService::new(fx.stores.clone())
            .resource_stats(&r.id)
            .await
            .unwrap();
        assert_eq!(stats.total_downloads, 2);
        assert_eq!(stats.resource_download_count, 2);
        assert_eq!(stats.recent_downloads.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_downloads_count_exactly() {
        let fx = fixture();
        fx.files.write("guides/t.pdf", b"x").await.unwrap();
        let r = fx.stores.resources.create(guide("guides/t.pdf")).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let downloads = fx.downloads.clone();
            let id = r.id.clone();
            handles.push(tokio::spawn(async move {
                downloads.download(&id, None, &ClientInfo::default()).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = fx.stores.resources.get(&r.id).await.unwrap().unwrap();
        assert_eq!(stored.download_count, 20);
        assert_eq!(fx.stores.activity.count_downloads(&r.id).await.unwrap(), 20);
    }
}
