//! Resource catalog endpoints
//!
//! - GET  /api/resources?category=&featured=
//! - POST /api/resources
//! - GET  /api/resources/{id}
//! - GET  /api/resources/{id}/download?session_id=
//! - GET  /api/resources/{id}/stats

use hyper::Response;
use serde::Deserialize;
use tracing::info;

use super::response::{file_response, ok, FullBody};
use super::RequestParts;
use crate::db::{NewResource, ResourceFilter};
use crate::server::AppState;
use crate::types::{ApiError, Result};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub featured: Option<String>,
}

impl ListQuery {
    /// Filters are AND-ed; an empty `category` means no category filter
    pub fn into_filter(self) -> Result<ResourceFilter> {
        let featured = match self.featured.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_flag(raw).ok_or_else(|| {
                ApiError::Validation(format!("Invalid value for 'featured': {}", raw))
            })?),
        };
        Ok(ResourceFilter {
            category: self.category.filter(|c| !c.is_empty()),
            featured,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Default, Deserialize)]
struct DownloadQuery {
    session_id: Option<String>,
}

/// GET /api/resources
pub async fn list(state: &AppState, req: &RequestParts) -> Result<Response<FullBody>> {
    let filter = req.query::<ListQuery>()?.into_filter()?;
    let stores = &state.stores;
    let resources = stores
        .timed("list_resources", stores.resources.list(&filter))
        .await?;
    Ok(ok(&resources))
}

/// POST /api/resources
pub async fn create(state: &AppState, req: &RequestParts) -> Result<Response<FullBody>> {
    let new: NewResource = req.json()?;
    let stores = &state.stores;
    let resource = stores
        .timed("create_resource", stores.resources.create(new))
        .await?;
    info!(resource_id = %resource.id, category = %resource.category, "Resource created");
    Ok(ok(&resource))
}

/// GET /api/resources/{id}
pub async fn get(state: &AppState, id: &str) -> Result<Response<FullBody>> {
    let stores = &state.stores;
    let resource = stores
        .timed("get_resource", stores.resources.get(id))
        .await?
        .ok_or_else(ApiError::resource_not_found)?;
    Ok(ok(&resource))
}

/// GET /api/resources/{id}/download
pub async fn download(
    state: &AppState,
    req: &RequestParts,
    id: &str,
) -> Result<Response<FullBody>> {
    let query: DownloadQuery = req.query()?;
    let download = state
        .downloads
        .download(id, query.session_id, &req.client_info())
        .await?;
    Ok(file_response(download))
}

/// GET /api/resources/{id}/stats
pub async fn stats(state: &AppState, id: &str) -> Result<Response<FullBody>> {
    let stats = state.reporting.resource_stats(id).await?;
    Ok(ok(&stats))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::TestApp;
    use super::super::RequestParts;
    use super::*;
    use hyper::header;
    use hyper::{Method, StatusCode};
    use serde_json::Value;

    fn resource_json(title: &str, category: &str, file_path: &str, featured: bool) -> String {
        serde_json::json!({
            "title": title,
            "description": format!("About {}", title),
            "type": "pdf",
            "category": category,
            "file_path": file_path,
            "featured": featured,
            "metadata": { "pages": 12 }
        })
        .to_string()
    }

    async fn create(app: &TestApp, title: &str, category: &str, file_path: &str, featured: bool) -> Value {
        let (status, body) = app
            .post("/api/resources", &resource_json(title, category, file_path, featured))
            .await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    #[test]
    fn test_list_query_parsing() {
        let filter = ListQuery {
            category: Some(String::new()),
            featured: Some("Yes".into()),
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter, ResourceFilter { category: None, featured: Some(true) });

        let filter = ListQuery::default().into_filter().unwrap();
        assert_eq!(filter, ResourceFilter::default());

        let err = ListQuery {
            category: None,
            featured: Some("maybe".into()),
        }
        .into_filter()
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_assigns_server_fields() {
        let app = TestApp::new();
        let body = create(&app, "T", "guides", "guides/t.pdf", false).await;

        assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));
        assert_eq!(body["type"], "pdf");
        assert_eq!(body["download_count"], 0);
        assert_eq!(body["created_at"], body["updated_at"]);
        assert_eq!(body["metadata"]["pages"], 12);

        let id = body["id"].as_str().unwrap();
        let (status, fetched) = app.get(&format!("/api/resources/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, body);
    }

    #[tokio::test]
    async fn test_create_rejects_malformed_body() {
        let app = TestApp::new();
        let (status, body) = app.post("/api/resources", r#"{"title":"only"}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].is_string());

        let (status, _) = app.post("/api/resources", "not json").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (_, listed) = app.get("/api/resources").await;
        assert!(listed.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_are_anded() {
        let app = TestApp::new();
        create(&app, "a", "guides", "guides/a.pdf", true).await;
        create(&app, "b", "guides", "guides/b.pdf", false).await;
        create(&app, "c", "whitepapers", "whitepapers/c.pdf", true).await;

        let titles = |v: &Value| -> Vec<String> {
            v.as_array()
                .unwrap()
                .iter()
                .map(|r| r["title"].as_str().unwrap().to_string())
                .collect()
        };

        let (_, all) = app.get("/api/resources").await;
        assert_eq!(titles(&all), vec!["a", "b", "c"]);

        let (_, guides) = app.get("/api/resources?category=guides").await;
        assert_eq!(titles(&guides), vec!["a", "b"]);

        let (_, featured) = app.get("/api/resources?featured=true").await;
        assert_eq!(titles(&featured), vec!["a", "c"]);

        let (_, both) = app.get("/api/resources?category=guides&featured=true").await;
        assert_eq!(titles(&both), vec!["a"]);

        let (_, empty_category) = app.get("/api/resources?category=").await;
        assert_eq!(titles(&empty_category), vec!["a", "b", "c"]);

        let (status, _) = app.get("/api/resources?featured=sometimes").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_unknown_resource_is_404() {
        let app = TestApp::new();
        for path in [
            "/api/resources/missing",
            "/api/resources/missing/download",
            "/api/resources/missing/stats",
        ] {
            let (status, body) = app.get(path).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{}", path);
            assert_eq!(body["detail"], "Resource not found");
        }
    }

    #[tokio::test]
    async fn test_download_then_stats() {
        let app = TestApp::new();
        app.state.files.write("guides/t.pdf", b"%PDF-1.7 sample").await.unwrap();
        let created = create(&app, "T", "guides", "guides/t.pdf", false).await;
        let id = created["id"].as_str().unwrap().to_string();

        for _ in 0..2 {
            let mut req = RequestParts::new(Method::GET, format!("/api/resources/{}/download", id));
            req.query = Some("session_id=sess-42".into());
            req.peer = Some("198.51.100.4:40000".parse().unwrap());
            req.headers.insert(header::USER_AGENT, "Mozilla/5.0".parse().unwrap());

            let resp = super::super::dispatch(&app.state, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(
                resp.headers().get(header::CONTENT_TYPE).unwrap(),
                "application/octet-stream"
            );
            assert_eq!(
                resp.headers().get(header::CONTENT_DISPOSITION).unwrap(),
                "attachment; filename=\"t.pdf\""
            );
            use http_body_util::BodyExt;
            let body = resp.into_body().collect().await.unwrap().to_bytes();
            assert_eq!(&body[..], b"%PDF-1.7 sample");
        }

        let (status, stats) = app.get(&format!("/api/resources/{}/stats", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["resource_id"], id.as_str());
        assert_eq!(stats["total_downloads"], 2);
        assert_eq!(stats["resource_download_count"], 2);
        let recent = stats["recent_downloads"].as_array().unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0]["session_id"], "sess-42");
        assert_eq!(recent[0]["ip_address"], "198.51.100.4");
        assert_eq!(recent[0]["user_agent"], "Mozilla/5.0");

        let (_, fetched) = app.get(&format!("/api/resources/{}", id)).await;
        assert_eq!(fetched["download_count"], 2);
    }

    #[tokio::test]
    async fn test_download_missing_file_leaves_counter() {
        let app = TestApp::new();
        let created = create(&app, "T", "guides", "guides/absent.pdf", false).await;
        let id = created["id"].as_str().unwrap();

        let (status, body) = app.get(&format!("/api/resources/{}/download", id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "File not found");

        let (_, fetched) = app.get(&format!("/api/resources/{}", id)).await;
        assert_eq!(fetched["download_count"], 0);
        let (_, stats) = app.get(&format!("/api/resources/{}/stats", id)).await;
        assert_eq!(stats["total_downloads"], 0);
    }
}
