//! Status-check pings
//!
//! Clients post their name; the service stores a timestamped record and
//! lists them back.

use hyper::Response;
use serde::Deserialize;

use super::response::{ok, FullBody};
use super::RequestParts;
use crate::db::StatusCheck;
use crate::server::AppState;
use crate::store::MAX_LIST_RESULTS;
use crate::types::Result;

#[derive(Debug, Deserialize)]
pub struct StatusCheckCreate {
    pub client_name: String,
}

/// POST /api/status
pub async fn create_status_check(
    state: &AppState,
    req: &RequestParts,
) -> Result<Response<FullBody>> {
    let input: StatusCheckCreate = req.json()?;
    let stores = &state.stores;
    let check = stores
        .timed(
            "append_status_check",
            stores
                .activity
                .append_status_check(StatusCheck::new(input.client_name)),
        )
        .await?;
    Ok(ok(&check))
}

/// GET /api/status
pub async fn list_status_checks(state: &AppState) -> Result<Response<FullBody>> {
    let stores = &state.stores;
    let checks = stores
        .timed(
            "list_status_checks",
            stores.activity.list_status_checks(MAX_LIST_RESULTS),
        )
        .await?;
    Ok(ok(&checks))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::TestApp;
    use hyper::StatusCode;

    #[tokio::test]
    async fn test_create_and_list() {
        let app = TestApp::new();
        let (status, created) = app
            .post("/api/status", r#"{"client_name":"uptime-probe"}"#)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["client_name"], "uptime-probe");
        assert!(created["id"].as_str().is_some_and(|id| !id.is_empty()));
        assert!(created["timestamp"].is_string());

        let (status, listed) = app.get("/api/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["id"], created["id"]);
    }

    #[tokio::test]
    async fn test_missing_client_name() {
        let app = TestApp::new();
        let (status, body) = app.post("/api/status", "{}").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().unwrap().contains("client_name"));
    }
}
