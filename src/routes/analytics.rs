//! Analytics endpoints: event and link-click tracking plus the reports

use hyper::Response;
use serde_json::json;

use super::response::{ok, FullBody};
use super::RequestParts;
use crate::server::AppState;
use crate::services::{LinkClickRequest, TrackEventRequest};
use crate::types::Result;

/// POST /api/analytics/track
pub async fn track_event(state: &AppState, req: &RequestParts) -> Result<Response<FullBody>> {
    let request: TrackEventRequest = req.json()?;
    let event = state
        .tracking
        .track_event(request, &req.client_info())
        .await?;
    Ok(ok(&json!({ "status": "tracked", "event_id": event.id })))
}

/// POST /api/analytics/link-click
pub async fn track_link_click(
    state: &AppState,
    req: &RequestParts,
) -> Result<Response<FullBody>> {
    let request: LinkClickRequest = req.json()?;
    let interaction = state
        .tracking
        .track_link_click(request, &req.client_info())
        .await?;
    Ok(ok(
        &json!({ "status": "tracked", "interaction_id": interaction.id }),
    ))
}

/// GET /api/analytics/dashboard
pub async fn dashboard(state: &AppState) -> Result<Response<FullBody>> {
    Ok(ok(&state.reporting.dashboard().await?))
}

/// GET /api/analytics/resources
pub async fn resource_analytics(state: &AppState) -> Result<Response<FullBody>> {
    Ok(ok(&state.reporting.resource_analytics().await?))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::TestApp;
    use hyper::StatusCode;
    use serde_json::Value;

    async fn create_resource(app: &TestApp, title: &str, category: &str) -> String {
        let file_path = format!("{}/{}.pdf", category, title);
        app.state.files.write(&file_path, b"pdf").await.unwrap();
        let body = serde_json::json!({
            "title": title,
            "description": "",
            "type": "pdf",
            "category": category,
            "file_path": file_path,
        });
        let (status, created) = app.post("/api/resources", &body.to_string()).await;
        assert_eq!(status, StatusCode::OK);
        created["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_track_event_scenario() {
        let app = TestApp::new();
        let (status, body) = app
            .post(
                "/api/analytics/track",
                r#"{"event_type":"scheduling_click","element_id":"cta-hero","session_id":"s-1"}"#,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "tracked");
        assert!(body["event_id"].as_str().is_some_and(|id| !id.is_empty()));

        let (status, body) = app.post("/api/analytics/track", "{}").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "tracked");

        // Events are stored apart from interactions
        let (_, dashboard) = app.get("/api/analytics/dashboard").await;
        assert_eq!(dashboard["summary"]["total_interactions"], 0);
    }

    #[tokio::test]
    async fn test_track_rejects_malformed_body() {
        let app = TestApp::new();
        let (status, body) = app.post("/api/analytics/track", "{not json").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].is_string());

        let (status, _) = app.post("/api/analytics/link-click", "42").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_link_click_and_dashboard() {
        let app = TestApp::new();
        for category in ["cta", "nav", "cta", "footer", "cta", "nav"] {
            let payload = serde_json::json!({ "link_id": "x", "link_category": category });
            let (status, body) = app
                .post("/api/analytics/link-click", &payload.to_string())
                .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "tracked");
            assert!(body["interaction_id"].is_string());
        }

        let (status, dashboard) = app.get("/api/analytics/dashboard").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(dashboard["summary"]["total_interactions"], 6);
        assert_eq!(dashboard["summary"]["total_downloads"], 0);

        let categories = dashboard["interaction_categories"].as_array().unwrap();
        let rows: Vec<(String, i64)> = categories
            .iter()
            .map(|c| (c["_id"].as_str().unwrap().to_string(), c["count"].as_i64().unwrap()))
            .collect();
        assert_eq!(
            rows,
            vec![("cta".into(), 3), ("nav".into(), 2), ("footer".into(), 1)]
        );

        let recent = dashboard["recent_activity"]["interactions"].as_array().unwrap();
        assert_eq!(recent.len(), 6);
        assert!(recent.iter().all(|i| i["action_type"] == "click"));
    }

    #[tokio::test]
    async fn test_resource_analytics_after_downloads() {
        let app = TestApp::new();
        let guide = create_resource(&app, "g", "guides").await;
        let paper = create_resource(&app, "w", "whitepapers").await;

        for id in [&paper, &paper, &guide] {
            let (status, _) = app
                .call(super::super::RequestParts::new(
                    hyper::Method::GET,
                    format!("/api/resources/{}/download", id),
                ))
                .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, analytics) = app.get("/api/analytics/resources").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            analytics["downloads_by_category"],
            serde_json::json!([
                { "_id": "whitepapers", "count": 2 },
                { "_id": "guides", "count": 1 },
            ])
        );
        assert_eq!(analytics["recent_downloads_count"], 3);
        assert_eq!(analytics["download_trend"].as_array().unwrap().len(), 3);

        let most: Vec<&Value> = analytics["most_downloaded"].as_array().unwrap().iter().collect();
        assert_eq!(most[0]["id"], paper.as_str());
        assert_eq!(most[0]["download_count"], 2);

        // Downloads also show up as "download" interactions
        let (_, dashboard) = app.get("/api/analytics/dashboard").await;
        assert_eq!(dashboard["summary"]["total_downloads"], 3);
        assert_eq!(dashboard["interaction_categories"][0]["_id"], "download");
        assert_eq!(dashboard["summary"]["popular_resources"][0]["id"], paper.as_str());
    }
}
