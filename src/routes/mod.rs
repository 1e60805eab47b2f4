//! HTTP routes
//!
//! All endpoints live under `/api`. The server collects the request body
//! up front and hands a [`RequestParts`] to [`dispatch`], which keeps the
//! handlers independent of the hyper connection machinery.

pub mod analytics;
pub mod health;
pub mod resources;
pub mod response;
pub mod status;

use bytes::Bytes;
use hyper::header::{self, HeaderMap};
use hyper::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::net::SocketAddr;
use tracing::{error, warn};

use crate::db::ClientInfo;
use crate::server::AppState;
use crate::types::{ApiError, Result};
use response::FullBody;

pub use response::{error_response, json_response};

/// A fully-read HTTP request
#[derive(Debug, Clone)]
pub struct RequestParts {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub peer: Option<SocketAddr>,
    pub body: Bytes,
}

impl RequestParts {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: HeaderMap::new(),
            peer: None,
            body: Bytes::new(),
        }
    }

    fn header(&self, name: header::HeaderName) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// Client details recorded with downloads, interactions and events
    pub fn client_info(&self) -> ClientInfo {
        ClientInfo {
            ip_address: self.peer.map(|addr| addr.ip().to_string()),
            user_agent: self.header(header::USER_AGENT),
            referrer: self.header(header::REFERER),
        }
    }

    /// Decode the query string into `T`
    pub fn query<T: DeserializeOwned>(&self) -> Result<T> {
        serde_urlencoded::from_str(self.query.as_deref().unwrap_or(""))
            .map_err(|e| ApiError::Validation(format!("Invalid query string: {}", e)))
    }

    /// Decode the JSON body into `T`
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Route a request to its handler.
///
/// Handler errors are rendered as `{"detail": ...}` with the error's status.
pub async fn dispatch(state: &AppState, req: RequestParts) -> Response<FullBody> {
    let result = route(state, &req).await;

    match result {
        Ok(resp) => resp,
        Err(err) => {
            let status = err.status_code();
            if status.is_server_error() {
                error!(method = %req.method, path = %req.path, error = %err, "Request failed");
            } else if status != StatusCode::NOT_FOUND {
                warn!(method = %req.method, path = %req.path, error = %err, "Request rejected");
            }
            error_response(&err)
        }
    }
}

async fn route(state: &AppState, req: &RequestParts) -> Result<Response<FullBody>> {
    let rest = match req.path.strip_prefix("/api") {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return Ok(response::not_found()),
    };

    let segments: Vec<String> = rest
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            urlencoding::decode(s)
                .map(|d| d.into_owned())
                .unwrap_or_else(|_| s.to_string())
        })
        .collect();
    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

    let method = &req.method;
    match segments.as_slice() {
        [] => only(method, Method::GET, || async { Ok(health::root()) }).await,
        ["health"] => only(method, Method::GET, || health::health(state)).await,
        ["version"] => only(method, Method::GET, || async { Ok(health::version()) }).await,

        ["status"] => match *method {
            Method::POST => status::create_status_check(state, req).await,
            Method::GET => status::list_status_checks(state).await,
            _ => Ok(response::method_not_allowed()),
        },

        ["resources"] => match *method {
            Method::GET => resources::list(state, req).await,
            Method::POST => resources::create(state, req).await,
            _ => Ok(response::method_not_allowed()),
        },
        ["resources", id] => only(method, Method::GET, || resources::get(state, id)).await,
        ["resources", id, "download"] => {
            only(method, Method::GET, || resources::download(state, req, id)).await
        }
        ["resources", id, "stats"] => {
            only(method, Method::GET, || resources::stats(state, id)).await
        }

        ["analytics", "track"] => {
            only(method, Method::POST, || analytics::track_event(state, req)).await
        }
        ["analytics", "link-click"] => {
            only(method, Method::POST, || analytics::track_link_click(state, req)).await
        }
        ["analytics", "dashboard"] => {
            only(method, Method::GET, || analytics::dashboard(state)).await
        }
        ["analytics", "resources"] => {
            only(method, Method::GET, || analytics::resource_analytics(state)).await
        }

        _ => Ok(response::not_found()),
    }
}

/// Run `handler` if the method matches, otherwise answer 405
async fn only<F, Fut>(method: &Method, expected: Method, handler: F) -> Result<Response<FullBody>>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<Response<FullBody>>>,
{
    if *method == expected {
        handler().await
    } else {
        Ok(response::method_not_allowed())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::Args;
    use crate::store::Stores;
    use clap::Parser;
    use http_body_util::BodyExt;
    use std::time::Duration;

    pub struct TestApp {
        pub _dir: tempfile::TempDir,
        pub state: AppState,
    }

    impl TestApp {
        pub fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let root = dir.path().to_string_lossy().into_owned();
            let args = Args::parse_from([
                "trustml-backend",
                "--mongodb-uri",
                "mongodb://localhost:27017",
                "--resource-root",
                root.as_str(),
            ]);
            let state = AppState::new(args, Stores::memory(Duration::from_secs(5)));
            Self { _dir: dir, state }
        }

        pub async fn call(&self, req: RequestParts) -> (StatusCode, Bytes) {
            let resp = dispatch(&self.state, req).await;
            let status = resp.status();
            let body = resp.into_body().collect().await.unwrap().to_bytes();
            (status, body)
        }

        pub async fn get(&self, path_and_query: &str) -> (StatusCode, serde_json::Value) {
            let (path, query) = match path_and_query.split_once('?') {
                Some((p, q)) => (p, Some(q.to_string())),
                None => (path_and_query, None),
            };
            let mut req = RequestParts::new(Method::GET, path);
            req.query = query;
            let (status, body) = self.call(req).await;
            (status, serde_json::from_slice(&body).unwrap())
        }

        pub async fn post(&self, path: &str, body: &str) -> (StatusCode, serde_json::Value) {
            let mut req = RequestParts::new(Method::POST, path);
            req.body = Bytes::from(body.to_string());
            let (status, body) = self.call(req).await;
            (status, serde_json::from_slice(&body).unwrap())
        }
    }
}
