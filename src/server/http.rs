//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo, one task per connection. Request bodies
//! are collected up to `MAX_BODY_BYTES` before routing.

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::header::{self, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use super::cors::Cors;
use crate::config::Args;
use crate::files::ResourceFiles;
use crate::reporting::ReportingService;
use crate::routes::response::{detail_response, FullBody};
use crate::routes::{self, RequestParts};
use crate::services::{DownloadService, TrackingService};
use crate::store::Stores;
use crate::types::ApiError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Resource store and activity log handles
    pub stores: Stores,
    /// Resource file area under `RESOURCE_ROOT`
    pub files: ResourceFiles,
    pub reporting: ReportingService,
    pub downloads: DownloadService,
    pub tracking: TrackingService,
    pub cors: Cors,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(args: Args, stores: Stores) -> Self {
        let files = ResourceFiles::new(args.resource_root.clone());
        let cors = Cors::new(args.cors_allow_list());

        Self {
            reporting: ReportingService::new(stores.clone()),
            downloads: DownloadService::new(stores.clone(), files.clone()),
            tracking: TrackingService::new(stores.clone()),
            args,
            stores,
            files,
            cors,
            started_at: Instant::now(),
        }
    }
}

/// Accept connections until ctrl-c
pub async fn run(state: Arc<AppState>) -> Result<(), ApiError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "TrustML API listening on {} (store: {})",
        state.args.listen,
        state.stores.resources.backend()
    );

    if state.args.dev_mode {
        warn!("Development mode enabled");
    }

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { handle_request(state, addr, req).await }
                        });

                        if let Err(err) = http1::Builder::new()
                            .serve_connection(io, service)
                            .await
                        {
                            error!("Error serving connection from {}: {:?}", addr, err);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, no longer accepting connections");
                return Ok(());
            }
        }
    }
}

/// Read the body, route the request and attach CORS headers
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<FullBody>, Infallible> {
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let origin = parts.headers.get(header::ORIGIN).cloned();

    let mut resp = if parts.method == Method::OPTIONS {
        state.cors.preflight(
            origin.as_ref(),
            parts.headers.get(header::ACCESS_CONTROL_REQUEST_HEADERS),
        )
    } else {
        match Limited::new(body, state.args.max_body_bytes).collect().await {
            Ok(collected) => {
                let request = RequestParts {
                    method: parts.method.clone(),
                    path: parts.uri.path().to_string(),
                    query: parts.uri.query().map(str::to_string),
                    headers: parts.headers,
                    peer: Some(addr),
                    body: collected.to_bytes(),
                };
                let mut resp = routes::dispatch(&state, request).await;
                state.cors.apply(origin.as_ref(), &mut resp);
                resp
            }
            Err(e) => {
                let mut resp = body_error_response(&*e);
                state.cors.apply(origin.as_ref(), &mut resp);
                resp
            }
        }
    };

    resp.headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    info!(
        peer = %addr,
        method = %parts.method,
        path = %parts.uri.path(),
        status = resp.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );

    Ok(resp)
}

fn body_error_response(err: &(dyn std::error::Error + 'static)) -> Response<FullBody> {
    if err.is::<LengthLimitError>() {
        warn!("Rejected request body over size limit");
        detail_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
    } else {
        warn!(error = %err, "Failed to read request body");
        detail_response(StatusCode::BAD_REQUEST, "Failed to read request body")
    }
}
