//! Response helpers shared by the route handlers
//!
//! Every body is JSON except resource downloads. Errors always render as
//! `{"detail": "..."}`.

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use serde::Serialize;
use serde_json::json;

use crate::services::Download;
use crate::types::ApiError;

pub type FullBody = Full<Bytes>;

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<FullBody> {
    let json = serde_json::to_vec(body).unwrap_or_else(|_| b"{}".to_vec());
    let mut resp = Response::new(Full::new(Bytes::from(json)));
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    resp
}

pub fn ok<T: Serialize>(body: &T) -> Response<FullBody> {
    json_response(StatusCode::OK, body)
}

pub fn detail_response(status: StatusCode, detail: &str) -> Response<FullBody> {
    json_response(status, &json!({ "detail": detail }))
}

pub fn error_response(err: &ApiError) -> Response<FullBody> {
    detail_response(err.status_code(), &err.detail())
}

pub fn not_found() -> Response<FullBody> {
    detail_response(StatusCode::NOT_FOUND, "Not Found")
}

pub fn method_not_allowed() -> Response<FullBody> {
    detail_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

/// Resource file as an `application/octet-stream` attachment
pub fn file_response(download: Download) -> Response<FullBody> {
    let len = download.bytes.len();
    let mut resp = Response::new(Full::new(Bytes::from(download.bytes)));
    let headers = resp.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    headers.insert(
        header::CONTENT_DISPOSITION,
        content_disposition(&download.file.file_name),
    );
    resp
}

/// `attachment` disposition; names that are not plain ASCII use the
/// RFC 5987 `filename*` form
pub fn content_disposition(file_name: &str) -> HeaderValue {
    let plain = file_name
        .chars()
        .all(|c| (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\');
    if plain {
        if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file_name))
        {
            return value;
        }
    }

    let encoded = urlencoding::encode(file_name);
    HeaderValue::from_str(&format!("attachment; filename*=utf-8''{}", encoded))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
