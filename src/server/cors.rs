//! CORS policy
//!
//! `CORS_ORIGINS=*` answers every origin with a wildcard. A comma-separated
//! list echoes back only listed origins, with credentials allowed.

use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};

use crate::routes::response::{detail_response, FullBody};

const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
const MAX_AGE_SECS: &str = "600";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cors {
    Any,
    AllowList(Vec<String>),
}

impl Cors {
    pub fn new(allow_list: Option<Vec<String>>) -> Self {
        match allow_list {
            Some(origins) if !origins.is_empty() => Self::AllowList(origins),
            _ => Self::Any,
        }
    }

    /// Value for `Access-Control-Allow-Origin`, or `None` if the origin is
    /// not allowed
    fn allow_origin(&self, origin: Option<&HeaderValue>) -> Option<HeaderValue> {
        match self {
            Self::Any => Some(HeaderValue::from_static("*")),
            Self::AllowList(origins) => {
                let origin = origin?;
                let value = origin.to_str().ok()?;
                origins
                    .iter()
                    .any(|allowed| allowed == value)
                    .then(|| origin.clone())
            }
        }
    }

    /// Add CORS headers to a response
    pub fn apply(&self, origin: Option<&HeaderValue>, resp: &mut Response<FullBody>) {
        let Some(allow) = self.allow_origin(origin) else {
            return;
        };
        let headers = resp.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow);
        if let Self::AllowList(_) = self {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
            headers.append(header::VARY, HeaderValue::from_static("Origin"));
        }
    }

    /// Answer an `OPTIONS` preflight
    pub fn preflight(
        &self,
        origin: Option<&HeaderValue>,
        requested_headers: Option<&HeaderValue>,
    ) -> Response<FullBody> {
        if origin.is_some() && self.allow_origin(origin).is_none() {
            return detail_response(StatusCode::BAD_REQUEST, "Disallowed CORS origin");
        }

        let mut resp = Response::new(FullBody::default());
        let headers = resp.headers_mut();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            requested_headers
                .cloned()
                .unwrap_or_else(|| HeaderValue::from_static("*")),
        );
        headers.insert(
            header::ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from_static(MAX_AGE_SECS),
        );
        self.apply(origin, &mut resp);
        resp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::response::ok;

    fn origin(value: &'static str) -> HeaderValue {
        HeaderValue::from_static(value)
    }

    #[test]
    fn test_wildcard() {
        let cors = Cors::new(None);
        assert_eq!(cors, Cors::Any);

        let mut resp = ok(&serde_json::json!({}));
        cors.apply(Some(&origin("https://anywhere.example")), &mut resp);
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(resp
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .is_none());
    }

    #[test]
    fn test_allow_list_echoes_listed_origin() {
        let cors = Cors::new(Some(vec!["https://trustml.example".into()]));

        let mut resp = ok(&serde_json::json!({}));
        cors.apply(Some(&origin("https://trustml.example")), &mut resp);
        assert_eq!(
            resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://trustml.example"
        );
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(resp.headers()[header::VARY], "Origin");

        let mut resp = ok(&serde_json::json!({}));
        cors.apply(Some(&origin("https://evil.example")), &mut resp);
        assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[test]
    fn test_preflight() {
        let cors = Cors::new(Some(vec!["https://trustml.example".into()]));

        let resp = cors.preflight(
            Some(&origin("https://trustml.example")),
            Some(&origin("content-type")),
        );
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::ACCESS_CONTROL_ALLOW_METHODS],
            "GET, POST, OPTIONS"
        );
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS], "content-type");

        let resp = cors.preflight(Some(&origin("https://evil.example")), None);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = Cors::Any.preflight(None, None);
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS], "*");
    }
}
