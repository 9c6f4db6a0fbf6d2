//! Fetch-shaped exchange values: the request a hosted router consumes and
//! the response it produces.
//!
//! A [`WorkerRequest`] is assembled once per exchange and read-only after
//! construction. Query pairs are parsed up front and ride on the request,
//! as do path parameters resolved by an outer routing layer, because the
//! hosted router expects both on the request itself rather than on a
//! framework context.

use crate::error::BridgeError;
use http::{HeaderMap, Method, StatusCode};
use serde_json::Value;
use std::collections::HashMap;
use url::Url;

// ── Request ─────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct WorkerRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    path_params: HashMap<String, String>,
    body: Vec<u8>,
}

impl WorkerRequest {
    /// Build from raw parts. `url` must be absolute; the query string is
    /// parsed here, preserving order and duplicate names.
    pub fn new(
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Vec<u8>,
    ) -> Result<Self, BridgeError> {
        let url = Url::parse(url)
            .map_err(|e| BridgeError::Inbound(format!("invalid url {url:?}: {e}")))?;
        let query = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Ok(Self {
            method,
            url,
            headers,
            query,
            path_params: HashMap::new(),
            body,
        })
    }

    /// Attach path parameters resolved by the routing layer. Construction
    /// time only; the request does not change after this.
    pub fn with_path_params(mut self, params: HashMap<String, String>) -> Self {
        self.path_params = params;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as text, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// First value bound to `name` in the query string.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every query pair in original order, duplicates included.
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

// ── Response ────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct WorkerResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl WorkerResponse {
    /// 200 with a JSON body.
    pub fn json(value: &Value) -> Self {
        Self {
            status: StatusCode::OK,
            headers: content_type_header("application/json"),
            body: serde_json::to_vec(value).unwrap_or_default(),
        }
    }

    /// 200 with a plain-text body.
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: content_type_header("text/plain; charset=utf-8"),
            body: body.into().into_bytes(),
        }
    }

    /// 200 with an MPEG audio body.
    pub fn audio(body: Vec<u8>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: content_type_header(crate::blob::AUDIO_MPEG),
            body,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Set a header. Values that do not parse are skipped.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.parse::<http::header::HeaderName>(),
            value.parse::<http::header::HeaderValue>(),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Vec<u8>) {
        (self.status, self.headers, self.body)
    }
}

fn content_type_header(value: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        http::header::CONTENT_TYPE,
        http::header::HeaderValue::from_static(value),
    );
    headers
}

// ── Outbound body decoding ──────────────────────────────────────────────

/// Body decoded by exactly one strategy, chosen from the content type.
#[derive(Debug, PartialEq, Eq)]
pub enum RenderedBody {
    /// `application/json`: parsed and re-serialized.
    Json(Vec<u8>),
    /// Audio and other binary types: bytes passed through untouched.
    Binary(Vec<u8>),
    /// Everything else, including a missing content type: UTF-8 text.
    Text(String),
}

/// Pick the decode strategy for `content_type` and apply it to `body`.
/// A JSON content type with an unparseable body is a bridge failure, not
/// a silent fallback to text.
pub fn render_body(content_type: Option<&str>, body: Vec<u8>) -> Result<RenderedBody, BridgeError> {
    let ct = content_type.unwrap_or("");
    if ct.contains("application/json") {
        let value: Value = serde_json::from_slice(&body)
            .map_err(|e| BridgeError::Outbound(format!("body is not valid json: {e}")))?;
        Ok(RenderedBody::Json(
            serde_json::to_vec(&value).unwrap_or_default(),
        ))
    } else if ct.contains("audio/") || ct.contains("application/octet-stream") {
        Ok(RenderedBody::Binary(body))
    } else {
        Ok(RenderedBody::Text(
            String::from_utf8_lossy(&body).into_owned(),
        ))
    }
}
