use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Extensions, HeaderMap, Method, StatusCode, Uri};
use serde::Serialize;
use serde_json::{Map, Value};

/// A per-route handler, or a middleware contributed by a binder.
///
/// Handlers are built once at registration time and shared by every request
/// on that route.
pub type Handler = Arc<dyn Fn(&mut Context) + Send + Sync>;

/// Request context passed through every lifecycle hook and controller method.
///
/// Carries the inbound request, the response being assembled and the
/// cooperative stopped flag observed by the lifecycle.
pub struct Context {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    params: Vec<(String, String)>,
    body: Bytes,
    extensions: Extensions,
    stopped: bool,
    status: StatusCode,
    response_headers: HeaderMap,
    response_body: BytesMut,
    writes: usize,
    view_data: Map<String, Value>,
}

impl Context {
    /// Create a context for `method` on `uri`. An unparsable URI falls back to `/`.
    pub fn new(method: Method, uri: &str) -> Self {
        Self::from_parts(method, uri.parse().unwrap_or_default(), HeaderMap::new(), Bytes::new())
    }

    /// Create a context from already-parsed request parts.
    pub fn from_parts(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            uri,
            headers,
            params: Vec::new(),
            body,
            extensions: Extensions::new(),
            stopped: false,
            status: StatusCode::OK,
            response_headers: HeaderMap::new(),
            response_body: BytesMut::new(),
            writes: 0,
            view_data: Map::new(),
        }
    }

    /// Attach matched path parameters.
    pub fn with_params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.params = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Replace the request body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    // ── Request side ────────────────────────────────────────────────────

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a request header as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get a path parameter by name.
    ///
    /// Linear scan; routes carry one or two params at most.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Typed per-request storage shared by middleware and controllers.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    // ── Continuation flag ───────────────────────────────────────────────

    /// Whether a middleware or hook has stopped the execution.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Mark the request as stopped. Handlers further down the chain, and the
    /// controller method itself, are skipped.
    pub fn stop_execution(&mut self) {
        self.stopped = true;
    }

    // ── Response side ───────────────────────────────────────────────────

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    pub fn response_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.response_headers
    }

    /// Append `chunk` to the response body. Every call counts as one write.
    pub fn write(&mut self, chunk: impl AsRef<[u8]>) {
        self.response_body.extend_from_slice(chunk.as_ref());
        self.writes += 1;
    }

    /// Serialize `value` as the response body and set `Content-Type: application/json`.
    pub fn write_json(&mut self, value: &impl Serialize) -> Result<(), serde_json::Error> {
        let bytes = serde_json::to_vec(value)?;
        self.response_headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.write(bytes);
        Ok(())
    }

    /// Whether anything was written to the response.
    pub fn is_written(&self) -> bool {
        self.writes > 0
    }

    /// Number of `write` calls made on this context.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn response_body(&self) -> &[u8] {
        &self.response_body
    }

    /// Store a value for the response's view data.
    pub fn view_data(&mut self, key: impl Into<String>, value: Value) {
        self.view_data.insert(key.into(), value);
    }

    pub fn get_view_data(&self, key: &str) -> Option<&Value> {
        self.view_data.get(key)
    }

    pub fn view_data_map(&self) -> &Map<String, Value> {
        &self.view_data
    }

    /// Consume the context, keeping only what a host needs to build a response.
    pub fn into_response_parts(self) -> ResponseParts {
        ResponseParts {
            status: self.status,
            headers: self.response_headers,
            body: self.response_body.freeze(),
            view_data: self.view_data,
        }
    }
}

/// The response half of a finished [`Context`].
#[derive(Debug)]
pub struct ResponseParts {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub view_data: Map<String, Value>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("stopped", &self.stopped)
            .field("status", &self.status)
            .field("writes", &self.writes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_uri_falls_back_to_root() {
        let ctx = Context::new(Method::GET, "not a uri");
        assert_eq!(ctx.path(), "/");
    }

    #[test]
    fn writes_are_counted() {
        let mut ctx = Context::new(Method::GET, "/");
        assert!(!ctx.is_written());
        ctx.write("a");
        ctx.write(b"b");
        assert_eq!(ctx.write_count(), 2);
        assert_eq!(ctx.response_body(), b"ab");
    }

    #[test]
    fn write_json_sets_content_type() {
        let mut ctx = Context::new(Method::GET, "/");
        ctx.write_json(&serde_json::json!({ "ok": true })).unwrap();
        assert_eq!(
            ctx.response_headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(ctx.response_body(), br#"{"ok":true}"#);
    }

    #[test]
    fn params_lookup() {
        let ctx = Context::new(Method::GET, "/users/7").with_params([("param", "7")]);
        assert_eq!(ctx.param("param"), Some("7"));
        assert_eq!(ctx.param("missing"), None);
    }
}
