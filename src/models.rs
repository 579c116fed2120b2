//! Core data models for the cachegate engine

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, StatusCode};

/// How the host issued the request.
///
/// Navigations get the offline root fallback under network-first; plain
/// resource requests propagate network failures instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// A full-page navigation
    Navigate,
    /// Any subresource or API request
    Resource,
}

/// An inbound read request as seen by the interceptor
#[derive(Debug, Clone)]
pub struct InboundRequest {
    /// HTTP method of the request
    pub method: Method,
    /// Absolute request URL (fragment stripped on construction)
    pub url: String,
    /// Navigation vs. plain resource request
    pub mode: RequestMode,
}

impl InboundRequest {
    /// Create a new InboundRequest, normalizing the URL
    ///
    /// Normalization drops the fragment; everything else is kept verbatim so
    /// that query strings produce distinct cache keys.
    pub fn new(method: Method, url: impl Into<String>, mode: RequestMode) -> Self {
        let mut url = url.into();
        if let Some(pos) = url.find('#') {
            url.truncate(pos);
        }
        InboundRequest { method, url, mode }
    }

    /// Convenience constructor for a GET resource request
    pub fn get(url: impl Into<String>) -> Self {
        InboundRequest::new(Method::GET, url, RequestMode::Resource)
    }

    /// Convenience constructor for a GET navigation
    pub fn navigate(url: impl Into<String>) -> Self {
        InboundRequest::new(Method::GET, url, RequestMode::Navigate)
    }

    /// The URL scheme, if the URL is absolute (e.g. "https")
    pub fn scheme(&self) -> Option<&str> {
        self.url.split_once("://").map(|(scheme, _)| scheme)
    }

    /// The path component of the URL, without query string
    ///
    /// For absolute URLs this is everything from the first `/` after the
    /// authority; an authority with no path yields `/`.
    pub fn path(&self) -> &str {
        let after_scheme = match self.url.split_once("://") {
            Some((_, rest)) => rest,
            None => &self.url,
        };
        let path = match after_scheme.find('/') {
            Some(pos) => &after_scheme[pos..],
            None => "/",
        };
        match path.find('?') {
            Some(pos) => &path[..pos],
            None => path,
        }
    }

    /// The cache key for this request: method + normalized URL
    pub fn identity(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

/// A captured response: status, headers, and the body buffered exactly once.
///
/// The body is captured into `Bytes` at the transport boundary, so the same
/// snapshot can be both returned to the caller and written to the cache
/// without re-reading a stream.
#[derive(Debug, Clone)]
pub struct ResponseSnapshot {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers as captured
    pub headers: HeaderMap,
    /// Body bytes, stored verbatim
    pub body: Bytes,
}

impl ResponseSnapshot {
    /// Create a new ResponseSnapshot
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        ResponseSnapshot {
            status,
            headers,
            body,
        }
    }

    /// Whether this response is cacheable (2xx final status)
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Declared content-length of this response, falling back to 0 when the
    /// header is absent or unparsable
    pub fn declared_content_length(&self) -> u64 {
        self.headers
            .get(http::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0)
    }

    /// The synthetic unavailable response returned when neither cache nor
    /// network can serve a request
    pub fn unavailable() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        ResponseSnapshot {
            status: StatusCode::SERVICE_UNAVAILABLE,
            headers,
            body: Bytes::from_static(b"offline: resource unavailable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_stripped() {
        let req = InboundRequest::get("https://blog.example/posts/42#section-3");
        assert_eq!(req.url, "https://blog.example/posts/42");
    }

    #[test]
    fn test_scheme() {
        assert_eq!(
            InboundRequest::get("https://blog.example/").scheme(),
            Some("https")
        );
        assert_eq!(
            InboundRequest::get("chrome-extension://abcdef/page").scheme(),
            Some("chrome-extension")
        );
        assert_eq!(InboundRequest::get("/relative/path").scheme(), None);
    }

    #[test]
    fn test_path() {
        assert_eq!(
            InboundRequest::get("https://blog.example/posts/42?page=2").path(),
            "/posts/42"
        );
        assert_eq!(InboundRequest::get("https://blog.example").path(), "/");
        assert_eq!(InboundRequest::get("/app.js").path(), "/app.js");
    }

    #[test]
    fn test_identity_includes_method_and_url() {
        let req = InboundRequest::get("https://blog.example/app.js");
        assert_eq!(req.identity(), "GET https://blog.example/app.js");
    }

    #[test]
    fn test_identity_distinguishes_query() {
        let a = InboundRequest::get("https://blog.example/posts?page=1");
        let b = InboundRequest::get("https://blog.example/posts?page=2");
        assert_ne!(a.identity(), b.identity());
    }

    #[test]
    fn test_declared_content_length() {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_LENGTH,
            HeaderValue::from_static("350"),
        );
        let snap = ResponseSnapshot::new(StatusCode::OK, headers, Bytes::from_static(b"x"));
        assert_eq!(snap.declared_content_length(), 350);
    }

    #[test]
    fn test_declared_content_length_fallback() {
        let snap = ResponseSnapshot::new(StatusCode::OK, HeaderMap::new(), Bytes::new());
        assert_eq!(snap.declared_content_length(), 0);

        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_LENGTH,
            HeaderValue::from_static("not-a-number"),
        );
        let snap = ResponseSnapshot::new(StatusCode::OK, headers, Bytes::new());
        assert_eq!(snap.declared_content_length(), 0);
    }

    #[test]
    fn test_unavailable_is_not_cacheable() {
        let snap = ResponseSnapshot::unavailable();
        assert_eq!(snap.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!snap.is_success());
    }
}
