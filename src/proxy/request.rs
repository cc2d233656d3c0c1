//! Proxy Request Module
//!
//! The request record every strategy works on.

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use url::Url;

use crate::cache::RequestIdentity;
use crate::error::{ProxyError, Result};

// == Destination ==
/// Declared resource type of a request (the `Sec-Fetch-Dest` hint).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Destination {
    Document,
    Image,
    Script,
    Style,
    Font,
    Manifest,
    #[default]
    Empty,
}

impl Destination {
    /// Parses a `Sec-Fetch-Dest` header value. Unknown values map to `Empty`.
    pub fn from_fetch_dest(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "document" => Destination::Document,
            "image" => Destination::Image,
            "script" => Destination::Script,
            "style" => Destination::Style,
            "font" => Destination::Font,
            "manifest" => Destination::Manifest,
            _ => Destination::Empty,
        }
    }
}

// == Proxy Request ==
/// An intercepted request: method, absolute URL, destination hint and
/// navigation flag, plus whatever headers and body must be forwarded.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub url: Url,
    pub destination: Destination,
    /// True for top-level page navigations
    pub navigate: bool,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ProxyRequest {
    /// Creates a request with no headers and an empty body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            destination: Destination::Empty,
            navigate: false,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Shorthand for a plain GET.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Marks the request as a navigation to a document.
    pub fn navigation(mut self) -> Self {
        self.navigate = true;
        self.destination = Destination::Document;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    /// Cache identity: method plus absolute URL, query included.
    pub fn identity(&self) -> RequestIdentity {
        RequestIdentity::new(self.method.clone(), self.url.as_str())
    }
}

// == Origin Mapping ==
/// Maps an origin-relative target (`/path?query#fragment`) onto `origin`.
///
/// The host always stays the origin's, and the origin's own base path is
/// kept as a prefix. A leading `//` is treated as part of the path, never as
/// a host.
pub fn map_onto_origin(origin: &Url, target: &str) -> Result<Url> {
    let (rest, fragment) = match target.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (target, None),
    };
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };
    if !path.starts_with('/') {
        return Err(ProxyError::InvalidRequest(format!(
            "'{}' is not an origin-relative path",
            target
        )));
    }

    let mut url = origin.clone();
    let base = origin.path().trim_end_matches('/');
    url.set_path(&format!("{}{}", base, path));
    url.set_query(query);
    url.set_fragment(fragment);
    Ok(url)
}
