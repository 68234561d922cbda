//! Request keys and captured responses.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use super::hash::compute_cache_key;
use crate::Error;

/// Normalized identity of a cached request.
///
/// Only GET requests are cacheable. The fragment is dropped; the query
/// string is kept verbatim, so `?v=1` and `?v=2` are distinct entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    method: String,
    url: String,
}

impl RequestKey {
    /// Build a key for `method url`, rejecting anything but GET.
    pub fn new(method: &str, url: &Url) -> Result<Self, Error> {
        if !method.eq_ignore_ascii_case("GET") {
            return Err(Error::InvalidInput(format!("only GET requests are cacheable, got {method}")));
        }
        let mut url = url.clone();
        url.set_fragment(None);
        Ok(Self { method: "GET".to_string(), url: url.into() })
    }

    /// Key for a GET of `url`.
    pub fn get(url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self { method: "GET".to_string(), url: url.into() }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Hash stored in the `key_hash` column.
    pub fn hash(&self) -> String {
        compute_cache_key(&self.method, &self.url)
    }

    /// Rebuild a key from its persisted columns.
    pub(crate) fn from_columns(method: String, url: String) -> Self {
        Self { method, url }
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// How a response relates to the page origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin content.
    Basic,
    /// Cross-origin content readable by the page.
    Cors,
    /// Cross-origin content the page cannot inspect.
    Opaque,
    /// Synthetic network-error response.
    Error,
}

impl ResponseType {
    /// `Basic` when `url` shares the page origin, `Cors` otherwise.
    pub fn for_origin(url: &Url, origin: &Url) -> Self {
        if url.origin() == origin.origin() { ResponseType::Basic } else { ResponseType::Cors }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Basic => "basic",
            ResponseType::Cors => "cors",
            ResponseType::Opaque => "opaque",
            ResponseType::Error => "error",
        }
    }
}

impl FromStr for ResponseType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(ResponseType::Basic),
            "cors" => Ok(ResponseType::Cors),
            "opaque" => Ok(ResponseType::Opaque),
            "error" => Ok(ResponseType::Error),
            other => Err(Error::CorruptEntry(format!("unknown response type: {other}"))),
        }
    }
}

/// A captured response: status, headers and a body snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResponseSnapshot {
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub response_type: ResponseType,
}

impl ResponseSnapshot {
    /// A same-origin response with no headers.
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            status,
            status_text: String::new(),
            headers: Vec::new(),
            body: body.into(),
            response_type: ResponseType::Basic,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Re-derive `response_type` from the final URL against the page origin.
    pub fn stamp_origin(&mut self, origin: &Url) {
        self.response_type = match Url::parse(&self.url) {
            Ok(url) => ResponseType::for_origin(&url, origin),
            Err(_) => ResponseType::Opaque,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_rejects_non_get() {
        let url = Url::parse("https://example.com/form").unwrap();
        assert!(matches!(RequestKey::new("POST", &url), Err(Error::InvalidInput(_))));
        assert!(RequestKey::new("get", &url).is_ok());
    }

    #[test]
    fn test_key_drops_fragment_keeps_query() {
        let url = Url::parse("https://example.com/index.html?lang=hi#preamble").unwrap();
        let key = RequestKey::get(&url);
        assert_eq!(key.url(), "https://example.com/index.html?lang=hi");
        assert_eq!(key.method(), "GET");
    }

    #[test]
    fn test_key_display() {
        let key = RequestKey::get(&Url::parse("https://example.com/").unwrap());
        assert_eq!(key.to_string(), "GET https://example.com/");
    }

    #[test]
    fn test_response_type_for_origin() {
        let origin = Url::parse("https://samvidhan.example").unwrap();
        let own = Url::parse("https://samvidhan.example/style.css").unwrap();
        let font = Url::parse("https://fonts.gstatic.com/s/a.woff2").unwrap();
        assert_eq!(ResponseType::for_origin(&own, &origin), ResponseType::Basic);
        assert_eq!(ResponseType::for_origin(&font, &origin), ResponseType::Cors);
    }

    #[test]
    fn test_response_type_parse() {
        for ty in [ResponseType::Basic, ResponseType::Cors, ResponseType::Opaque, ResponseType::Error] {
            assert_eq!(ty.as_str().parse::<ResponseType>().unwrap(), ty);
        }
        assert!("bogus".parse::<ResponseType>().is_err());
    }

    #[test]
    fn test_snapshot_success_and_headers() {
        let ok = ResponseSnapshot::new("https://example.com/", 204, Vec::new()).with_header("Content-Type", "text/css");
        assert!(ok.is_success());
        assert_eq!(ok.content_type(), Some("text/css"));

        let missing = ResponseSnapshot::new("https://example.com/", 404, Vec::new());
        assert!(!missing.is_success());
        assert_eq!(missing.content_type(), None);
    }

    #[test]
    fn test_stamp_origin_after_redirect() {
        let origin = Url::parse("https://samvidhan.example").unwrap();
        let mut response = ResponseSnapshot::new("https://cdn.example.net/style.css", 200, b"body".to_vec());
        response.stamp_origin(&origin);
        assert_eq!(response.response_type, ResponseType::Cors);
    }
}
