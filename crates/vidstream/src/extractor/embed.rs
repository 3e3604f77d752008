use std::str::FromStr;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use rustc_hash::FxHashMap;
use tracing::debug;

use super::default::DEFAULT_UA;
use super::error::ExtractorError;
use super::sink::SinkSet;

/// Base extractor shared by every link-discovery component.
///
/// Holds the HTTP client plus the headers and query parameters a site
/// requires on each request. Instances are request-scoped and cheap to
/// clone; no cookie or key state survives a resolution call.
#[derive(Debug, Clone)]
pub struct Extractor {
    // name of the provider, e.g. "Vidstream"
    pub name: String,
    // base url of the site, e.g. "https://gogohd.net"
    pub url: String,
    // The reqwest client
    pub client: Client,
    headers: HeaderMap,
    pub params: FxHashMap<String, String>,
}

impl Extractor {
    pub fn new<S1: Into<String>, S2: Into<String>>(name: S1, url: S2, client: Client) -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(DEFAULT_UA),
        );
        default_headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );

        Self {
            name: name.into(),
            url: url.into(),
            client,
            headers: default_headers,
            params: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn set_referer_static(&mut self, referer: &'static str) {
        self.headers
            .insert(reqwest::header::REFERER, HeaderValue::from_static(referer));
    }

    pub fn add_header_str<K: AsRef<str>, V: AsRef<str>>(&mut self, key: K, value: V) {
        match HeaderName::from_str(key.as_ref()) {
            Ok(name) => match HeaderValue::from_str(value.as_ref()) {
                Ok(value) => {
                    self.headers.insert(name, value);
                }
                Err(e) => {
                    debug!(error = %e, "Invalid header value; skipping");
                }
            },
            Err(e) => {
                debug!(error = %e, "Invalid header name; skipping");
            }
        }
    }

    pub fn add_param<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.params.insert(key.into(), value.into());
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, url)
            .headers(self.headers.clone());
        if !self.params.is_empty() {
            builder = builder.query(&self.params);
        }
        builder
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// A per-site embed extractor registered with the registry.
///
/// The registry dispatches by URL-prefix match against [`base_url`]; a
/// claiming extractor resolves the link into media links/subtitles through
/// the shared sinks.
///
/// [`base_url`]: EmbedExtractor::base_url
#[async_trait]
pub trait EmbedExtractor: Send + Sync {
    fn name(&self) -> &str;

    fn base_url(&self) -> &str;

    /// Whether playback of the resolved links needs a Referer header.
    /// Casting contexts cannot supply custom headers, so such extractors
    /// are skipped while casting.
    fn requires_referer(&self) -> bool {
        true
    }

    fn handles(&self, url: &str) -> bool {
        url.starts_with(self.base_url())
    }

    async fn extract(
        &self,
        url: &str,
        referer: Option<&str>,
        sinks: &SinkSet,
    ) -> Result<(), ExtractorError>;
}
