//! Vidstream-family embed resolver.
//!
//! Three independent discovery strategies run concurrently against one
//! request: the delegated quality APIs (the encrypted-ajax path among
//! them), a download-page scrape and the embedded server-list dispatch.
//! Each strategy fails alone; the request as a whole always completes.

pub mod crypto;
pub mod keys;
pub mod page;
pub mod sources;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use tracing::debug;

use self::keys::CryptoConfig;
use self::page::{EmbedPage, parse_download_links};
use self::sources::EncryptedSourcesApi;
use crate::extractor::embed::Extractor;
use crate::extractor::error::ExtractorError;
use crate::extractor::registry::ExtractorRegistry;
use crate::extractor::sink::SinkSet;
use crate::media::MediaLink;

/// A delegated link-discovery API: builds its own embed url for a page
/// identifier and resolves it into the shared sinks.
#[async_trait]
pub trait QualityApi: Send + Sync {
    fn name(&self) -> &str;

    fn embed_url(&self, main_url: &str, id: &str) -> String;

    async fn resolve(&self, url: &str, sinks: &SinkSet) -> Result<(), ExtractorError>;
}

pub struct VidstreamExtractor {
    http: Extractor,
    main_url: String,
    quality_apis: Vec<Arc<dyn QualityApi>>,
    registry: Arc<ExtractorRegistry>,
}

impl VidstreamExtractor {
    /// `main_url` covers the Vidstream clone being targeted, e.g.
    /// "https://gogohd.net"; divergent clones get their own instance.
    pub fn new(
        main_url: impl Into<String>,
        client: Client,
        crypto: CryptoConfig,
        registry: Arc<ExtractorRegistry>,
    ) -> Self {
        let main_url = main_url.into();
        let http = Extractor::new("Vidstream", main_url.clone(), client.clone());
        let quality_apis: Vec<Arc<dyn QualityApi>> =
            vec![Arc::new(EncryptedSourcesApi::new("Vidstream", client, crypto))];
        Self {
            http,
            main_url,
            quality_apis,
            registry,
        }
    }

    pub fn with_quality_api(mut self, api: Arc<dyn QualityApi>) -> Self {
        self.quality_apis.push(api);
        self
    }

    pub fn name(&self) -> &str {
        &self.http.name
    }

    pub fn streaming_url(&self, id: &str) -> String {
        format!("{}/streaming.php?id={}", self.main_url, id)
    }

    pub fn download_url(&self, id: &str) -> String {
        format!("{}/download?id={}", self.main_url, id)
    }

    /// Resolves a page identifier into media links through the sinks.
    ///
    /// Always returns `true` once every strategy has completed: zero
    /// emitted links is a valid, silent outcome and the only failure
    /// signal callers get.
    pub async fn get_url(&self, id: &str, is_casting: bool, sinks: &SinkSet) -> bool {
        let embed_url = self.streaming_url(id);
        tokio::join!(
            self.run_quality_apis(id, sinks),
            self.scrape_download_page(id, &embed_url, sinks),
            self.dispatch_server_list(&embed_url, is_casting, sinks),
        );
        true
    }

    async fn run_quality_apis(&self, id: &str, sinks: &SinkSet) {
        let tasks = self.quality_apis.iter().map(|api| {
            let url = api.embed_url(&self.main_url, id);
            async move {
                if let Err(e) = api.resolve(&url, sinks).await {
                    debug!(api = api.name(), error = %e, "quality api produced no sources");
                }
            }
        });
        join_all(tasks).await;
    }

    async fn scrape_download_page(&self, id: &str, referer: &str, sinks: &SinkSet) {
        if let Err(e) = self.try_scrape_download_page(id, referer, sinks).await {
            debug!(error = %e, "download page scrape produced no links");
        }
    }

    async fn try_scrape_download_page(
        &self,
        id: &str,
        referer: &str,
        sinks: &SinkSet,
    ) -> Result<(), ExtractorError> {
        let url = self.download_url(id);
        let response = self
            .http
            .get(&url)
            .header(reqwest::header::REFERER, referer)
            .send()
            .await?
            .error_for_status()?;
        let page_url = response.url().to_string();
        let html = response.text().await?;

        let links = parse_download_links(&html);
        let tasks = links.into_iter().map(|link| {
            let url = url.clone();
            let page_url = page_url.clone();
            async move {
                if !self.registry.dispatch(&link.href, Some(&url), sinks).await {
                    // Routing miss: surface the raw anchor directly.
                    sinks.link(MediaLink {
                        provider: self.http.name.clone(),
                        source_name: self.http.name.clone(),
                        url: link.href.clone(),
                        referer: page_url,
                        quality: link.quality,
                        is_m3u8: link.href.contains(".m3u8"),
                    });
                }
            }
        });
        join_all(tasks).await;
        Ok(())
    }

    async fn dispatch_server_list(&self, embed_url: &str, is_casting: bool, sinks: &SinkSet) {
        if let Err(e) = self
            .try_dispatch_server_list(embed_url, is_casting, sinks)
            .await
        {
            debug!(error = %e, "server list dispatch produced no links");
        }
    }

    async fn try_dispatch_server_list(
        &self,
        embed_url: &str,
        is_casting: bool,
        sinks: &SinkSet,
    ) -> Result<(), ExtractorError> {
        let page = EmbedPage::fetch(&self.http, embed_url).await?;
        let links = page.server_links();
        let tasks = links.iter().map(|link| {
            self.registry
                .dispatch_all(link, Some(embed_url), is_casting, sinks)
        });
        join_all(tasks).await;
        Ok(())
    }
}
