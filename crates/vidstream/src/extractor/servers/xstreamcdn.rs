use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::extractor::embed::{EmbedExtractor, Extractor};
use crate::extractor::error::ExtractorError;
use crate::extractor::sink::SinkSet;
use crate::media::{MediaLink, Quality};

/// XStreamCdn answers a plain JSON source list on its `/api/source/{id}`
/// endpoint, no player scraping involved.
pub struct XStreamCdn {
    http: Extractor,
}

impl XStreamCdn {
    pub const MAIN_URL: &'static str = "https://fcdn.stream";

    pub fn new(client: Client) -> Self {
        Self {
            http: Extractor::new("XStreamCdn", Self::MAIN_URL, client),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Vec<ApiSource>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiSource {
    pub file: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

fn source_url(embed_url: &str) -> Result<String, ExtractorError> {
    let id = embed_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ExtractorError::InvalidUrl(embed_url.to_string()))?;
    Ok(format!("{}/api/source/{id}", XStreamCdn::MAIN_URL))
}

#[async_trait]
impl EmbedExtractor for XStreamCdn {
    fn name(&self) -> &str {
        &self.http.name
    }

    fn base_url(&self) -> &str {
        Self::MAIN_URL
    }

    // Files play straight off the CDN.
    fn requires_referer(&self) -> bool {
        false
    }

    async fn extract(
        &self,
        url: &str,
        referer: Option<&str>,
        sinks: &SinkSet,
    ) -> Result<(), ExtractorError> {
        let api_url = source_url(url)?;
        let mut request = self
            .http
            .request(reqwest::Method::POST, &api_url)
            .header("X-Requested-With", "XMLHttpRequest");
        if let Some(referer) = referer {
            request = request.header(reqwest::header::REFERER, referer);
        }
        let response: ApiResponse = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !response.success || response.data.is_empty() {
            return Err(ExtractorError::NoSourcesFound);
        }

        for source in &response.data {
            sinks.link(MediaLink {
                provider: self.http.name.clone(),
                source_name: self.http.name.clone(),
                url: source.file.clone(),
                referer: Self::MAIN_URL.to_string(),
                quality: source
                    .label
                    .as_deref()
                    .map(Quality::from_label)
                    .unwrap_or_default(),
                is_m3u8: source.kind.as_deref() == Some("hls")
                    || source.file.contains(".m3u8"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_url_from_embed() {
        assert_eq!(
            source_url("https://fcdn.stream/v/k8s72bnqlq").unwrap(),
            "https://fcdn.stream/api/source/k8s72bnqlq"
        );
        assert_eq!(
            source_url("https://fcdn.stream/v/k8s72bnqlq/").unwrap(),
            "https://fcdn.stream/api/source/k8s72bnqlq"
        );
    }

    #[test]
    fn test_api_response_shape() {
        let json = r#"{
            "success": true,
            "data": [
                {"file": "https://video.fcdn.stream/x/720.mp4", "label": "720p", "type": "mp4"},
                {"file": "https://video.fcdn.stream/x/360.mp4", "label": "360p", "type": "mp4"}
            ]
        }"#;
        let response: ApiResponse = serde_json::from_str(json).unwrap();
        assert!(response.success);
        assert_eq!(response.data.len(), 2);
        assert_eq!(Quality::from_label("720p"), Quality::P720);
    }

    #[test]
    fn test_api_response_failure_defaults() {
        let response: ApiResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert!(!response.success);
        assert!(response.data.is_empty());
    }
}
