use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;

use crate::extractor::embed::{EmbedExtractor, Extractor};
use crate::extractor::error::ExtractorError;
use crate::extractor::sink::SinkSet;
use crate::media::{MediaLink, Quality};

static PLAYER_SRC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"player\.src\(\{[^}]*?src:\s*"([^"]+)""#).unwrap());
static FILE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"file:\s*"([^"]+)""#).unwrap());
static HEIGHT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"WIDTH=\d+x(\d+)").unwrap());

/// Mp4Upload hosts a plain progressive file behind a scripted player; the
/// direct url sits in the embed page's player setup.
pub struct Mp4Upload {
    http: Extractor,
}

impl Mp4Upload {
    pub const MAIN_URL: &'static str = "https://www.mp4upload.com";

    pub fn new(client: Client) -> Self {
        let mut http = Extractor::new("Mp4Upload", Self::MAIN_URL, client);
        http.set_referer_static(Self::MAIN_URL);
        Self { http }
    }
}

pub(crate) fn find_video_src(html: &str) -> Option<String> {
    PLAYER_SRC_REGEX
        .captures(html)
        .or_else(|| FILE_REGEX.captures(html))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

#[async_trait]
impl EmbedExtractor for Mp4Upload {
    fn name(&self) -> &str {
        &self.http.name
    }

    fn base_url(&self) -> &str {
        Self::MAIN_URL
    }

    // Playback rejects requests without the site referer.
    fn requires_referer(&self) -> bool {
        true
    }

    fn handles(&self, url: &str) -> bool {
        url.starts_with(Self::MAIN_URL) || url.starts_with("https://mp4upload.com")
    }

    async fn extract(
        &self,
        url: &str,
        referer: Option<&str>,
        sinks: &SinkSet,
    ) -> Result<(), ExtractorError> {
        let mut request = self.http.get(url);
        if let Some(referer) = referer {
            request = request.header(reqwest::header::REFERER, referer);
        }
        let html = request.send().await?.error_for_status()?.text().await?;

        let file =
            find_video_src(&html).ok_or_else(|| ExtractorError::NoSourcesFound)?;
        let quality = HEIGHT_REGEX
            .captures(&html)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .map(Quality::from_height)
            .unwrap_or_default();

        sinks.link(MediaLink {
            provider: self.http.name.clone(),
            source_name: self.http.name.clone(),
            url: file,
            referer: Self::MAIN_URL.to_string(),
            quality,
            is_m3u8: false,
        });
        Ok(())
    }
}
