use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::extractor::embed::Extractor;
use crate::extractor::error::ExtractorError;
use crate::media::Quality;

static WRAPPER_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"div.wrapper[class*="container"]"#).unwrap());
static EPISODE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[data-name="episode"]"#).unwrap());
static SERVER_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("ul.list-server-items > li.linkserver").unwrap());
static DOWNLOAD_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".dowload > a").unwrap());
static DOWNLOAD_QUALITY_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)P").unwrap());

/// A fetched embed page.
///
/// Holds the raw HTML and parses on demand inside the sync accessors; the
/// parsed DOM is not `Send`, so it never crosses an await point. Callers
/// that already fetched the page pass it along to avoid a second round
/// trip.
#[derive(Debug, Clone)]
pub struct EmbedPage {
    pub url: String,
    pub html: String,
}

impl EmbedPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }

    pub async fn fetch(http: &Extractor, url: &str) -> Result<Self, ExtractorError> {
        let response = http.get(url).send().await?.error_for_status()?;
        let url = response.url().to_string();
        let html = response.text().await?;
        Ok(Self { url, html })
    }

    /// Last hyphen-delimited token of the wrapper container's class
    /// attribute, the adaptive IV. First matching element wins.
    pub fn wrapper_class_token(&self) -> Option<String> {
        let document = Html::parse_document(&self.html);
        let element = document.select(&WRAPPER_SELECTOR).next()?;
        let class = element.attr("class")?;
        class.rsplit('-').next().map(str::to_owned)
    }

    /// Encrypted episode blob from `script[data-name="episode"]`.
    pub fn episode_data(&self) -> Option<String> {
        let document = Html::parse_document(&self.html);
        document
            .select(&EPISODE_SELECTOR)
            .next()
            .and_then(|el| el.attr("data-value"))
            .map(str::to_owned)
    }

    /// Per-server video links from the server list, deduplicated by the
    /// `data-video` attribute value, document order preserved.
    pub fn server_links(&self) -> Vec<String> {
        let document = Html::parse_document(&self.html);
        let mut links: Vec<String> = Vec::new();
        for element in document.select(&SERVER_SELECTOR) {
            let Some(link) = element.attr("data-video") else {
                continue;
            };
            if link.is_empty() || links.iter().any(|seen| seen == link) {
                continue;
            }
            links.push(link.to_owned());
        }
        links
    }
}

/// A classified anchor scraped off the download page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub href: String,
    pub text: String,
    pub quality: Quality,
}

/// Parses `.dowload > a` anchors. "HDP" text pins the 1080 tier regardless
/// of any other digits; otherwise the `<digits>P` marker decides.
pub fn parse_download_links(html: &str) -> Vec<DownloadLink> {
    let document = Html::parse_document(html);
    document
        .select(&DOWNLOAD_SELECTOR)
        .filter_map(|element| {
            let href = element.attr("href")?.to_owned();
            if href.is_empty() {
                return None;
            }
            let text = element.text().collect::<String>().trim().to_owned();
            let quality = if text.contains("HDP") {
                Quality::P1080
            } else {
                DOWNLOAD_QUALITY_REGEX
                    .captures(&text)
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| m.as_str().parse::<u32>().ok())
                    .map(Quality::from_height)
                    .unwrap_or_default()
            };
            Some(DownloadLink {
                href,
                text,
                quality,
            })
        })
        .collect()
}
