//! Client for the upstream encrypt-ajax endpoint.
//!
//! The endpoint answers with a loosely-shaped JSON wrapper whose `data`
//! field carries base64 ciphertext; decrypting it yields the actual source
//! list. Every failure here degrades this strategy to "no sources", never
//! the sibling strategies.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::crypto::{decrypt_aes, encrypt_aes};
use super::keys::CryptoConfig;
use super::page::EmbedPage;
use super::QualityApi;
use crate::extractor::embed::Extractor;
use crate::extractor::error::ExtractorError;
use crate::extractor::sink::SinkSet;
use crate::extractor::utils::capture_group_1_or_invalid_url;
use crate::media::{MediaLink, Quality};

static ID_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"id=([^&]+)").unwrap());

const PAYLOAD_PREFIX: &str = "{\"data\":\"";
const PAYLOAD_SUFFIX: &str = "\"}";

/// Decoded body of the encrypt-ajax response.
///
/// Primary and backup arrays are both surfaced unconditionally; backup is
/// not a fallback-only list.
#[derive(Debug, Deserialize)]
pub struct SourceList {
    #[serde(default)]
    pub source: Vec<SourceRecord>,
    #[serde(default, rename = "sourceBk", alias = "source_bk")]
    pub source_bk: Vec<SourceRecord>,
}

#[derive(Debug, Deserialize)]
pub struct SourceRecord {
    pub file: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub default: Option<DefaultFlag>,
}

/// The upstream serializes `default` as either a bool or the string "true".
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DefaultFlag {
    Bool(bool),
    Text(String),
}

impl DefaultFlag {
    pub fn as_bool(&self) -> bool {
        match self {
            DefaultFlag::Bool(b) => *b,
            DefaultFlag::Text(s) => s.eq_ignore_ascii_case("true"),
        }
    }
}

impl SourceRecord {
    pub fn is_m3u8(&self) -> bool {
        self.kind.as_deref() == Some("hls")
            || self
                .label
                .as_deref()
                .is_some_and(|label| label.to_lowercase().contains("auto"))
    }
}

/// Maps one decoded record into a media link and hands it to the sink.
pub(crate) fn emit_source(record: &SourceRecord, provider: &str, referer: &str, sinks: &SinkSet) {
    sinks.link(MediaLink {
        provider: provider.to_string(),
        source_name: provider.to_string(),
        url: record.file.clone(),
        referer: referer.to_string(),
        quality: record
            .label
            .as_deref()
            .map(Quality::from_label)
            .unwrap_or_default(),
        is_m3u8: record.is_m3u8(),
    });
}

/// Slices the base64 ciphertext out of the raw response body.
///
/// Deliberately not a full JSON parse: the wrapper is not guaranteed to be
/// well-formed outside this field.
pub(crate) fn extract_payload(body: &str) -> Option<&str> {
    let start = body.find(PAYLOAD_PREFIX)? + PAYLOAD_PREFIX.len();
    let rest = &body[start..];
    let end = rest.find(PAYLOAD_SUFFIX)?;
    Some(&rest[..end])
}

/// Resolves an embed url through the encrypt-ajax endpoint and emits every
/// decoded source.
///
/// `page` lets a caller that already fetched the embed document skip the
/// refetch; it is otherwise fetched lazily, and only when adaptive keys or
/// adaptive data actually need it.
pub async fn extract_encrypted_sources(
    http: &Extractor,
    embed_url: &str,
    crypto: &CryptoConfig,
    page: Option<EmbedPage>,
    sinks: &SinkSet,
) -> Result<(), ExtractorError> {
    let id = capture_group_1_or_invalid_url(&ID_REGEX, embed_url)?;

    let mut page = page;
    let keys = crypto.resolve(id, embed_url, http, &mut page).await?;

    let parsed = Url::parse(embed_url).map_err(|_| ExtractorError::InvalidUrl(embed_url.to_string()))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| ExtractorError::InvalidUrl(embed_url.to_string()))?;
    let main_url = format!("https://{host}");

    let encrypted_id = encrypt_aes(id.as_bytes(), keys.iv.as_bytes(), keys.key.as_bytes())?;

    let query = if crypto.adaptive_data {
        let page = match page.take() {
            Some(page) => page,
            None => EmbedPage::fetch(http, embed_url).await?,
        };
        let blob = page.episode_data().ok_or_else(|| {
            ExtractorError::KeyDerivation("episode data attribute not found".to_string())
        })?;
        let decrypted = decrypt_aes(&blob, keys.iv.as_bytes(), keys.key.as_bytes())?;
        // Everything after the first '&' carries upstream-defined extra
        // fields; their semantics stay opaque to this client.
        let extra = decrypted
            .split_once('&')
            .map(|(_, rest)| rest)
            .unwrap_or_default();
        format!("id={encrypted_id}&alias={id}&{extra}")
    } else {
        format!("id={encrypted_id}&alias={id}")
    };

    let body = http
        .get(&format!("{main_url}/encrypt-ajax.php?{query}"))
        .header("X-Requested-With", "XMLHttpRequest")
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let payload = extract_payload(&body).ok_or_else(|| {
        ExtractorError::DecodeError("ciphertext marker not found in response".to_string())
    })?;
    let decrypted = decrypt_aes(payload, keys.iv.as_bytes(), keys.decrypt_key.as_bytes())?;
    let sources: SourceList = serde_json::from_str(&decrypted)?;

    if sources.source.is_empty() && sources.source_bk.is_empty() {
        return Err(ExtractorError::NoSourcesFound);
    }

    for record in &sources.source {
        emit_source(record, &http.name, &main_url, sinks);
    }
    for record in &sources.source_bk {
        emit_source(record, &http.name, &main_url, sinks);
    }

    Ok(())
}

/// The encrypted-endpoint path packaged as one quality API, so the
/// orchestrator runs it as a sibling of the other discovery strategies.
pub struct EncryptedSourcesApi {
    http: Extractor,
    crypto: CryptoConfig,
}

impl EncryptedSourcesApi {
    pub fn new(name: impl Into<String>, client: Client, crypto: CryptoConfig) -> Self {
        let name = name.into();
        Self {
            http: Extractor::new(name.clone(), String::new(), client),
            crypto,
        }
    }
}

#[async_trait]
impl QualityApi for EncryptedSourcesApi {
    fn name(&self) -> &str {
        &self.http.name
    }

    fn embed_url(&self, main_url: &str, id: &str) -> String {
        format!("{main_url}/streaming.php?id={id}")
    }

    async fn resolve(&self, url: &str, sinks: &SinkSet) -> Result<(), ExtractorError> {
        extract_encrypted_sources(&self.http, url, &self.crypto, None, sinks).await
    }
}
