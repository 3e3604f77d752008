use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine, prelude::BASE64_STANDARD};

use super::page::EmbedPage;
use crate::extractor::embed::Extractor;
use crate::extractor::error::ExtractorError;

/// External key-lookup collaborator for adaptive key derivation.
///
/// Opaque to the resolver: given `base64decode(id) + iv` it may or may not
/// produce a key. A miss degrades the encrypted-endpoint strategy to no
/// output.
#[async_trait]
pub trait KeyLookup: Send + Sync {
    async fn lookup(&self, seed: &str) -> Option<String>;
}

/// Crypto parameters for the encrypt-ajax handshake.
///
/// All three key fields may be statically configured, or left out and
/// derived at runtime when `adaptive_keys` is set. Derived values are
/// request-scoped; nothing is memoized across resolution calls.
#[derive(Clone, Default)]
pub struct CryptoConfig {
    pub iv: Option<String>,
    pub key: Option<String>,
    pub decrypt_key: Option<String>,
    /// Derive missing parameters from the page and the key-lookup service.
    pub adaptive_keys: bool,
    /// Build the ajax query from the encrypted episode script blob.
    pub adaptive_data: bool,
    pub key_lookup: Option<Arc<dyn KeyLookup>>,
}

impl fmt::Debug for CryptoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoConfig")
            .field("iv", &self.iv.as_deref().map(|_| "<set>"))
            .field("key", &self.key.as_deref().map(|_| "<set>"))
            .field("decrypt_key", &self.decrypt_key.as_deref().map(|_| "<set>"))
            .field("adaptive_keys", &self.adaptive_keys)
            .field("adaptive_data", &self.adaptive_data)
            .field("key_lookup", &self.key_lookup.as_ref().map(|_| "<set>"))
            .finish()
    }
}

impl CryptoConfig {
    pub fn with_static(
        iv: impl Into<String>,
        key: impl Into<String>,
        decrypt_key: impl Into<String>,
    ) -> Self {
        Self {
            iv: Some(iv.into()),
            key: Some(key.into()),
            decrypt_key: Some(decrypt_key.into()),
            ..Self::default()
        }
    }

    pub fn adaptive(key_lookup: Arc<dyn KeyLookup>) -> Self {
        Self {
            adaptive_keys: true,
            adaptive_data: true,
            key_lookup: Some(key_lookup),
            ..Self::default()
        }
    }
}

/// The (iv, key, decrypt key) triple actually used for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKeys {
    pub iv: String,
    pub key: String,
    pub decrypt_key: String,
}

impl CryptoConfig {
    /// Produces the request-scoped key triple.
    ///
    /// With adaptive derivation disabled every static field is required and
    /// a missing one aborts before any network activity. With it enabled,
    /// the IV falls back to the embed page's wrapper class token (fetching
    /// the page only when no cached one is supplied) and the key to the
    /// external lookup seeded with `base64decode(id) + iv`.
    pub(crate) async fn resolve(
        &self,
        id: &str,
        embed_url: &str,
        http: &Extractor,
        page: &mut Option<EmbedPage>,
    ) -> Result<ResolvedKeys, ExtractorError> {
        if !self.adaptive_keys {
            let iv = self
                .iv
                .clone()
                .ok_or(ExtractorError::MissingCryptoConfig("iv"))?;
            let key = self
                .key
                .clone()
                .ok_or(ExtractorError::MissingCryptoConfig("key"))?;
            let decrypt_key = self
                .decrypt_key
                .clone()
                .ok_or(ExtractorError::MissingCryptoConfig("decrypt_key"))?;
            return Ok(ResolvedKeys {
                iv,
                key,
                decrypt_key,
            });
        }

        let iv = match &self.iv {
            Some(iv) => iv.clone(),
            None => {
                if page.is_none() {
                    *page = Some(EmbedPage::fetch(http, embed_url).await?);
                }
                page.as_ref()
                    .and_then(EmbedPage::wrapper_class_token)
                    .ok_or_else(|| {
                        ExtractorError::KeyDerivation(
                            "wrapper container class token not found".to_string(),
                        )
                    })?
            }
        };

        let key = match &self.key {
            Some(key) => key.clone(),
            None => {
                let lookup = self.key_lookup.as_ref().ok_or_else(|| {
                    ExtractorError::KeyDerivation("no key lookup configured".to_string())
                })?;
                let decoded_id = BASE64_STANDARD.decode(id).map_err(|e| {
                    ExtractorError::KeyDerivation(format!("identifier is not base64: {e}"))
                })?;
                let decoded_id = String::from_utf8(decoded_id).map_err(|_| {
                    ExtractorError::KeyDerivation("decoded identifier is not utf-8".to_string())
                })?;
                lookup
                    .lookup(&format!("{decoded_id}{iv}"))
                    .await
                    .ok_or_else(|| {
                        ExtractorError::KeyDerivation("key lookup returned nothing".to_string())
                    })?
            }
        };

        let decrypt_key = self.decrypt_key.clone().unwrap_or_else(|| key.clone());

        Ok(ResolvedKeys {
            iv,
            key,
            decrypt_key,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::extractor::default::default_client;

    /// Lookup double recording every invocation.
    pub(crate) struct RecordingLookup {
        pub calls: AtomicUsize,
        pub seeds: Mutex<Vec<String>>,
        pub answer: Option<String>,
    }

    impl RecordingLookup {
        pub(crate) fn new(answer: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                seeds: Mutex::new(Vec::new()),
                answer: answer.map(str::to_owned),
            })
        }
    }

    #[async_trait]
    impl KeyLookup for RecordingLookup {
        async fn lookup(&self, seed: &str) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seeds.lock().unwrap().push(seed.to_string());
            self.answer.clone()
        }
    }

    fn http() -> Extractor {
        Extractor::new("Vidstream", "https://host.example", default_client())
    }

    const EMBED_HTML: &str = r#"<html><body>
        <div class="wrapper container-3134003223491201">
            <script data-name="episode" data-value="blob"></script>
        </div>
    </body></html>"#;

    #[tokio::test]
    async fn test_static_config_resolves_without_network() {
        let config = CryptoConfig::with_static("iv", "key", "deckey");
        let mut page = None;
        // The embed url is unroutable; resolution must not touch it.
        let keys = config
            .resolve("MTIzNDU2", "http://127.0.0.1:1/streaming.php?id=MTIzNDU2", &http(), &mut page)
            .await
            .unwrap();
        assert_eq!(keys.iv, "iv");
        assert_eq!(keys.key, "key");
        assert_eq!(keys.decrypt_key, "deckey");
        assert!(page.is_none());
    }

    #[tokio::test]
    async fn test_missing_static_key_aborts_before_any_call() {
        let lookup = RecordingLookup::new(Some("unused"));
        let config = CryptoConfig {
            iv: Some("iv".to_string()),
            key: None,
            decrypt_key: Some("deckey".to_string()),
            adaptive_keys: false,
            adaptive_data: false,
            key_lookup: Some(lookup.clone()),
        };
        let mut page = None;
        let err = config
            .resolve("MTIzNDU2", "http://127.0.0.1:1/streaming.php?id=MTIzNDU2", &http(), &mut page)
            .await
            .unwrap_err();
        // A network attempt against 127.0.0.1:1 would surface as HttpError.
        assert!(matches!(err, ExtractorError::MissingCryptoConfig("key")));
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
        assert!(page.is_none());
    }

    #[tokio::test]
    async fn test_adaptive_derivation_from_cached_page() {
        let lookup = RecordingLookup::new(Some("37911490979715163134003223491201"));
        let config = CryptoConfig {
            adaptive_keys: true,
            key_lookup: Some(lookup.clone()),
            ..CryptoConfig::default()
        };
        let mut page = Some(EmbedPage::new(
            "https://host.example/streaming.php?id=MTIzNDU2",
            EMBED_HTML,
        ));
        let keys = config
            .resolve("MTIzNDU2", "https://host.example/streaming.php?id=MTIzNDU2", &http(), &mut page)
            .await
            .unwrap();
        assert_eq!(keys.iv, "3134003223491201");
        assert_eq!(keys.key, "37911490979715163134003223491201");
        // Decrypt key defaults to the derived key.
        assert_eq!(keys.decrypt_key, keys.key);
        // Seed is base64decode("MTIzNDU2") + iv.
        assert_eq!(lookup.seeds.lock().unwrap()[0], "1234563134003223491201");
    }

    #[tokio::test]
    async fn test_adaptive_iv_miss_degrades() {
        let lookup = RecordingLookup::new(Some("unused"));
        let config = CryptoConfig {
            adaptive_keys: true,
            key_lookup: Some(lookup.clone()),
            ..CryptoConfig::default()
        };
        let mut page = Some(EmbedPage::new(
            "https://host.example/streaming.php?id=MTIzNDU2",
            "<html><body><div class=\"plain\"></div></body></html>",
        ));
        let err = config
            .resolve("MTIzNDU2", "https://host.example/streaming.php?id=MTIzNDU2", &http(), &mut page)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractorError::KeyDerivation(_)));
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_adaptive_lookup_miss_degrades() {
        let lookup = RecordingLookup::new(None);
        let config = CryptoConfig {
            adaptive_keys: true,
            key_lookup: Some(lookup.clone()),
            ..CryptoConfig::default()
        };
        let mut page = Some(EmbedPage::new(
            "https://host.example/streaming.php?id=MTIzNDU2",
            EMBED_HTML,
        ));
        let err = config
            .resolve("MTIzNDU2", "https://host.example/streaming.php?id=MTIzNDU2", &http(), &mut page)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractorError::KeyDerivation(_)));
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
    }
}
