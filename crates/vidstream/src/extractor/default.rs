use std::sync::Arc;

use reqwest::Client;
use rustls::{ClientConfig, crypto::ring};
use rustls_platform_verifier::BuilderVerifierExt;

use super::registry::ExtractorRegistry;
use super::servers::{Mp4Upload, XStreamCdn};

pub(crate) const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

pub fn default_client() -> Client {
    let provider = Arc::new(ring::default_provider());
    let tls_config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .expect("Failed to configure default TLS protocol versions")
        .with_platform_verifier()
        .unwrap()
        .with_no_client_auth();

    Client::builder()
        .use_preconfigured_tls(tls_config)
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .expect("Failed to create HTTP client")
}

/// Returns a new `ExtractorRegistry` populated with all the supported
/// embed hosts.
pub fn default_registry() -> ExtractorRegistry {
    let client = default_client();
    let mut registry = ExtractorRegistry::new();

    registry.register(Arc::new(Mp4Upload::new(client.clone())));
    registry.register(Arc::new(XStreamCdn::new(client)));

    registry
}
