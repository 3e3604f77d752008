use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use super::embed::EmbedExtractor;
use super::sink::SinkSet;

/// Ordered collection of per-site embed extractors.
///
/// Constructed once at startup and passed by reference to the orchestrator;
/// never ambient global state. Dispatch order follows registration order.
#[derive(Default)]
pub struct ExtractorRegistry {
    extractors: Vec<Arc<dyn EmbedExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, extractor: Arc<dyn EmbedExtractor>) -> &mut Self {
        self.extractors.push(extractor);
        self
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Routes `url` to the first extractor claiming it.
    ///
    /// Returns `false` on a routing miss so the caller can fall back to
    /// emitting the raw link. An extractor failure still counts as handled;
    /// it is logged and contained here.
    pub async fn dispatch(&self, url: &str, referer: Option<&str>, sinks: &SinkSet) -> bool {
        for extractor in &self.extractors {
            if !extractor.handles(url) {
                continue;
            }
            if let Err(e) = extractor.extract(url, referer, sinks).await {
                debug!(extractor = extractor.name(), url, error = %e, "extractor produced no links");
            }
            return true;
        }
        false
    }

    /// Fans `url` out to every claiming extractor concurrently.
    ///
    /// Extractors that need a Referer header are skipped while casting,
    /// since casting playback cannot supply custom headers.
    pub async fn dispatch_all(
        &self,
        url: &str,
        referer: Option<&str>,
        is_casting: bool,
        sinks: &SinkSet,
    ) {
        let tasks = self
            .extractors
            .iter()
            .filter(|e| !e.requires_referer() || !is_casting)
            .filter(|e| e.handles(url))
            .map(|extractor| async move {
                if let Err(e) = extractor.extract(url, referer, sinks).await {
                    debug!(extractor = extractor.name(), url, error = %e, "extractor produced no links");
                }
            });
        join_all(tasks).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::extractor::error::ExtractorError;
    use crate::extractor::sink::LinkCollector;
    use crate::media::{MediaLink, Quality};

    struct StubExtractor {
        name: &'static str,
        base_url: &'static str,
        requires_referer: bool,
        calls: AtomicUsize,
    }

    impl StubExtractor {
        fn new(name: &'static str, base_url: &'static str, requires_referer: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                base_url,
                requires_referer,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl EmbedExtractor for StubExtractor {
        fn name(&self) -> &str {
            self.name
        }

        fn base_url(&self) -> &str {
            self.base_url
        }

        fn requires_referer(&self) -> bool {
            self.requires_referer
        }

        async fn extract(
            &self,
            url: &str,
            referer: Option<&str>,
            sinks: &SinkSet,
        ) -> Result<(), ExtractorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            sinks.link(MediaLink {
                provider: self.name.to_string(),
                source_name: self.name.to_string(),
                url: url.to_string(),
                referer: referer.unwrap_or_default().to_string(),
                quality: Quality::Unknown,
                is_m3u8: false,
            });
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_dispatch_first_match_wins() {
        let first = StubExtractor::new("First", "https://host.example", false);
        let second = StubExtractor::new("Second", "https://host.example", false);
        let mut registry = ExtractorRegistry::new();
        registry.register(first.clone()).register(second.clone());

        let collector = LinkCollector::new();
        let handled = registry
            .dispatch("https://host.example/e/abc", None, &collector.sinks())
            .await;

        assert!(handled);
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispatch_routing_miss() {
        let extractor = StubExtractor::new("Only", "https://host.example", false);
        let mut registry = ExtractorRegistry::new();
        registry.register(extractor.clone());

        let collector = LinkCollector::new();
        let handled = registry
            .dispatch("https://other.example/e/abc", None, &collector.sinks())
            .await;

        assert!(!handled);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
        assert!(collector.links().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_all_skips_referer_extractors_while_casting() {
        let needs_referer = StubExtractor::new("NeedsReferer", "https://host.example", true);
        let no_referer = StubExtractor::new("NoReferer", "https://host.example", false);
        let mut registry = ExtractorRegistry::new();
        registry
            .register(needs_referer.clone())
            .register(no_referer.clone());

        let collector = LinkCollector::new();
        registry
            .dispatch_all("https://host.example/e/abc", None, true, &collector.sinks())
            .await;

        assert_eq!(needs_referer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(no_referer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(collector.links().len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_all_runs_every_claiming_extractor() {
        let first = StubExtractor::new("First", "https://host.example", true);
        let second = StubExtractor::new("Second", "https://host.example", false);
        let mut registry = ExtractorRegistry::new();
        registry.register(first.clone()).register(second.clone());

        let collector = LinkCollector::new();
        registry
            .dispatch_all(
                "https://host.example/e/abc",
                Some("https://embed.example"),
                false,
                &collector.sinks(),
            )
            .await;

        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
        assert_eq!(collector.links().len(), 2);
    }
}
