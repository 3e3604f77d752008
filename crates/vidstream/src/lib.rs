//! Resolver for Vidstream-family video embed pages.
//!
//! One call fans a page identifier out over three concurrent discovery
//! strategies (the encrypted ajax endpoint, the download page, the embedded
//! server list) and streams every playable link it finds into
//! caller-supplied sinks.

pub mod extractor;
pub mod media;

pub use extractor::embed::{EmbedExtractor, Extractor};
pub use extractor::error::ExtractorError;
pub use extractor::registry::ExtractorRegistry;
pub use extractor::sink::{LinkCollector, SinkSet};
pub use extractor::vidstream::VidstreamExtractor;
pub use extractor::vidstream::keys::{CryptoConfig, KeyLookup};
pub use extractor::{default_client, default_registry};
pub use media::{MediaLink, Quality, SubtitleTrack};
