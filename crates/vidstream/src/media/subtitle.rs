use serde::{Deserialize, Serialize};

/// Subtitle track surfaced by a delegated sub-extractor.
///
/// Pass-through for the resolver core: it is collected through the subtitle
/// sink without inspection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SubtitleTrack {
    pub url: String,
    pub label: String,
}
