use std::fmt;

use serde::{Deserialize, Serialize};

use super::quality::Quality;

/// A playable media link produced by an extraction strategy.
///
/// Many of these may be emitted per resolution request; ordering between
/// concurrent strategies is not significant and duplicates across the
/// upstream primary/backup source arrays are surfaced as-is.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MediaLink {
    // Provider that produced the link, e.g. "Vidstream"
    pub provider: String,
    // Display name of the concrete source/server
    pub source_name: String,
    // Url of the media
    pub url: String,
    // Referer (or base url) required to play the link
    pub referer: String,
    pub quality: Quality,
    // true for adaptive (HLS) streams
    pub is_m3u8: bool,
}

impl fmt::Display for MediaLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.source_name, self.quality, self.url)
    }
}
