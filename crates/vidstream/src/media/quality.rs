use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static LABEL_HEIGHT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{3,4})\s*[pP]").unwrap());

/// Normalized resolution tier derived from a human-readable label.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Quality {
    #[default]
    Unknown,
    P144,
    P240,
    P360,
    P480,
    P720,
    P1080,
    P1440,
    P2160,
}

impl Quality {
    /// Parses a tier out of labels like `"1080 P"`, `"720p"` or `"SD 480P"`.
    /// Labels without a resolution marker (e.g. `"auto"`) map to `Unknown`.
    pub fn from_label(label: &str) -> Self {
        LABEL_HEIGHT_REGEX
            .captures(label)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .map(Self::from_height)
            .unwrap_or_default()
    }

    pub fn from_height(height: u32) -> Self {
        match height {
            0..=200 => Quality::P144,
            201..=300 => Quality::P240,
            301..=400 => Quality::P360,
            401..=600 => Quality::P480,
            601..=900 => Quality::P720,
            901..=1200 => Quality::P1080,
            1201..=1600 => Quality::P1440,
            _ => Quality::P2160,
        }
    }

    pub fn height(&self) -> Option<u32> {
        match self {
            Quality::Unknown => None,
            Quality::P144 => Some(144),
            Quality::P240 => Some(240),
            Quality::P360 => Some(360),
            Quality::P480 => Some(480),
            Quality::P720 => Some(720),
            Quality::P1080 => Some(1080),
            Quality::P1440 => Some(1440),
            Quality::P2160 => Some(2160),
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.height() {
            Some(height) => write!(f, "{height}p"),
            None => write!(f, "unknown"),
        }
    }
}
