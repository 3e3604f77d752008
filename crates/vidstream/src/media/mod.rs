pub mod media_link;
pub mod quality;
pub mod subtitle;

pub use media_link::MediaLink;
pub use quality::Quality;
pub use subtitle::SubtitleTrack;
