use std::sync::{Arc, Mutex, PoisonError};

use crate::media::{MediaLink, SubtitleTrack};

/// Callback receiving every discovered media link.
///
/// Sinks are shared across concurrently running strategies, so they must
/// tolerate invocation from multiple tasks. No ordering is guaranteed
/// between tasks; within one decode step emission order is preserved.
pub type LinkSink = Arc<dyn Fn(MediaLink) + Send + Sync>;
pub type SubtitleSink = Arc<dyn Fn(SubtitleTrack) + Send + Sync>;

/// The pair of sinks every strategy writes into.
#[derive(Clone)]
pub struct SinkSet {
    pub on_link: LinkSink,
    pub on_subtitle: SubtitleSink,
}

impl SinkSet {
    pub fn new(on_link: LinkSink, on_subtitle: SubtitleSink) -> Self {
        Self {
            on_link,
            on_subtitle,
        }
    }

    pub fn link(&self, link: MediaLink) {
        (self.on_link)(link);
    }

    pub fn subtitle(&self, track: SubtitleTrack) {
        (self.on_subtitle)(track);
    }
}

/// Append-only accumulator backing a [`SinkSet`].
///
/// Convenience for callers (and tests) that want the resolved links as a
/// list instead of wiring their own callbacks. A poisoned lock is recovered
/// rather than propagated; the accumulated lists stay readable.
#[derive(Default)]
pub struct LinkCollector {
    links: Mutex<Vec<MediaLink>>,
    subtitles: Mutex<Vec<SubtitleTrack>>,
}

impl LinkCollector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sinks(self: &Arc<Self>) -> SinkSet {
        let links = Arc::clone(self);
        let subtitles = Arc::clone(self);
        SinkSet::new(
            Arc::new(move |link| {
                links
                    .links
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(link);
            }),
            Arc::new(move |track| {
                subtitles
                    .subtitles
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(track);
            }),
        )
    }

    pub fn links(&self) -> Vec<MediaLink> {
        self.links
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn subtitles(&self) -> Vec<SubtitleTrack> {
        self.subtitles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
