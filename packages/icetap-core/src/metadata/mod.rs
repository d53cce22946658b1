//! Consumers of demuxed metadata.
//!
//! The demuxer reports raw `key=value` pairs through a [`MetadataSink`].
//! [`NowPlaying`] is the sink a player usually wants: it folds the pairs into
//! a [`StreamMetadata`] snapshot and notifies on track changes.

pub mod now_playing;
pub mod sink;

pub use now_playing::{NowPlaying, NowPlayingHandle};
pub use sink::{LoggingSink, MetadataSink, NoopSink};

use serde::{Deserialize, Serialize};

/// Metadata for the track currently on air.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    /// The `StreamTitle` value exactly as the station sent it.
    pub raw_title: Option<String>,
    /// The `StreamUrl` value, when the station sends a non-empty one.
    pub url: Option<String>,
}

impl StreamMetadata {
    /// Creates metadata from a `StreamTitle` value.
    ///
    /// Splits on the first `" - "`: `"Artist - Title"` gives both fields.
    /// Without a separator the whole string becomes the title.
    #[must_use]
    pub fn from_stream_title(raw: &str) -> Self {
        let mut metadata = Self::default();
        metadata.set_stream_title(raw);
        metadata
    }

    /// Replaces the title fields from a new `StreamTitle` value, keeping `url`.
    pub fn set_stream_title(&mut self, raw: &str) {
        let (artist, title) = match raw.split_once(" - ") {
            Some((artist, title)) => (non_empty(artist), non_empty(title)),
            None => (None, non_empty(raw)),
        };
        self.artist = artist;
        self.title = title;
        self.raw_title = (!raw.trim().is_empty()).then(|| raw.to_string());
    }

    /// Formats the track the way stations announce it: `"Artist - Title"`.
    #[must_use]
    pub fn display_title(&self) -> Option<String> {
        match (&self.artist, &self.title) {
            (Some(a), Some(t)) => Some(format!("{} - {}", a, t)),
            (None, Some(t)) => Some(t.clone()),
            (Some(a), None) => Some(a.clone()),
            (None, None) => None,
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}
