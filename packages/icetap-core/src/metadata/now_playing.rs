//! Track-level view of the metadata side channel.

use std::sync::Arc;

use parking_lot::RwLock;

use super::{MetadataSink, StreamMetadata};
use crate::protocol_constants::{STREAM_TITLE_KEY, STREAM_URL_KEY};

type ChangeListener = Box<dyn FnMut(&StreamMetadata) + Send>;

/// Sink that keeps the current track and reports when it changes.
///
/// Stations repeat the same `StreamTitle` in every frame, so the listener is
/// only called when the title actually differs from the previous one. Empty
/// titles are ignored: some stations blank the title between tracks.
pub struct NowPlaying {
    current: Arc<RwLock<StreamMetadata>>,
    on_change: Option<ChangeListener>,
}

impl NowPlaying {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Arc::new(RwLock::new(StreamMetadata::default())),
            on_change: None,
        }
    }

    /// Registers a listener called with the new metadata on each track change.
    #[must_use]
    pub fn on_change(mut self, listener: impl FnMut(&StreamMetadata) + Send + 'static) -> Self {
        self.on_change = Some(Box::new(listener));
        self
    }

    /// Returns a cloneable handle for reading the current track elsewhere.
    #[must_use]
    pub fn handle(&self) -> NowPlayingHandle {
        NowPlayingHandle {
            current: Arc::clone(&self.current),
        }
    }

    fn update_title(&mut self, value: &str) {
        if value.trim().is_empty() {
            log::trace!("[ICY] Ignoring empty StreamTitle");
            return;
        }

        let snapshot = {
            let mut current = self.current.write();
            if current.raw_title.as_deref() == Some(value) {
                return;
            }
            current.set_stream_title(value);
            current.clone()
        };

        log::info!("[ICY] Now playing: {}", value);
        if let Some(listener) = self.on_change.as_mut() {
            listener(&snapshot);
        }
    }
}

impl Default for NowPlaying {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataSink for NowPlaying {
    fn on_metadata(&mut self, key: &str, value: &str) {
        if key.eq_ignore_ascii_case(STREAM_TITLE_KEY) {
            self.update_title(value);
        } else if key.eq_ignore_ascii_case(STREAM_URL_KEY) {
            let url = value.trim();
            self.current.write().url = (!url.is_empty()).then(|| url.to_string());
        } else {
            log::trace!("[ICY] Unhandled metadata key {}={}", key, value);
        }
    }
}

/// Read-only view of a [`NowPlaying`] sink.
#[derive(Clone)]
pub struct NowPlayingHandle {
    current: Arc<RwLock<StreamMetadata>>,
}

impl NowPlayingHandle {
    /// Returns a copy of the current track metadata.
    #[must_use]
    pub fn current(&self) -> StreamMetadata {
        self.current.read().clone()
    }
}
