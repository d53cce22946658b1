//! The I/O-free core shared by the blocking and async adapters.
//!
//! [`IcyDemuxer`] owns the byte cursor, the scratch buffer, the sink and the
//! configured encoding. Adapters drive it in three steps: read audio within
//! [`audio_limit`](IcyDemuxer::audio_limit) and report it, then while a frame
//! is pending feed it the length byte and payload bytes from the source.

use super::cursor::{Boundary, IcyCursor, MetaInterval};
use super::frame::{decode_payload, frame_len, parse_pairs, FrameScratch, TextEncoding};
use crate::metadata::MetadataSink;

/// What the demuxer needs from the source next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    /// Counting audio bytes; no frame in progress.
    Audio,
    /// At a boundary, waiting for the length-indicator byte.
    Length,
    /// Waiting for more payload bytes of the current frame.
    Payload,
}

/// Metadata-interleave state machine.
pub struct IcyDemuxer {
    cursor: IcyCursor,
    scratch: FrameScratch,
    sink: Option<Box<dyn MetadataSink>>,
    encoding: TextEncoding,
    phase: FramePhase,
}

impl IcyDemuxer {
    #[must_use]
    pub fn new(interval: MetaInterval) -> Self {
        Self {
            cursor: IcyCursor::new(interval),
            scratch: FrameScratch::new(),
            sink: None,
            encoding: TextEncoding::default(),
            phase: FramePhase::Audio,
        }
    }

    pub fn set_sink(&mut self, sink: impl MetadataSink + 'static) {
        self.sink = Some(Box::new(sink));
    }

    /// Encoding used for frames that look like valid UTF-8.
    #[must_use]
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn set_encoding(&mut self, encoding: TextEncoding) {
        self.encoding = encoding;
    }

    #[must_use]
    pub fn cursor(&self) -> &IcyCursor {
        &self.cursor
    }

    #[must_use]
    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// True while a metadata frame still has to be pulled from the source.
    #[must_use]
    pub fn frame_pending(&self) -> bool {
        self.phase != FramePhase::Audio
    }

    #[must_use]
    pub fn scratch_capacity(&self) -> usize {
        self.scratch.capacity()
    }

    /// Largest audio read allowed before the next frame.
    #[must_use]
    pub fn audio_limit(&self, len: usize) -> usize {
        debug_assert!(!self.frame_pending(), "audio read while a frame is pending");
        self.cursor.audio_limit(len)
    }

    /// Reports `n` audio bytes delivered by a buffered read.
    pub fn on_audio(&mut self, n: usize) -> Boundary {
        let boundary = self.cursor.advance(n);
        self.enter_frame_if(boundary);
        boundary
    }

    /// Reports one audio byte delivered by a single-byte read.
    pub fn on_audio_byte(&mut self) -> Boundary {
        let boundary = self.cursor.advance_byte();
        self.enter_frame_if(boundary);
        boundary
    }

    fn enter_frame_if(&mut self, boundary: Boundary) {
        if boundary.is_reached() {
            self.phase = FramePhase::Length;
        }
    }

    /// Feeds the length-indicator byte, `None` on end of stream.
    ///
    /// A missing or zero indicator means no metadata this cycle.
    pub fn on_length(&mut self, indicator: Option<u8>) {
        debug_assert_eq!(self.phase, FramePhase::Length);
        match indicator {
            Some(indicator) if indicator > 0 => {
                self.scratch.begin(frame_len(indicator));
                self.phase = FramePhase::Payload;
            }
            _ => self.phase = FramePhase::Audio,
        }
    }

    /// Buffer to read the next payload bytes into.
    pub fn payload_buf(&mut self) -> &mut [u8] {
        debug_assert_eq!(self.phase, FramePhase::Payload);
        self.scratch.unfilled_mut()
    }

    /// Reports `n` payload bytes written into [`payload_buf`](Self::payload_buf).
    ///
    /// `n == 0` is end of stream: the frame is cut short and whatever arrived
    /// is still parsed.
    pub fn on_payload(&mut self, n: usize) {
        debug_assert_eq!(self.phase, FramePhase::Payload);
        self.scratch.advance(n);
        if n == 0 || self.scratch.is_complete() {
            if n == 0 {
                log::debug!(
                    "[ICY] Stream ended inside metadata frame after {} bytes",
                    self.scratch.filled().len()
                );
            }
            self.finish_frame();
        }
    }

    /// Drops the frame in progress after a transport error.
    pub fn abandon_frame(&mut self) {
        if self.frame_pending() {
            log::debug!("[ICY] Abandoning metadata frame");
        }
        self.phase = FramePhase::Audio;
    }

    fn finish_frame(&mut self) {
        self.phase = FramePhase::Audio;

        let Some(sink) = self.sink.as_mut() else {
            return;
        };

        let text = match decode_payload(self.scratch.filled(), self.encoding) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("[ICY] Dropping metadata frame: {}", e);
                return;
            }
        };

        log::trace!("[ICY] Metadata string: {}", text);

        for (key, value) in parse_pairs(&text) {
            sink.on_metadata(key, value);
        }
    }
}
