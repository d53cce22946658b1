//! Metadata frame decoding.
//!
//! A frame is one length byte (in 16-byte units) followed by a NUL-padded
//! payload such as `StreamTitle='Artist - Song';StreamUrl='';`. This module
//! holds the pure pieces: sizing, NUL trimming, encoding detection, text
//! decoding and the `key=value` segment rules, plus the reusable scratch
//! buffer the adapters read payloads into.

use std::fmt;
use std::str::FromStr;

use bytes::BytesMut;
use serde::{Deserialize, Serialize};

use crate::error::{IcyError, IcyResult};
use crate::protocol_constants::{FRAME_UNIT, INITIAL_SCRATCH_LEN, MAX_FRAME_LEN};

/// Payload size announced by a length-indicator byte.
#[inline]
#[must_use]
pub const fn frame_len(indicator: u8) -> usize {
    indicator as usize * FRAME_UNIT
}

/// Length of the payload up to (not including) the first NUL byte.
#[must_use]
pub fn effective_len(payload: &[u8]) -> usize {
    payload.iter().position(|&b| b == 0).unwrap_or(payload.len())
}

/// Checks that every leading byte is followed by the continuation bytes its
/// high-bit pattern announces.
///
/// This is a structural scan, not full validation: it accepts the legacy
/// 5- and 6-byte forms and does not reject overlong encodings. Strict
/// decoding happens afterwards in [`TextEncoding::decode`].
#[must_use]
pub fn looks_like_utf8(bytes: &[u8]) -> bool {
    let mut iter = bytes.iter();

    while let Some(&lead) = iter.next() {
        let continuation = if lead & 0b1000_0000 == 0 {
            0
        } else if lead & 0b1110_0000 == 0b1100_0000 {
            1
        } else if lead & 0b1111_0000 == 0b1110_0000 {
            2
        } else if lead & 0b1111_1000 == 0b1111_0000 {
            3
        } else if lead & 0b1111_1100 == 0b1111_1000 {
            4
        } else if lead & 0b1111_1110 == 0b1111_1100 {
            5
        } else {
            return false;
        };

        for _ in 0..continuation {
            match iter.next() {
                Some(&b) if b & 0b1100_0000 == 0b1000_0000 => {}
                _ => return false,
            }
        }
    }

    true
}

/// Character encoding of metadata text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
}

impl TextEncoding {
    /// Canonical label of the encoding.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Latin1 => "ISO-8859-1",
        }
    }

    /// Picks the encoding for one frame.
    ///
    /// Bytes that fail the UTF-8 structure scan are always read as Latin-1.
    /// The fallback applies to this frame only; `preferred` is not changed.
    #[must_use]
    pub fn for_frame(self, payload: &[u8]) -> Self {
        if looks_like_utf8(payload) {
            self
        } else {
            Self::Latin1
        }
    }

    /// Decodes `bytes` as text in this encoding.
    pub fn decode(self, bytes: &[u8]) -> IcyResult<String> {
        match self {
            Self::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| IcyError::Decode {
                    encoding: self.label(),
                    reason: e.to_string(),
                }),
            Self::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TextEncoding {
    type Err = IcyError;

    fn from_str(s: &str) -> IcyResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => Ok(Self::Latin1),
            other => Err(IcyError::UnknownEncoding(other.to_string())),
        }
    }
}

impl TryFrom<String> for TextEncoding {
    type Error = IcyError;

    fn try_from(value: String) -> IcyResult<Self> {
        value.parse()
    }
}

impl From<TextEncoding> for String {
    fn from(encoding: TextEncoding) -> Self {
        encoding.label().to_string()
    }
}

/// Trims NUL padding from a raw payload and decodes it.
///
/// `preferred` is the caller's configured encoding; it is only overridden
/// for this payload when the bytes cannot be UTF-8.
pub fn decode_payload(payload: &[u8], preferred: TextEncoding) -> IcyResult<String> {
    let payload = &payload[..effective_len(payload)];
    preferred.for_frame(payload).decode(payload)
}

/// Parses one `key=value` segment.
///
/// Returns `None` when there is no `=` or the key is empty. A value wrapped
/// in single quotes has them stripped; embedded quotes and semicolons are
/// not escaped on the wire and are left alone.
#[must_use]
pub fn parse_segment(segment: &str) -> Option<(&str, &str)> {
    let (key, value) = segment.split_once('=')?;
    if key.is_empty() {
        return None;
    }

    let value = value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .unwrap_or(value);

    Some((key, value))
}

/// Splits decoded frame text on `;` and yields each parsable pair in order.
pub fn parse_pairs(text: &str) -> impl Iterator<Item = (&str, &str)> {
    text.split(';').filter_map(parse_segment)
}

/// Reusable buffer a metadata payload is read into.
///
/// Grows to the largest frame seen and never shrinks, so steady-state
/// streams stop allocating after the first few frames. Tracks how much of
/// the current frame has been filled so reads can resume across calls.
#[derive(Debug)]
pub struct FrameScratch {
    buf: BytesMut,
    target: usize,
    filled: usize,
}

impl FrameScratch {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: BytesMut::zeroed(INITIAL_SCRATCH_LEN),
            target: 0,
            filled: 0,
        }
    }

    /// Prepares the buffer for a payload of `size` bytes.
    pub fn begin(&mut self, size: usize) {
        debug_assert!(size <= MAX_FRAME_LEN, "frame of {} bytes", size);
        if self.buf.len() < size {
            self.buf.resize(size, 0);
            log::debug!("[ICY] Enlarged metadata buffer to {} bytes", size);
        }
        self.target = size;
        self.filled = 0;
    }

    /// The part of the current frame still waiting for bytes.
    pub fn unfilled_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.filled..self.target]
    }

    /// Records `n` bytes written into [`unfilled_mut`](Self::unfilled_mut).
    pub fn advance(&mut self, n: usize) {
        debug_assert!(self.filled + n <= self.target);
        self.filled = (self.filled + n).min(self.target);
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.filled == self.target
    }

    /// Bytes of the current frame received so far.
    #[must_use]
    pub fn filled(&self) -> &[u8] {
        &self.buf[..self.filled]
    }

    /// Bytes the buffer can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }
}

impl Default for FrameScratch {
    fn default() -> Self {
        Self::new()
    }
}
