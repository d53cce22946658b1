//! Byte accounting between metadata frames.
//!
//! The cursor knows nothing about I/O. Adapters ask it how many audio bytes
//! they may read next and report back how many they actually got; the cursor
//! answers whether the metadata boundary has been reached.

use std::cmp::Ordering;
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{IcyError, IcyResult};

/// Interleave interval advertised by the transport (`icy-metaint`).
///
/// A missing or non-positive interval means the stream carries no in-band
/// metadata and the demuxer acts as a transparent passthrough.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "u32")]
pub struct MetaInterval(Option<NonZeroU32>);

impl MetaInterval {
    /// No metadata: every byte is audio.
    pub const PASSTHROUGH: Self = Self(None);

    /// Creates an interval from a signed byte count.
    ///
    /// Values `<= 0` select passthrough. Values beyond `u32::MAX` cannot be
    /// honoured and also fall back to passthrough, with a warning.
    #[must_use]
    pub fn new(bytes: i64) -> Self {
        if bytes <= 0 {
            return Self::PASSTHROUGH;
        }
        match u32::try_from(bytes) {
            Ok(value) => Self(NonZeroU32::new(value)),
            Err(_) => {
                log::warn!("[ICY] Metadata interval {} out of range, disabling metadata", bytes);
                Self::PASSTHROUGH
            }
        }
    }

    /// Returns the interval in bytes, `0` in passthrough mode.
    #[inline]
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.map_or(0, NonZeroU32::get)
    }

    #[inline]
    #[must_use]
    pub fn is_passthrough(self) -> bool {
        self.0.is_none()
    }
}

impl From<i64> for MetaInterval {
    fn from(bytes: i64) -> Self {
        Self::new(bytes)
    }
}

impl From<MetaInterval> for u32 {
    fn from(interval: MetaInterval) -> Self {
        interval.get()
    }
}

impl fmt::Display for MetaInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(bytes) => write!(f, "{} bytes", bytes),
            None => f.write_str("passthrough"),
        }
    }
}

impl FromStr for MetaInterval {
    type Err = IcyError;

    /// Parses a header value such as `"16000"`.
    ///
    /// Non-positive numbers are valid and mean passthrough; anything that is
    /// not an integer, or does not fit in 32 bits, is rejected.
    fn from_str(s: &str) -> IcyResult<Self> {
        let trimmed = s.trim();
        let bytes: i64 = trimmed
            .parse()
            .map_err(|_| IcyError::InvalidInterval(trimmed.to_string()))?;
        if bytes > i64::from(u32::MAX) {
            return Err(IcyError::InvalidInterval(trimmed.to_string()));
        }
        Ok(Self::new(bytes))
    }
}

/// Outcome of accounting for a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// More audio follows before the next metadata frame.
    NotReached,
    /// The read ended exactly on the boundary; a metadata frame comes next.
    Reached,
}

impl Boundary {
    #[inline]
    #[must_use]
    pub fn is_reached(self) -> bool {
        matches!(self, Self::Reached)
    }
}

/// Countdown of audio bytes left before the next metadata frame.
///
/// Invariant: outside of a call, `0 < remaining <= interval` whenever the
/// cursor is active. `remaining` is reset to `interval` the moment a boundary
/// is reported, so a frame that later fails to parse cannot desynchronise
/// the accounting.
#[derive(Debug, Clone)]
pub struct IcyCursor {
    interval: u32,
    remaining: u32,
}

impl IcyCursor {
    #[must_use]
    pub fn new(interval: MetaInterval) -> Self {
        let interval = interval.get();
        Self {
            interval,
            remaining: interval,
        }
    }

    #[inline]
    #[must_use]
    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Audio bytes left before the next metadata frame.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[inline]
    #[must_use]
    pub fn is_passthrough(&self) -> bool {
        self.interval == 0
    }

    /// Caps a caller's request so a single read never crosses the boundary.
    #[must_use]
    pub fn audio_limit(&self, len: usize) -> usize {
        if self.is_passthrough() {
            return len;
        }
        debug_assert!(self.remaining > 0, "cursor entered a read with nothing remaining");
        len.min(self.remaining as usize)
    }

    /// Accounts for a buffered read that returned `n` bytes.
    ///
    /// Only a read that consumes exactly what remained reaches the boundary.
    /// A shorter read just counts down, and the boundary is met later by a
    /// read that finishes precisely on it.
    pub fn advance(&mut self, n: usize) -> Boundary {
        if self.is_passthrough() {
            return Boundary::NotReached;
        }

        match n.cmp(&(self.remaining as usize)) {
            Ordering::Equal => {
                self.remaining = self.interval;
                Boundary::Reached
            }
            Ordering::Less => {
                // n < remaining <= u32::MAX
                self.remaining -= n as u32;
                Boundary::NotReached
            }
            Ordering::Greater => {
                // Only possible if the source wrote past the slice it was given.
                log::error!(
                    "[ICY] Source returned {} bytes with only {} left before metadata, resynchronising",
                    n,
                    self.remaining
                );
                self.remaining = self.interval;
                Boundary::NotReached
            }
        }
    }

    /// Accounts for a single audio byte.
    #[inline]
    pub fn advance_byte(&mut self) -> Boundary {
        self.advance(1)
    }
}
