//! ICY response headers.
//!
//! The transport is out of scope; whatever performs the HTTP request hands
//! its response headers here as `(name, value)` pairs and gets back the
//! interval to construct a demuxer with.

use serde::{Deserialize, Serialize};

use crate::protocol_constants::{
    CONTENT_TYPE_HEADER, ICY_BITRATE_HEADER, ICY_DESCRIPTION_HEADER, ICY_GENRE_HEADER,
    ICY_METAINT_HEADER, ICY_NAME_HEADER, ICY_URL_HEADER,
};
use crate::stream::{MetaInterval, TextEncoding};

/// Caller-side switches for metadata extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemuxOptions {
    /// When false, metadata is never extracted even if the server sends it.
    /// Only safe if the request did not ask for metadata in the first place.
    pub metadata_enabled: bool,

    /// Encoding used for metadata that passes the UTF-8 structure scan.
    pub encoding: TextEncoding,
}

impl DemuxOptions {
    /// Applies the enable switch to an interval from any source.
    #[must_use]
    pub fn gate(&self, interval: MetaInterval) -> MetaInterval {
        if self.metadata_enabled {
            interval
        } else {
            log::debug!("[ICY] Metadata not enabled");
            MetaInterval::PASSTHROUGH
        }
    }
}

impl Default for DemuxOptions {
    fn default() -> Self {
        Self {
            metadata_enabled: true,
            encoding: TextEncoding::Utf8,
        }
    }
}

/// Headers parsed from an ICY stream response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IcyHeaders {
    /// Bytes between metadata frames, `None` if absent or unusable.
    pub metaint: Option<u32>,
    pub name: Option<String>,
    pub genre: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    /// Nominal bitrate in kbit/s.
    pub bitrate: Option<u32>,
    pub content_type: Option<String>,
}

impl IcyHeaders {
    /// Collects the ICY headers from a response's header pairs.
    ///
    /// Names match case-insensitively. An unparsable `icy-metaint` is logged
    /// and treated as absent: the stream still plays, just without metadata.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut headers = Self::default();

        for (name, value) in pairs {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case(ICY_METAINT_HEADER) {
                headers.metaint = parse_metaint(value);
            } else if name.eq_ignore_ascii_case(ICY_NAME_HEADER) {
                headers.name = non_empty(value);
            } else if name.eq_ignore_ascii_case(ICY_GENRE_HEADER) {
                headers.genre = non_empty(value);
            } else if name.eq_ignore_ascii_case(ICY_URL_HEADER) {
                headers.url = non_empty(value);
            } else if name.eq_ignore_ascii_case(ICY_DESCRIPTION_HEADER) {
                headers.description = non_empty(value);
            } else if name.eq_ignore_ascii_case(ICY_BITRATE_HEADER) {
                // Some servers send "128,128" for multi-bitrate streams.
                headers.bitrate = value.split(',').next().and_then(|v| v.trim().parse().ok());
            } else if name.eq_ignore_ascii_case(CONTENT_TYPE_HEADER) {
                headers.content_type = non_empty(value);
            }
        }

        headers
    }

    /// Parses a raw header block of `Name: value` lines.
    ///
    /// Lines without a colon (such as an `ICY 200 OK` status line) are skipped.
    pub fn parse_block(block: &str) -> Self {
        Self::from_pairs(block.lines().filter_map(|line| line.split_once(':')))
    }

    /// The interval to construct a demuxer with.
    #[must_use]
    pub fn interval(&self, options: &DemuxOptions) -> MetaInterval {
        let interval = match self.metaint {
            Some(bytes) => {
                log::debug!("[ICY] The dynamic metainfo is sent every {} bytes", bytes);
                MetaInterval::new(i64::from(bytes))
            }
            None => {
                log::debug!("[ICY] This stream does not provide dynamic metainfo");
                MetaInterval::PASSTHROUGH
            }
        };
        options.gate(interval)
    }
}

fn parse_metaint(value: &str) -> Option<u32> {
    match value.parse::<MetaInterval>() {
        Ok(interval) if !interval.is_passthrough() => Some(interval.get()),
        Ok(_) => {
            log::warn!("[ICY] Ignoring non-positive {}: '{}'", ICY_METAINT_HEADER, value);
            None
        }
        Err(e) => {
            log::warn!("[ICY] The {} '{}' cannot be parsed: {}", ICY_METAINT_HEADER, value, e);
            None
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
