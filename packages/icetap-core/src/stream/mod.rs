//! ICY metadata demuxing.
//!
//! One state machine ([`IcyDemuxer`]) with two thin adapters: [`IcyReader`]
//! for blocking `std::io::Read` sources and [`IcyAsyncReader`] for tokio
//! `AsyncRead` sources. Both remove metadata frames from the byte stream and
//! hand the decoded pairs to a [`MetadataSink`](crate::metadata::MetadataSink).

pub mod async_reader;
pub mod cursor;
pub mod demuxer;
pub mod frame;
pub mod reader;

#[cfg(test)]
pub(crate) mod test_support;

pub use async_reader::{demux_stream, IcyAsyncReader};
pub use cursor::{Boundary, IcyCursor, MetaInterval};
pub use demuxer::{FramePhase, IcyDemuxer};
pub use frame::{
    decode_payload, effective_len, frame_len, looks_like_utf8, parse_pairs, parse_segment,
    FrameScratch, TextEncoding,
};
pub use reader::IcyReader;
