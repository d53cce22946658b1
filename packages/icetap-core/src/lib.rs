//! Icetap Core - Shoutcast/Icecast in-band metadata demuxer.
//!
//! Internet radio servers interleave text metadata into the audio byte stream
//! at a fixed interval announced by the `icy-metaint` response header. This
//! crate removes those frames so the audio decoder sees a clean stream, and
//! reports the `key=value` pairs they carry.
//!
//! # Architecture
//!
//! - [`stream`]: the byte-accounting state machine, frame decoding, and the
//!   blocking ([`IcyReader`]) and async ([`IcyAsyncReader`]) adapters
//! - [`metadata`]: the [`MetadataSink`] callback trait and the
//!   [`NowPlaying`] track tracker
//! - [`headers`]: turning response headers into a [`MetaInterval`]
//! - [`error`]: centralized error types
//!
//! # Example
//!
//! ```
//! use std::io::Read;
//! use icetap_core::{IcyHeaders, IcyReader, DemuxOptions, NowPlaying};
//!
//! let headers = IcyHeaders::from_pairs([("icy-metaint", "4")]);
//! let mut wire = vec![1u8, 2, 3, 4, 2];
//! let mut frame = b"StreamTitle='Artist - Song';".to_vec();
//! frame.resize(32, 0);
//! wire.extend(frame);
//! wire.extend([5u8, 6]);
//!
//! let now_playing = NowPlaying::new();
//! let handle = now_playing.handle();
//! let mut reader = IcyReader::new(wire.as_slice(), headers.interval(&DemuxOptions::default()))
//!     .with_sink(now_playing);
//!
//! let mut audio = Vec::new();
//! reader.read_to_end(&mut audio).unwrap();
//! assert_eq!(audio, [1, 2, 3, 4, 5, 6]);
//! assert_eq!(handle.current().artist.as_deref(), Some("Artist"));
//! ```

#![warn(clippy::all)]

pub mod error;
pub mod headers;
pub mod metadata;
pub mod protocol_constants;
pub mod stream;

// Re-export commonly used types at the crate root
pub use error::{IcyError, IcyResult};
pub use headers::{DemuxOptions, IcyHeaders};
pub use metadata::{
    LoggingSink, MetadataSink, NoopSink, NowPlaying, NowPlayingHandle, StreamMetadata,
};
pub use stream::{
    demux_stream, IcyAsyncReader, IcyCursor, IcyDemuxer, IcyReader, MetaInterval, TextEncoding,
};
