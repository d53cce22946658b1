//! Fixed protocol constants that should NOT be changed.
//!
//! These values are defined by the Shoutcast/Icecast in-band metadata
//! convention and changing them would break compatibility with servers.

// ─────────────────────────────────────────────────────────────────────────────
// HTTP Headers
// ─────────────────────────────────────────────────────────────────────────────

/// Response header advertising the metadata interval (bytes between frames).
pub const ICY_METAINT_HEADER: &str = "icy-metaint";

/// Request header a client sends to ask the server for in-band metadata.
///
/// Servers only interleave metadata frames when this header is present.
pub const ICY_METADATA_REQUEST: (&str, &str) = ("Icy-MetaData", "1");

/// Station name response header.
pub const ICY_NAME_HEADER: &str = "icy-name";

/// Station genre response header.
pub const ICY_GENRE_HEADER: &str = "icy-genre";

/// Station homepage response header.
pub const ICY_URL_HEADER: &str = "icy-url";

/// Station description response header.
pub const ICY_DESCRIPTION_HEADER: &str = "icy-description";

/// Nominal bitrate response header (kbit/s).
pub const ICY_BITRATE_HEADER: &str = "icy-br";

/// Content type of the audio payload.
pub const CONTENT_TYPE_HEADER: &str = "content-type";

// ─────────────────────────────────────────────────────────────────────────────
// Metadata Frames
// ─────────────────────────────────────────────────────────────────────────────

/// Unit of the length-indicator byte: a frame of indicator `n` carries `n * 16` bytes.
pub const FRAME_UNIT: usize = 16;

/// Largest payload a single length byte can announce (255 * 16 = 4080 bytes).
pub const MAX_FRAME_LEN: usize = u8::MAX as usize * FRAME_UNIT;

/// Initial size of the reusable metadata scratch buffer.
///
/// Most frames only carry a short `StreamTitle`, so 128 bytes covers the
/// common case without an early reallocation.
pub const INITIAL_SCRATCH_LEN: usize = 128;

/// Key carrying the "Artist - Title" string of the current track.
pub const STREAM_TITLE_KEY: &str = "StreamTitle";

/// Key carrying an optional URL associated with the current track.
pub const STREAM_URL_KEY: &str = "StreamUrl";
