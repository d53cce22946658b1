//! Metadata callback abstraction.
//!
//! The demuxer depends on the [`MetadataSink`] trait rather than on any
//! global listener, so callers inject where metadata goes.

/// Receives every `key=value` pair found in a metadata frame.
///
/// Called synchronously from inside the read that crossed the frame, once per
/// pair, in the order the pairs appear. Duplicate keys are delivered as-is.
/// Any `FnMut(&str, &str) + Send` closure is a sink.
///
/// # Example
///
/// ```
/// use icetap_core::{IcyReader, MetaInterval};
///
/// let source: &[u8] = &[];
/// let reader = IcyReader::new(source, MetaInterval::new(16000))
///     .with_sink(|key: &str, value: &str| println!("{key} = {value}"));
/// # drop(reader);
/// ```
pub trait MetadataSink: Send {
    fn on_metadata(&mut self, key: &str, value: &str);
}

impl<F> MetadataSink for F
where
    F: FnMut(&str, &str) + Send,
{
    fn on_metadata(&mut self, key: &str, value: &str) {
        self(key, value);
    }
}

/// Discards all metadata.
pub struct NoopSink;

impl MetadataSink for NoopSink {
    fn on_metadata(&mut self, _key: &str, _value: &str) {
        // No-op
    }
}

/// Logs every pair at debug level. Useful when debugging a station.
pub struct LoggingSink;

impl MetadataSink for LoggingSink {
    fn on_metadata(&mut self, key: &str, value: &str) {
        tracing::debug!(key, value, "icy_metadata");
    }
}
