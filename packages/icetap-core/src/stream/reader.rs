//! Blocking stream-wrapper adapter.

use std::io::{self, ErrorKind, Read};

use super::cursor::{IcyCursor, MetaInterval};
use super::demuxer::{FramePhase, IcyDemuxer};
use super::frame::TextEncoding;
use crate::headers::DemuxOptions;
use crate::metadata::MetadataSink;

/// A [`Read`] that removes ICY metadata frames from the wrapped source.
///
/// Drop-in replacement for the raw transport stream: callers see only audio
/// bytes, and metadata is delivered to the sink from inside the read that
/// reaches each frame.
///
/// Errors from audio reads propagate unchanged. An error hit while pulling a
/// metadata frame abandons that frame; the audio bytes of the current read
/// are still returned and the error is reported by the next call.
pub struct IcyReader<R> {
    inner: R,
    demuxer: IcyDemuxer,
    deferred_error: Option<io::Error>,
}

impl<R: Read> IcyReader<R> {
    #[must_use]
    pub fn new(inner: R, interval: MetaInterval) -> Self {
        if interval.is_passthrough() {
            log::debug!("[ICY] No metadata interval, passing stream through");
        } else {
            log::debug!("[ICY] Metadata every {}", interval);
        }
        Self {
            inner,
            demuxer: IcyDemuxer::new(interval),
            deferred_error: None,
        }
    }

    /// Builds a reader from caller options: the enable switch gates
    /// `interval` and the encoding is preset.
    #[must_use]
    pub fn with_options(inner: R, interval: MetaInterval, options: &DemuxOptions) -> Self {
        Self::new(inner, options.gate(interval)).with_encoding(options.encoding)
    }

    /// Sets the callback that receives metadata pairs.
    #[must_use]
    pub fn with_sink(mut self, sink: impl MetadataSink + 'static) -> Self {
        self.demuxer.set_sink(sink);
        self
    }

    /// Sets the encoding used for frames that pass the UTF-8 scan.
    #[must_use]
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.demuxer.set_encoding(encoding);
        self
    }

    #[must_use]
    pub fn encoding(&self) -> TextEncoding {
        self.demuxer.encoding()
    }

    pub fn set_encoding(&mut self, encoding: TextEncoding) {
        self.demuxer.set_encoding(encoding);
    }

    #[must_use]
    pub fn cursor(&self) -> &IcyCursor {
        self.demuxer.cursor()
    }

    /// Current size of the metadata scratch buffer.
    #[must_use]
    pub fn scratch_capacity(&self) -> usize {
        self.demuxer.scratch_capacity()
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Reads a single audio byte, `None` at end of stream.
    pub fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(err) = self.deferred_error.take() {
            return Err(err);
        }

        let mut byte = [0u8; 1];
        if read_retrying(&mut self.inner, &mut byte)? == 0 {
            return Ok(None);
        }

        if self.demuxer.on_audio_byte().is_reached() {
            self.extract_frame();
        }
        Ok(Some(byte[0]))
    }

    fn extract_frame(&mut self) {
        if let Err(err) = self.pull_frame() {
            log::warn!("[ICY] Transport error while reading metadata frame: {}", err);
            self.demuxer.abandon_frame();
            self.deferred_error = Some(err);
        }
    }

    /// Reads the length byte and payload, looping until the frame is complete
    /// or the source ends.
    fn pull_frame(&mut self) -> io::Result<()> {
        loop {
            match self.demuxer.phase() {
                FramePhase::Audio => return Ok(()),
                FramePhase::Length => {
                    let mut byte = [0u8; 1];
                    let n = read_retrying(&mut self.inner, &mut byte)?;
                    self.demuxer.on_length((n == 1).then_some(byte[0]));
                }
                FramePhase::Payload => {
                    let n = read_retrying(&mut self.inner, self.demuxer.payload_buf())?;
                    self.demuxer.on_payload(n);
                }
            }
        }
    }
}

impl<R: Read> Read for IcyReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(err) = self.deferred_error.take() {
            return Err(err);
        }

        let limit = self.demuxer.audio_limit(buf.len());
        let n = self.inner.read(&mut buf[..limit])?;

        if self.demuxer.on_audio(n).is_reached() {
            self.extract_frame();
        }
        Ok(n)
    }
}

fn read_retrying<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::test_support::{
        encode_frame, interleave, owned_pairs, ChunkedReader, FailingReader, Recorder,
    };
    use std::io::Cursor;

    #[test]
    fn passthrough_is_identity() {
        let data: Vec<u8> = (0..=255u8).cycle().take(5000).collect();
        for interval in [0, -1] {
            let mut reader = IcyReader::new(Cursor::new(data.clone()), MetaInterval::new(interval));
            let mut out = Vec::new();
            reader.read_to_end(&mut out).unwrap();
            assert_eq!(out, data);
        }
    }

    #[test]
    fn passthrough_never_consumes_zero_bytes_as_frames() {
        // Would be a frame of 16 bytes if the reader wrongly extracted at remaining == 0.
        let data = vec![1u8, b'x', b'x'];
        let mut reader = IcyReader::new(Cursor::new(data.clone()), MetaInterval::PASSTHROUGH);
        let mut out = Vec::new();
        while let Some(b) = reader.read_byte().unwrap() {
            out.push(b);
        }
        assert_eq!(out, data);
    }

    #[test]
    fn frames_are_removed_regardless_of_chunking() {
        let audio: Vec<u8> = (0..100u8).collect();
        let frames = ["StreamTitle='One';", "", "StreamTitle='Two';StreamUrl='';"];
        let wire = interleave(&audio, 16, &frames);

        for chunk in [1, 3, 7, 16, 17, 64, 4096] {
            for request in [1, 5, 16, 33, 4096] {
                let (recorder, seen) = Recorder::new();
                let mut reader = IcyReader::new(
                    ChunkedReader::new(wire.clone(), chunk),
                    MetaInterval::new(16),
                )
                .with_sink(recorder);

                let mut out = Vec::new();
                let mut buf = vec![0u8; request];
                loop {
                    let n = reader.read(&mut buf).unwrap();
                    if n == 0 {
                        break;
                    }
                    out.extend_from_slice(&buf[..n]);
                }

                assert_eq!(out, audio, "chunk={chunk} request={request}");
                assert_eq!(
                    seen.pairs(),
                    owned_pairs(&[
                        ("StreamTitle", "One"),
                        ("StreamTitle", "Two"),
                        ("StreamUrl", ""),
                    ])
                );
            }
        }
    }

    #[test]
    fn short_read_does_not_trigger_extraction() {
        let audio: Vec<u8> = (0..20u8).collect();
        let wire = interleave(&audio, 10, &["StreamTitle='x';"]);
        let (recorder, seen) = Recorder::new();
        let mut reader = IcyReader::new(Cursor::new(wire), MetaInterval::new(10)).with_sink(recorder);

        let mut buf = [0u8; 5];
        assert_eq!(reader.read(&mut buf).unwrap(), 5);
        assert_eq!(reader.cursor().remaining(), 5);
        assert!(seen.pairs().is_empty());

        let mut buf = [0u8; 64];
        assert_eq!(reader.read(&mut buf).unwrap(), 5);
        assert_eq!(&buf[..5], &[5, 6, 7, 8, 9]);
        assert_eq!(reader.cursor().remaining(), 10);
        assert_eq!(seen.pairs().len(), 1);
    }

    #[test]
    fn single_byte_reads_strip_frames() {
        let audio: Vec<u8> = (0..40u8).collect();
        let wire = interleave(&audio, 8, &["StreamTitle='a';", "StreamTitle='b';"]);
        let (recorder, seen) = Recorder::new();
        let mut reader = IcyReader::new(Cursor::new(wire), MetaInterval::new(8)).with_sink(recorder);

        let mut out = Vec::new();
        while let Some(b) = reader.read_byte().unwrap() {
            out.push(b);
        }
        assert_eq!(out, audio);
        assert_eq!(seen.values(), vec!["a", "b"]);
    }

    #[test]
    fn title_and_url_frame_dispatches_two_pairs() {
        let payload = "StreamTitle='Artist - Song';StreamUrl='http://x';";
        let wire = interleave(&[0u8; 4], 4, &[payload]);
        let (recorder, seen) = Recorder::new();
        let mut reader = IcyReader::new(Cursor::new(wire), MetaInterval::new(4)).with_sink(recorder);

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, vec![0u8; 4]);
        assert_eq!(
            seen.pairs(),
            owned_pairs(&[("StreamTitle", "Artist - Song"), ("StreamUrl", "http://x")])
        );
    }

    #[test]
    fn latin1_frame_does_not_change_configured_encoding() {
        let mut wire = vec![0u8; 4];
        wire.extend(encode_frame(b"StreamTitle='Caf\xE9';"));
        wire.extend_from_slice(&[0u8; 4]);
        wire.extend(encode_frame("StreamTitle='Motörhead';".as_bytes()));

        let (recorder, seen) = Recorder::new();
        let mut reader = IcyReader::new(Cursor::new(wire), MetaInterval::new(4)).with_sink(recorder);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();

        assert_eq!(out.len(), 8);
        assert_eq!(seen.values(), vec!["Café", "Motörhead"]);
        assert_eq!(reader.encoding(), TextEncoding::Utf8);
    }

    #[test]
    fn truncated_frame_at_end_of_stream_is_not_an_error() {
        let mut wire = vec![7u8; 4];
        wire.push(10); // announces 160 bytes
        wire.extend_from_slice(b"StreamTitle='cut");

        let (recorder, seen) = Recorder::new();
        let mut reader = IcyReader::new(Cursor::new(wire), MetaInterval::new(4)).with_sink(recorder);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();

        assert_eq!(out, vec![7u8; 4]);
        assert_eq!(reader.cursor().remaining(), 4);
        assert_eq!(seen.values(), vec!["'cut"]);
    }

    #[test]
    fn undecodable_frame_between_intervals_keeps_audio_aligned() {
        let audio: Vec<u8> = (100..140u8).collect();
        let mut wire = audio[..16].to_vec();
        // Passes the structural scan but is not valid UTF-8.
        wire.extend(encode_frame(b"StreamTitle='\xF8\x80\x80\x80\x80';"));
        wire.extend_from_slice(&audio[16..32]);
        wire.extend(encode_frame(b"StreamTitle='next';"));
        wire.extend_from_slice(&audio[32..]);

        for chunk in [1, 5, 16, 64] {
            let (recorder, seen) = Recorder::new();
            let mut reader =
                IcyReader::new(ChunkedReader::new(wire.clone(), chunk), MetaInterval::new(16))
                    .with_sink(recorder);
            let mut out = Vec::new();
            reader.read_to_end(&mut out).unwrap();

            assert_eq!(out, audio, "chunk={chunk}");
            assert_eq!(seen.values(), vec!["next"]);
            assert_eq!(reader.cursor().remaining(), 8);
        }
    }

    #[test]
    fn zero_length_frames_and_eof_length_byte() {
        // Boundary followed immediately by end of stream.
        let mut reader = IcyReader::new(Cursor::new(vec![1u8, 2]), MetaInterval::new(2));
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, vec![1, 2]);

        // Zero indicator: no metadata this cycle, audio continues.
        let wire = vec![1u8, 2, 0, 3, 4, 0, 5];
        let mut reader = IcyReader::new(Cursor::new(wire), MetaInterval::new(2));
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn scratch_buffer_does_not_shrink() {
        let audio = vec![0u8; 30];
        let big = format!("StreamTitle='{}';", "x".repeat(400));
        let wire = interleave(&audio, 10, &[big.as_str(), "StreamTitle='s';"]);
        let mut reader = IcyReader::new(Cursor::new(wire), MetaInterval::new(10));

        let mut buf = [0u8; 10];
        reader.read(&mut buf).unwrap();
        let grown = reader.scratch_capacity();
        assert!(grown >= 416);

        reader.read(&mut buf).unwrap();
        reader.read(&mut buf).unwrap();
        assert_eq!(reader.scratch_capacity(), grown);
    }

    #[test]
    fn audio_errors_propagate_verbatim() {
        let mut reader = IcyReader::new(FailingReader::after(Vec::new()), MetaInterval::new(4));
        let err = reader.read(&mut [0u8; 4]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionReset);
    }

    #[test]
    fn frame_error_keeps_audio_and_surfaces_next_read() {
        let (recorder, seen) = Recorder::new();
        let mut reader = IcyReader::new(FailingReader::after(vec![1, 2, 3, 4]), MetaInterval::new(4))
            .with_sink(recorder);

        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf[..4], &[1, 2, 3, 4]);
        assert_eq!(reader.cursor().remaining(), 4);

        let err = reader.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionReset);
        assert!(seen.pairs().is_empty());
    }

    #[test]
    fn options_gate_interval_and_preset_encoding() {
        let audio: Vec<u8> = (0..32u8).collect();
        let wire = interleave(&audio, 16, &["StreamTitle='x';"]);

        let disabled = DemuxOptions {
            metadata_enabled: false,
            encoding: TextEncoding::Latin1,
        };
        let mut reader =
            IcyReader::with_options(Cursor::new(wire.clone()), MetaInterval::new(16), &disabled);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, wire);
        assert!(reader.cursor().is_passthrough());
        assert_eq!(reader.encoding(), TextEncoding::Latin1);

        let (recorder, seen) = Recorder::new();
        let mut reader = IcyReader::with_options(
            Cursor::new(wire),
            MetaInterval::new(16),
            &DemuxOptions::default(),
        )
        .with_sink(recorder);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, audio);
        assert_eq!(seen.values(), vec!["x"]);
    }

    #[test]
    fn into_inner_returns_source() {
        let reader = IcyReader::new(Cursor::new(vec![9u8]), MetaInterval::new(4));
        assert_eq!(reader.into_inner().into_inner(), vec![9u8]);
    }
}
