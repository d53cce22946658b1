//! Sources and sinks shared by the adapter tests.

use std::io::{self, ErrorKind, Read};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use tokio::io::{AsyncRead, ReadBuf};

use crate::metadata::MetadataSink;
use crate::protocol_constants::FRAME_UNIT;

/// Encodes a payload as one wire frame: length byte plus NUL-padded payload.
/// An empty payload becomes a single zero byte.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let blocks = payload.len().div_ceil(FRAME_UNIT);
    assert!(blocks <= u8::MAX as usize, "payload too long for one frame");
    let mut frame = Vec::with_capacity(blocks * FRAME_UNIT + 1);
    frame.push(blocks as u8);
    frame.extend_from_slice(payload);
    frame.resize(blocks * FRAME_UNIT + 1, 0);
    frame
}

/// Builds a wire stream: after every full `interval` of audio the next frame
/// from `frames` is inserted, or an empty frame once they run out.
pub fn interleave(audio: &[u8], interval: usize, frames: &[&str]) -> Vec<u8> {
    let mut frames = frames.iter();
    let mut wire = Vec::new();
    for chunk in audio.chunks(interval) {
        wire.extend_from_slice(chunk);
        if chunk.len() == interval {
            let payload = frames.next().map_or(&[][..], |f| f.as_bytes());
            wire.extend(encode_frame(payload));
        }
    }
    wire
}

pub fn owned_pairs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Sink that records every pair it receives.
pub struct Recorder {
    seen: Seen,
}

#[derive(Clone, Default)]
pub struct Seen(Arc<Mutex<Vec<(String, String)>>>);

impl Seen {
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.0.lock().clone()
    }

    pub fn values(&self) -> Vec<String> {
        self.0.lock().iter().map(|(_, v)| v.clone()).collect()
    }
}

impl Recorder {
    pub fn new() -> (Self, Seen) {
        let seen = Seen::default();
        (Self { seen: seen.clone() }, seen)
    }
}

impl MetadataSink for Recorder {
    fn on_metadata(&mut self, key: &str, value: &str) {
        self.seen.0.lock().push((key.to_string(), value.to_string()));
    }
}

/// Returns at most `chunk` bytes per read, like a network socket would.
pub struct ChunkedReader {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
}

impl ChunkedReader {
    pub fn new(data: Vec<u8>, chunk: usize) -> Self {
        Self { data, pos: 0, chunk }
    }
}

impl Read for ChunkedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.chunk).min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl AsyncRead for ChunkedReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let n = buf.remaining().min(this.chunk).min(this.data.len() - this.pos);
        buf.put_slice(&this.data[this.pos..this.pos + n]);
        this.pos += n;
        Poll::Ready(Ok(()))
    }
}

/// Yields `data` and then fails every read with `ConnectionReset`.
pub struct FailingReader {
    data: Vec<u8>,
    pos: usize,
}

impl FailingReader {
    pub fn after(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    fn next_chunk(&mut self, len: usize) -> io::Result<&[u8]> {
        if self.pos == self.data.len() {
            return Err(io::Error::new(ErrorKind::ConnectionReset, "connection reset"));
        }
        let start = self.pos;
        self.pos += len.min(self.data.len() - start);
        Ok(&self.data[start..self.pos])
    }
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let chunk = self.next_chunk(buf.len())?;
        let n = chunk.len();
        buf[..n].copy_from_slice(chunk);
        Ok(n)
    }
}

impl AsyncRead for FailingReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let len = buf.remaining();
        let chunk = self.get_mut().next_chunk(len)?;
        buf.put_slice(chunk);
        Poll::Ready(Ok(()))
    }
}

/// Async source that answers `Pending` before every successful read.
pub struct StutteringReader {
    inner: ChunkedReader,
    ready: bool,
}

impl StutteringReader {
    pub fn new(data: Vec<u8>, chunk: usize) -> Self {
        Self {
            inner: ChunkedReader::new(data, chunk),
            ready: false,
        }
    }
}

impl AsyncRead for StutteringReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if !this.ready {
            this.ready = true;
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }
        this.ready = false;
        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}
