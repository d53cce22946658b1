//! Async data-source adapter.
//!
//! The demuxer itself stays synchronous; this adapter only translates its
//! demands into `poll_read` calls on the inner source. Frame extraction is
//! attempted in the same poll that reaches a boundary. If the source is not
//! ready mid-frame, the audio already read is returned and the frame is
//! finished at the start of the next poll, before any further audio.

use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use futures::Stream;
use tokio::io::{AsyncRead, ReadBuf};
use tokio_util::io::{ReaderStream, StreamReader};

use super::cursor::{IcyCursor, MetaInterval};
use super::demuxer::{FramePhase, IcyDemuxer};
use super::frame::TextEncoding;
use crate::headers::DemuxOptions;
use crate::metadata::MetadataSink;

/// An [`AsyncRead`] that removes ICY metadata frames from the wrapped source.
pub struct IcyAsyncReader<R> {
    inner: R,
    demuxer: IcyDemuxer,
    deferred_error: Option<io::Error>,
}

impl<R: AsyncRead + Unpin> IcyAsyncReader<R> {
    #[must_use]
    pub fn new(inner: R, interval: MetaInterval) -> Self {
        log::debug!("[ICY] Async demuxer, interval: {}", interval);
        Self {
            inner,
            demuxer: IcyDemuxer::new(interval),
            deferred_error: None,
        }
    }

    /// Async counterpart of [`IcyReader::with_options`](super::IcyReader::with_options).
    #[must_use]
    pub fn with_options(inner: R, interval: MetaInterval, options: &DemuxOptions) -> Self {
        Self::new(inner, options.gate(interval)).with_encoding(options.encoding)
    }

    #[must_use]
    pub fn with_sink(mut self, sink: impl MetadataSink + 'static) -> Self {
        self.demuxer.set_sink(sink);
        self
    }

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

    #[must_use]
    pub fn scratch_capacity(&self) -> usize {
        self.demuxer.scratch_capacity()
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn poll_frame(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        loop {
            match self.demuxer.phase() {
                FramePhase::Audio => return Poll::Ready(Ok(())),
                FramePhase::Length => {
                    let mut byte = [0u8; 1];
                    let indicator = {
                        let mut read_buf = ReadBuf::new(&mut byte);
                        ready!(Pin::new(&mut self.inner).poll_read(cx, &mut read_buf))?;
                        read_buf.filled().first().copied()
                    };
                    self.demuxer.on_length(indicator);
                }
                FramePhase::Payload => {
                    let n = {
                        let mut read_buf = ReadBuf::new(self.demuxer.payload_buf());
                        ready!(Pin::new(&mut self.inner).poll_read(cx, &mut read_buf))?;
                        read_buf.filled().len()
                    };
                    self.demuxer.on_payload(n);
                }
            }
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for IcyAsyncReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        if let Some(err) = this.deferred_error.take() {
            return Poll::Ready(Err(err));
        }

        // A frame left over from the previous poll comes before more audio.
        if this.demuxer.frame_pending() {
            if let Err(err) = ready!(this.poll_frame(cx)) {
                this.demuxer.abandon_frame();
                return Poll::Ready(Err(err));
            }
        }

        let limit = this.demuxer.audio_limit(buf.remaining());
        let n = {
            let mut audio = ReadBuf::new(buf.initialize_unfilled_to(limit));
            ready!(Pin::new(&mut this.inner).poll_read(cx, &mut audio))?;
            audio.filled().len()
        };
        buf.advance(n);

        if this.demuxer.on_audio(n).is_reached() {
            match this.poll_frame(cx) {
                Poll::Ready(Ok(())) => {}
                Poll::Ready(Err(err)) => {
                    log::warn!("[ICY] Transport error while reading metadata frame: {}", err);
                    this.demuxer.abandon_frame();
                    this.deferred_error = Some(err);
                }
                Poll::Pending => {
                    log::trace!("[ICY] Metadata frame incomplete, resuming on next read");
                }
            }
        }

        Poll::Ready(Ok(()))
    }
}

/// Demuxes a chunked byte stream, yielding only audio.
///
/// Adapts the `Stream<Item = io::Result<Bytes>>` shape most HTTP clients
/// produce through [`IcyAsyncReader`] and back into a stream of audio chunks.
pub fn demux_stream<S>(
    stream: S,
    interval: MetaInterval,
    sink: impl MetadataSink + 'static,
) -> impl Stream<Item = io::Result<Bytes>>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    let reader = IcyAsyncReader::new(StreamReader::new(stream), interval).with_sink(sink);
    ReaderStream::new(reader)
}
