//! transfer::progress
//!
//! Byte counting for streamed transfers.
//!
//! [`ProgressReader`] wraps the source side of a copy and invokes a
//! callback after every read, including the final zero-byte read at end of
//! stream. A [`ProgressSink`] turns those counts into samples that
//! [`relay`] drains into `progress` responses while the transfer future
//! runs.
//!
//! A retried transfer restarts its byte count at zero. The sink only
//! reports bytes beyond the highest count already reported, so git-lfs
//! sees every byte of an object once.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::errors::ProcessError;
use super::protocol::{write_message, Response};

/// One progress sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub bytes_so_far: u64,
    pub bytes_since_last: u64,
}

/// Reader adapter reporting `(bytes_so_far, bytes_since_last)` per read.
pub struct ProgressReader<R, F> {
    inner: R,
    on_read: F,
    total: u64,
}

impl<R, F> ProgressReader<R, F>
where
    F: FnMut(u64, u64),
{
    pub fn new(inner: R, on_read: F) -> Self {
        Self {
            inner,
            on_read,
            total: 0,
        }
    }

    /// Bytes read so far.
    pub fn total(&self) -> u64 {
        self.total
    }
}

impl<R, F> AsyncRead for ProgressReader<R, F>
where
    R: AsyncRead + Unpin,
    F: FnMut(u64, u64) + Unpin,
{
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &poll {
            let read = (buf.filled().len() - before) as u64;
            this.total += read;
            (this.on_read)(this.total, read);
        }
        poll
    }
}

/// Create a sink and the receiver to hand to [`relay`].
pub fn channel() -> (ProgressSink, UnboundedReceiver<Progress>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sink = ProgressSink {
        tx,
        reported: Arc::new(AtomicU64::new(0)),
    };
    (sink, rx)
}

/// Sending side of a progress channel for one object.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: UnboundedSender<Progress>,
    /// Highest byte count reported so far
    reported: Arc<AtomicU64>,
}

impl ProgressSink {
    /// Record that the current attempt has read `bytes_so_far` bytes.
    pub fn record(&self, bytes_so_far: u64) {
        let previous = self.reported.fetch_max(bytes_so_far, Ordering::Relaxed);
        if bytes_so_far >= previous {
            let _ = self.tx.send(Progress {
                bytes_so_far,
                bytes_since_last: bytes_so_far - previous,
            });
        }
    }

    /// Wrap `inner` so every read is recorded.
    pub fn reader<R>(&self, inner: R) -> ProgressReader<R, impl FnMut(u64, u64) + Send + Unpin> {
        let sink = self.clone();
        ProgressReader::new(inner, move |so_far, _| sink.record(so_far))
    }
}

/// Drive `task` to completion while forwarding progress samples for `oid`
/// to `out`.
///
/// Samples still queued when the task finishes are flushed before
/// returning, so every sample is written exactly once and in order.
pub async fn relay<T, W>(
    oid: &str,
    task: impl Future<Output = T>,
    mut samples: UnboundedReceiver<Progress>,
    out: &mut W,
) -> Result<T, ProcessError>
where
    W: AsyncWrite + Unpin,
{
    tokio::pin!(task);
    let result = loop {
        tokio::select! {
            biased;
            Some(sample) = samples.recv() => {
                write_message(out, &Response::progress(oid, sample.bytes_so_far, sample.bytes_since_last)).await?;
            }
            result = &mut task => break result,
        }
    };

    while let Ok(sample) = samples.try_recv() {
        write_message(out, &Response::progress(oid, sample.bytes_so_far, sample.bytes_since_last)).await?;
    }
    Ok(result)
}
