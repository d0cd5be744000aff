mod error;

pub use error::ConnectionError;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf};
use tokio::sync::mpsc;
use tokio_util::codec::{BytesCodec, FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug};

use crate::protocol::LineCodec;

/// The read side of a single client connection.
///
/// The write side lives in a dedicated writer task fed through an [`Outbox`].
/// Reads and writes therefore never wait on each other, and any number of
/// broadcasters can enqueue to the same client without holding a lock.
pub struct Connection<S> {
    lines: FramedRead<ReadHalf<S>, LineCodec>,
    /// Cancelled by the writer task when a write to the client fails.
    write_failed: CancellationToken,
}

/// Handle for enqueueing writes to one connection.
///
/// Sending never blocks. Messages reach the client in the order they were
/// enqueued. When every handle is dropped the writer flushes what is left and
/// shuts down the write side of the stream.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<Bytes>,
}

impl Outbox {
    /// Enqueues `bytes` for the writer task.
    ///
    /// Returns `false` if the writer has already stopped.
    pub fn send(&self, bytes: Bytes) -> bool {
        self.tx.send(bytes).is_ok()
    }

    /// Returns `true` once the writer task has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Splits `stream` into a line reader and a spawned writer task.
    ///
    /// `write_failed` is cancelled if a write to the client fails, which is how
    /// the owner of the read side learns that the connection is gone.
    pub fn open(stream: S, write_failed: CancellationToken) -> (Self, Outbox) {
        let (reader, writer) = tokio::io::split(stream);
        let (tx, rx) = mpsc::unbounded_channel();

        let sink = FramedWrite::new(writer, BytesCodec::new());
        tokio::spawn(write_loop(sink, rx, write_failed.clone()).in_current_span());

        let connection = Self {
            lines: FramedRead::new(reader, LineCodec::new()),
            write_failed,
        };
        (connection, Outbox { tx })
    }

    /// Reads the next line from the client.
    ///
    /// Returns `Ok(None)` on EOF, and [`ConnectionError::WriteFailed`] as soon
    /// as the write side has broken, even while waiting for input. Cancel safe.
    pub async fn read_line(&mut self) -> Result<Option<Bytes>, ConnectionError> {
        tokio::select! {
            biased;
            _ = self.write_failed.cancelled() => Err(ConnectionError::WriteFailed),
            next = self.lines.next() => match next {
                Some(Ok(line)) => Ok(Some(line)),
                Some(Err(e)) => Err(e.into()),
                None => Ok(None),
            },
        }
    }
}

async fn write_loop<W>(
    mut sink: FramedWrite<W, BytesCodec>,
    mut rx: mpsc::UnboundedReceiver<Bytes>,
    write_failed: CancellationToken,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(bytes) = rx.recv().await {
        if let Err(e) = sink.send(bytes).await {
            debug!("Write failed: {}", e);
            write_failed.cancel();
            return;
        }
    }

    // All outbox handles dropped: the session is over.
    if let Err(e) = SinkExt::<Bytes>::close(&mut sink).await {
        debug!("Shutdown failed: {}", e);
    }
}
