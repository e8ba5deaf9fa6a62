// ABOUTME: Buffered frame I/O for SMPP sessions over any async byte stream
// ABOUTME: Splits into reader and writer halves so one task reads while submitters write

use crate::codec::{CodecError, Frame, PduHeader, PduRegistry};
use bytes::{Buf, BytesMut};
use std::future::Future;
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter, ReadHalf, WriteHalf};
use tokio::net::TcpStream;

/// Default read buffer. Most PDUs a transceiver sees are well under this.
const READ_BUFFER_SIZE: usize = 4 * 1024;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Framing failed (bad command_length) or an outbound frame did not encode
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// A complete PDU arrived but its body did not decode. The stream is
    /// still aligned on the next PDU.
    #[error("malformed PDU {command_id:#010x} (sequence {sequence_number}): {source}")]
    Malformed {
        command_id: u32,
        sequence_number: u32,
        #[source]
        source: CodecError,
    },

    #[error("connection reset by peer with {buffered} octets of a partial PDU buffered")]
    IncompleteFrame { buffered: usize },
}

impl ConnectionError {
    /// True when the stream is still usable after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ConnectionError::Malformed { .. })
    }
}

/// Opens the byte streams a session runs over.
///
/// The session calls `connect` once per bind attempt, so an implementation
/// must be able to produce a fresh stream every time.
pub trait Connector: Send + Sync + 'static {
    type Stream: AsyncRead + AsyncWrite + Send + Unpin + 'static;

    fn connect(&self, address: &str) -> impl Future<Output = io::Result<Self::Stream>> + Send;
}

/// Plain TCP, with Nagle disabled so small PDUs go out immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, address: &str) -> io::Result<TcpStream> {
        let stream = TcpStream::connect(address).await?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

/// Send and receive `Frame` values over a stream.
///
/// Reads are buffered in a `BytesMut` and parsed once a whole PDU is
/// present; writes go through a `BufWriter` and are flushed per frame.
#[derive(Debug)]
pub struct Connection<S> {
    stream: BufWriter<S>,
    buffer: BytesMut,
    registry: Arc<PduRegistry>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(socket: S) -> Self {
        Self::with_registry(socket, Arc::new(PduRegistry::new()))
    }

    pub fn with_registry(socket: S, registry: Arc<PduRegistry>) -> Self {
        Self {
            stream: BufWriter::new(socket),
            buffer: BytesMut::with_capacity(READ_BUFFER_SIZE),
            registry,
        }
    }

    /// Read a single `Frame` from the stream.
    ///
    /// Waits until a whole PDU is buffered. Returns `None` when the peer
    /// closed the stream on a frame boundary.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, ConnectionError> {
        read_frame(&mut self.stream, &mut self.buffer, &self.registry).await
    }

    pub async fn write_frame(&mut self, frame: &Frame) -> Result<(), ConnectionError> {
        write_frame(&mut self.stream, frame).await
    }

    /// Split into independently owned halves. Bytes already buffered for
    /// reading move to the reader.
    pub fn split(self) -> (ConnectionReader<ReadHalf<S>>, ConnectionWriter<WriteHalf<S>>) {
        let (read, write) = tokio::io::split(self.stream.into_inner());
        (
            ConnectionReader {
                reader: read,
                buffer: self.buffer,
                registry: self.registry,
            },
            ConnectionWriter {
                stream: BufWriter::new(write),
            },
        )
    }
}

/// Read side of a split `Connection`
#[derive(Debug)]
pub struct ConnectionReader<R> {
    reader: R,
    buffer: BytesMut,
    registry: Arc<PduRegistry>,
}

impl<R: AsyncRead + Unpin> ConnectionReader<R> {
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, ConnectionError> {
        read_frame(&mut self.reader, &mut self.buffer, &self.registry).await
    }
}

/// Write side of a split `Connection`
#[derive(Debug)]
pub struct ConnectionWriter<W> {
    stream: BufWriter<W>,
}

impl<W: AsyncWrite + Unpin> ConnectionWriter<W> {
    pub async fn write_frame(&mut self, frame: &Frame) -> Result<(), ConnectionError> {
        write_frame(&mut self.stream, frame).await
    }

    /// Flush and close the write direction
    pub async fn shutdown(&mut self) -> Result<(), ConnectionError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    buffer: &mut BytesMut,
    registry: &PduRegistry,
) -> Result<Option<Frame>, ConnectionError> {
    loop {
        // Attempt to parse a frame from the buffered data first
        if let Some(frame) = parse_frame(buffer, registry)? {
            return Ok(Some(frame));
        }

        // `0` indicates end of stream. For a clean shutdown the buffer must
        // be empty, otherwise the peer closed the socket mid-PDU.
        if 0 == reader.read_buf(buffer).await? {
            return if buffer.is_empty() {
                Ok(None)
            } else {
                Err(ConnectionError::IncompleteFrame {
                    buffered: buffer.len(),
                })
            };
        }
    }
}

fn parse_frame(
    buffer: &mut BytesMut,
    registry: &PduRegistry,
) -> Result<Option<Frame>, ConnectionError> {
    let Some(len) = Frame::check(&buffer[..])? else {
        return Ok(None);
    };

    let parsed = Frame::parse(&buffer[..len], registry);
    let result = match parsed {
        Ok(frame) => Ok(Some(frame)),
        Err(source) => {
            let header = &buffer[..PduHeader::SIZE];
            Err(ConnectionError::Malformed {
                command_id: u32::from_be_bytes([header[4], header[5], header[6], header[7]]),
                sequence_number: u32::from_be_bytes([header[12], header[13], header[14], header[15]]),
                source,
            })
        }
    };

    // Discard the PDU whether or not it decoded
    buffer.advance(len);
    result
}

async fn write_frame<W: AsyncWrite + Unpin>(
    stream: &mut BufWriter<W>,
    frame: &Frame,
) -> Result<(), ConnectionError> {
    let mut buf = BytesMut::new();
    frame.encode(&mut buf)?;

    tracing::debug!(
        pdu = frame.name(),
        sequence_number = frame.sequence_number(),
        length = buf.len(),
        "writing frame"
    );

    stream.write_all(&buf).await?;
    stream.flush().await?;
    Ok(())
}
