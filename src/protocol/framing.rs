//! Length-prefixed bincode framing over any async byte stream

use bytes::BufMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::Frame;
use crate::error::TransportError;

/// Largest encoded frame accepted on the wire
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Read one frame
///
/// Returns `Ok(None)` when the peer closed the stream cleanly between
/// frames. EOF inside a frame is `TransportError::Closed`.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Frame>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let len = match reader.read_u32_le().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if len > MAX_FRAME_SIZE {
        return Err(TransportError::FrameTooLarge(len));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            TransportError::Closed
        } else {
            TransportError::Io(e)
        }
    })?;

    bincode::deserialize(&body)
        .map(Some)
        .map_err(|e| TransportError::Malformed(e.to_string()))
}

/// Write and flush one frame
pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    let body = bincode::serialize(frame).map_err(|e| TransportError::Malformed(e.to_string()))?;
    if body.len() > MAX_FRAME_SIZE {
        return Err(TransportError::FrameTooLarge(body.len()));
    }

    let mut packet = Vec::with_capacity(4 + body.len());
    packet.put_u32_le(body.len() as u32);
    packet.put_slice(&body);

    writer.write_all(&packet).await?;
    writer.flush().await?;
    Ok(())
}

/// A byte stream speaking the frame protocol
pub struct FramedStream<S> {
    inner: S,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub async fn read(&mut self) -> Result<Option<Frame>, TransportError> {
        read_frame(&mut self.inner).await
    }

    pub async fn write(&mut self, frame: &Frame) -> Result<(), TransportError> {
        write_frame(&mut self.inner, frame).await
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}
