//! Length-prefixed framing
//!
//! Frame layout, identical in both directions:
//! - payload_len (u32 BE)
//! - payload (payload_len bytes)
//!
//! Payloads are opaque. Commands, handshakes, acknowledgments and the exit
//! sentinel are all framed the same way.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::errors::{WireError, WireResult};

/// Size of the length header in bytes
pub const HEADER_LEN: usize = 4;

/// Sent after the last command; the controller closes the connection on it
pub const EXIT_SENTINEL: &[u8] = b"query(exit)\n";

/// Expected reply to the default-policy handshake
pub const ACK: &[u8] = b"ACK";

/// Upper bound on the payload buffer reserved before any payload byte arrives
const READ_CHUNK: usize = 64 * 1024;

/// Prepend the big-endian length header to `payload`
///
/// # Errors
///
/// `FrameTooLarge` if the payload is longer than `u32::MAX` bytes.
pub fn encode(payload: &[u8]) -> WireResult<Vec<u8>> {
    let len = u32::try_from(payload.len()).map_err(|_| WireError::FrameTooLarge(payload.len()))?;

    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Encode `payload` and write it as one frame, then flush
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> WireResult<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let frame = encode(payload)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame
///
/// Returns `Ok(None)` if the peer closes the connection before the header or
/// the payload is complete. Callers treat that as end-of-stream and stop
/// reading from the connection.
///
/// The payload buffer grows with the bytes actually received, so a header
/// announcing more than the peer sends never allocates the announced size.
pub async fn read_frame<R>(reader: &mut R) -> WireResult<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut header = [0u8; HEADER_LEN];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(header) as usize;
    let mut payload = Vec::with_capacity(len.min(READ_CHUNK));
    (&mut *reader).take(len as u64).read_to_end(&mut payload).await?;
    if payload.len() < len {
        return Ok(None);
    }

    Ok(Some(payload))
}
