use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{GatewayMessage, MAX_MESSAGE_SIZE};

/// Bytes after the length prefix that are not payload: request id + tag.
const FRAME_OVERHEAD: usize = 8 + 1;

/// A message tagged with the request it belongs to.
///
/// Responses echo the request id of the request they answer.
#[derive(Clone, Debug)]
pub struct Frame {
    pub request_id: u64,
    pub message: GatewayMessage,
}

/// Codec for framed LedgerGateway messages.
pub struct GatewayCodec;

impl GatewayCodec {
    /// Encode a frame: `[4 bytes len][8 bytes request id][1 byte tag][payload]`.
    ///
    /// `len` counts everything after itself; integers are big-endian.
    pub fn encode(frame: &Frame) -> ProtocolResult<Vec<u8>> {
        let payload = bincode::serialize(&frame.message)
            .map_err(|e| ProtocolError::Serialization(e.to_string()))?;
        if payload.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: payload.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }
        let len = (payload.len() + FRAME_OVERHEAD) as u32;
        let mut buf = BytesMut::with_capacity(4 + FRAME_OVERHEAD + payload.len());
        buf.put_u32(len);
        buf.put_u64(frame.request_id);
        buf.put_u8(frame.message.type_tag());
        buf.put_slice(&payload);
        Ok(buf.to_vec())
    }

    /// Decode a frame from a buffer. Returns `(frame, bytes_consumed)`.
    pub fn decode(data: &[u8]) -> ProtocolResult<(Frame, usize)> {
        if data.len() < 4 {
            return Err(ProtocolError::FramingError("too short".into()));
        }
        let len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
        Self::check_len(len)?;
        let total = 4 + len;
        if data.len() < total {
            return Err(ProtocolError::FramingError(format!(
                "incomplete: have {}, need {}",
                data.len(),
                total
            )));
        }
        let frame = Self::decode_body(&data[4..total])?;
        Ok((frame, total))
    }

    fn check_len(len: usize) -> ProtocolResult<()> {
        if len < FRAME_OVERHEAD {
            return Err(ProtocolError::FramingError(format!(
                "frame length {len} shorter than header"
            )));
        }
        if len - FRAME_OVERHEAD > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: len - FRAME_OVERHEAD,
                max: MAX_MESSAGE_SIZE,
            });
        }
        Ok(())
    }

    /// Decode everything after the length prefix.
    fn decode_body(body: &[u8]) -> ProtocolResult<Frame> {
        let mut id_bytes = [0u8; 8];
        id_bytes.copy_from_slice(&body[..8]);
        let request_id = u64::from_be_bytes(id_bytes);
        let tag = body[8];
        let message: GatewayMessage = bincode::deserialize(&body[FRAME_OVERHEAD..])
            .map_err(|e| ProtocolError::Deserialization(e.to_string()))?;
        if message.type_tag() != tag {
            return Err(ProtocolError::InvalidMessageType(tag));
        }
        Ok(Frame {
            request_id,
            message,
        })
    }
}

/// Read one frame from an async stream.
///
/// Returns `Ok(None)` when the peer closed the stream before a new frame
/// started.
pub async fn read_frame<R>(reader: &mut R) -> ProtocolResult<Option<Frame>>
where
    R: AsyncRead + Unpin,
{
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if let Err(e) = GatewayCodec::check_len(len) {
        tracing::warn!(len, "rejecting inbound frame");
        return Err(e);
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    GatewayCodec::decode_body(&body).map(Some)
}

/// Write one frame and flush.
pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> ProtocolResult<()>
where
    W: AsyncWrite + Unpin,
{
    let bytes = GatewayCodec::encode(frame)?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}
