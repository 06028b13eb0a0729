use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::message::{Command, Message};
use crate::core::{Error, Result, BROADCAST_ADDRESS, HEADER_LEN, MAX_ARGUMENTS};

/// Encodes a message into its big-endian wire frame.
///
/// Fails only when the argument list exceeds the one-byte count field;
/// nothing is written on failure.
pub fn encode(msg: &Message) -> Result<Bytes> {
    if msg.arguments.len() > MAX_ARGUMENTS {
        return Err(Error::TooManyArguments(msg.arguments.len()));
    }

    let mut buf = BytesMut::with_capacity(msg.encoded_len());
    buf.put_u32(msg.destination);
    buf.put_u32(msg.source);

    let code = msg.command.code();
    buf.put_u8((code >> 16) as u8);
    buf.put_u8((code >> 8) as u8);
    buf.put_u8(code as u8);

    buf.put_u8(msg.arguments.len() as u8);
    for arg in &msg.arguments {
        buf.put_u32(*arg);
    }

    Ok(buf.freeze())
}

/// Decodes one wire frame back into a message.
///
/// The declared argument count is peer controlled, so both the header and the
/// full argument region are length-checked before any read; at most `count`
/// argument slots are ever allocated. Unrecognized command codes are not an
/// error here; they come back as [`Command::Unknown`].
pub fn decode(frame: &[u8]) -> Result<Message> {
    if frame.len() < HEADER_LEN {
        return Err(Error::Truncated {
            needed: HEADER_LEN,
            available: frame.len(),
        });
    }

    let mut buf = frame;
    let destination = buf.get_u32();
    let source = buf.get_u32();

    let hi = buf.get_u8() as u32;
    let mid = buf.get_u8() as u32;
    let lo = buf.get_u8() as u32;
    let code = (hi << 16) | (mid << 8) | lo;

    let count = buf.get_u8() as usize;
    let needed = HEADER_LEN + 4 * count;
    if frame.len() < needed {
        return Err(Error::Truncated {
            needed,
            available: frame.len(),
        });
    }

    let mut arguments = Vec::with_capacity(count);
    for _ in 0..count {
        arguments.push(buf.get_u32());
    }

    Ok(Message {
        destination,
        source,
        command: Command::from_code(code),
        arguments,
    })
}

/// Cheap pre-decode filter: does this frame address us?
///
/// Reads only the first four bytes; the transport applies this before paying
/// for a full decode. Anything shorter than a destination field is discarded.
pub fn accepts(own_address: u32, frame: &[u8]) -> bool {
    if frame.len() < 4 {
        return false;
    }
    let destination = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]);
    destination == own_address || destination == BROADCAST_ADDRESS
}

/// Frame codec for stream transports.
///
/// The wire frame is self-delimiting (fixed header plus the declared argument
/// count), so the codec can recover message boundaries from a byte stream.
#[derive(Clone, Default)]
pub struct FrameCodec;

impl FrameCodec {
    /// Creates a new frame codec
    pub fn new() -> Self {
        FrameCodec
    }
}

impl Decoder for FrameCodec {
    type Item = Message;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.len() < HEADER_LEN {
            // Need more data to read the header
            return Ok(None);
        }

        let count = src[HEADER_LEN - 1] as usize;
        let frame_len = HEADER_LEN + 4 * count;
        if src.len() < frame_len {
            // Need more data to read the argument region
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        let frame = src.split_to(frame_len);
        decode(&frame).map(Some)
    }
}

impl Encoder<Message> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<()> {
        let bytes = encode(&item)?;
        dst.extend_from_slice(&bytes);
        Ok(())
    }
}
