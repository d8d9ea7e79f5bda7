//! Length-prefixed framing for `ConfigActionData` (§4.E, §6): a 4-byte
//! little-endian length prefix followed by a `bincode`-encoded body, built
//! on `tokio_util::codec::LengthDelimitedCodec` the way `graphix-rt` frames
//! its own channel messages over length-delimited transports.

use arcstr::ArcStr;
use bytes::{BufMut, Bytes, BytesMut};
use cfgtree_core::{Error, Result};
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

use crate::action::ConfigActionData;

/// Frames exceeding this size are rejected per §4.E ("suggested 64 KiB").
pub const MAX_FRAME_LEN: usize = 64 * 1024;

pub struct MessageCodec {
    inner: LengthDelimitedCodec,
}

impl MessageCodec {
    pub fn new() -> Self {
        MessageCodec {
            inner: LengthDelimitedCodec::builder()
                .little_endian()
                .length_field_length(4)
                .max_frame_length(MAX_FRAME_LEN)
                .new_codec(),
        }
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        MessageCodec::new()
    }
}

impl Decoder for MessageCodec {
    type Item = ConfigActionData;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> std::result::Result<Option<Self::Item>, Self::Error> {
        let Some(frame) = self.inner.decode(src).map_err(io_err)? else {
            return Ok(None);
        };
        decode_body(&frame).map(Some)
    }
}

impl Encoder<ConfigActionData> for MessageCodec {
    type Error = Error;

    fn encode(&mut self, item: ConfigActionData, dst: &mut BytesMut) -> std::result::Result<(), Self::Error> {
        let body = bincode::serialize(&item).map_err(bincode_err)?;
        self.inner.encode(Bytes::from(body), dst).map_err(io_err)
    }
}

/// Decodes a single already length-delimited body. Exposed separately from
/// the `Decoder` impl so tests and the DUMP_TREE streaming path (which reads
/// whole frames off a `LengthDelimitedCodec` `Framed` stream directly) can
/// decode a `BytesMut`/`Bytes` without going through a full codec round.
pub fn decode_body(frame: &[u8]) -> Result<ConfigActionData> {
    bincode::deserialize(frame).map_err(bincode_err)
}

/// Encodes a single body with its 4-byte little-endian length prefix,
/// without going through the `Encoder` trait. Used by tests and by
/// non-tokio callers.
pub fn encode_frame(msg: &ConfigActionData) -> Result<Vec<u8>> {
    let body = bincode::serialize(msg).map_err(bincode_err)?;
    if body.len() > MAX_FRAME_LEN {
        return Err(Error::ProtocolError(ArcStr::from(format!(
            "frame of {} bytes exceeds the {MAX_FRAME_LEN}-byte limit",
            body.len()
        ))));
    }
    let mut out = BytesMut::with_capacity(4 + body.len());
    out.put_u32_le(body.len() as u32);
    out.put_slice(&body);
    Ok(out.to_vec())
}

fn bincode_err(e: bincode::Error) -> Error {
    Error::ProtocolError(ArcStr::from(e.to_string()))
}

fn io_err(e: std::io::Error) -> Error {
    Error::IoError(ArcStr::from(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;

    #[test]
    fn frame_round_trip() {
        let msg = ConfigActionData::bare(Action::Get, 42);
        let frame = encode_frame(&msg).unwrap();
        let len = u32::from_le_bytes(frame[0..4].try_into().unwrap()) as usize;
        assert_eq!(len, frame.len() - 4);
        let back = decode_body(&frame[4..]).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn oversize_frame_rejected() {
        let mut msg = ConfigActionData::bare(Action::Get, 1);
        msg.value = "x".repeat(MAX_FRAME_LEN + 1);
        assert!(encode_frame(&msg).is_err());
    }
}
