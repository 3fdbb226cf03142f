use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};

/// Frame header: magic (2) + length (4) = 6 bytes.
pub const HEADER_SIZE: usize = 6;

/// Magic bytes: "CR" (0x43 0x52).
pub const MAGIC: [u8; 2] = [0x43, 0x52];

/// Default maximum payload size: 1 MiB.
///
/// A full session snapshot with a capped history is a few tens of
/// kilobytes; anything near this limit is a protocol violation.
pub const DEFAULT_MAX_PAYLOAD: usize = 1024 * 1024;

/// Encode a payload into the wire format.
///
/// Wire format:
/// ```text
/// | Magic (2B) "CR" | Length (4B LE) | Payload (Length bytes) |
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > u32::MAX as usize {
        return Err(WireError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&MAGIC);
    dst.put_u32_le(payload.len() as u32);
    dst.put_slice(payload);
    Ok(())
}

/// Decode one frame payload from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Bytes>> {
    if src.len() < HEADER_SIZE {
        return Ok(None); // Need more data
    }

    if src[0..2] != MAGIC {
        return Err(WireError::InvalidMagic);
    }

    let payload_len = u32::from_le_bytes(src[2..6].try_into().expect("header slice is 4 bytes")) as usize;

    if payload_len > max_payload {
        return Err(WireError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        return Ok(None); // Need more data
    }

    src.advance(HEADER_SIZE);
    Ok(Some(src.split_to(payload_len).freeze()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let mut buf = BytesMut::new();
        let payload = b"{\"kind\":\"REACTION\"}";

        encode_frame(payload, &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE + payload.len());

        let decoded = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(decoded.as_ref(), payload);
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_incomplete_header() {
        let mut buf = BytesMut::from(&[0x43, 0x52, 0x00][..]);
        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn decode_incomplete_payload() {
        let mut buf = BytesMut::new();
        encode_frame(b"hello", &mut buf).unwrap();
        buf.truncate(HEADER_SIZE + 2);

        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn decode_invalid_magic() {
        let mut buf = BytesMut::from(&[0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00][..]);
        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD);
        assert!(matches!(result, Err(WireError::InvalidMagic)));
    }

    #[test]
    fn decode_payload_too_large() {
        let mut buf = BytesMut::new();
        buf.put_slice(&MAGIC);
        buf.put_u32_le(8 * 1024 * 1024);

        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD);
        assert!(matches!(result, Err(WireError::PayloadTooLarge { .. })));
    }

    #[test]
    fn multiple_frames() {
        let mut buf = BytesMut::new();
        encode_frame(b"first", &mut buf).unwrap();
        encode_frame(b"second", &mut buf).unwrap();

        let f1 = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(f1.as_ref(), b"first");

        let f2 = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(f2.as_ref(), b"second");

        assert!(buf.is_empty());
    }

    #[test]
    fn empty_payload() {
        let mut buf = BytesMut::new();
        encode_frame(b"", &mut buf).unwrap();

        let decoded = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();
        assert!(decoded.is_empty());
    }
}
