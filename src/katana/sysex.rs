//! Katana SysEx framing.
//!
//! Every command shares the same shape:
//!
//! ```text
//! F0 41 00 00 00 00 33 <dir> <addr:4> <payload..> <checksum> F7
//! ```
//!
//! where `dir` is `0x12` for "set" and `0x11` for "query" (a query's payload
//! is a four-byte size). The checksum is the value that makes the sum of the
//! address and payload bytes a multiple of 128.

use super::address::Address;

/// Frame header: SysEx start, Roland manufacturer id, device id, Katana model id.
pub const HEADER: [u8; 7] = [0xF0, 0x41, 0x00, 0x00, 0x00, 0x00, 0x33];

/// Direction byte for writing a value.
pub const CMD_SET: u8 = 0x12;
/// Direction byte for requesting a range of values.
pub const CMD_QUERY: u8 = 0x11;
/// End-of-exclusive terminator.
pub const EOX: u8 = 0xF7;

/// Offset of the first address byte within a frame.
const ADDR_OFFSET: usize = 8;
/// Offset of the first data byte within a frame.
const DATA_OFFSET: usize = 12;
/// Smallest well-formed frame: header, direction, address, checksum, EOX.
const MIN_FRAME_LEN: usize = 14;

/// A decoded telemetry frame: a starting address and a run of data bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dump {
    pub start: Address,
    pub data: Vec<u8>,
}

/// Roland checksum over the address and payload bytes: the unique value that
/// brings their mod-128 sum to zero.
pub fn checksum(body: &[u8]) -> u8 {
    let sum: u32 = body.iter().map(|&b| u32::from(b)).sum::<u32>() % 128;
    ((128 - sum) % 128) as u8
}

/// Build a "set" frame writing `payload` at `addr`.
pub fn encode_set(addr: Address, payload: &[u8]) -> Vec<u8> {
    encode(CMD_SET, addr, payload)
}

/// Build a "query" frame requesting `size` bytes starting at `addr`.
pub fn encode_query(addr: Address, size: [u8; 4]) -> Vec<u8> {
    encode(CMD_QUERY, addr, &size)
}

fn encode(direction: u8, addr: Address, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(HEADER.len() + payload.len() + 7);
    frame.extend_from_slice(&HEADER);
    frame.push(direction);
    frame.extend_from_slice(&addr.bytes());
    frame.extend_from_slice(payload);
    frame.push(checksum(&frame[ADDR_OFFSET..]));
    frame.push(EOX);
    frame
}

/// Decode a frame pushed by the amp into its starting address and data run.
///
/// Frames from other manufacturers, truncated frames, and anything not
/// terminated by `F7` decode to `None` and are simply ignored upstream.
/// The received checksum is stripped, never verified: the amp is trusted.
pub fn decode(frame: &[u8]) -> Option<Dump> {
    if frame.len() < MIN_FRAME_LEN
        || frame[..HEADER.len()] != HEADER
        || *frame.last()? != EOX
    {
        return None;
    }
    let start = Address::from_bytes(&frame[ADDR_OFFSET..DATA_OFFSET])?;
    let data = frame[DATA_OFFSET..frame.len() - 2].to_vec();
    Some(Dump { start, data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_checksum_reference_values() {
        // 7f + 00 + 00 + 01 + 01 = 0x81 -> checksum 0x7f
        assert_eq!(checksum(&[0x7F, 0x00, 0x00, 0x01, 0x01]), 0x7F);
        // sum already a multiple of 128 -> checksum 0
        assert_eq!(checksum(&[0x40, 0x40]), 0x00);
        assert_eq!(checksum(&[]), 0x00);
    }

    #[test]
    fn test_encode_set_verbose_mode() {
        let frame = encode_set(Address::new([0x7F, 0x00, 0x00, 0x01]), &[0x01]);
        assert_eq!(
            frame,
            vec![0xF0, 0x41, 0x00, 0x00, 0x00, 0x00, 0x33, 0x12, 0x7F, 0x00, 0x00, 0x01, 0x01, 0x7F, 0xF7]
        );
    }

    #[test]
    fn test_encode_query_patch() {
        let frame = encode_query(Address::new([0x00, 0x01, 0x00, 0x00]), [0x00, 0x00, 0x00, 0x02]);
        assert_eq!(
            frame,
            vec![0xF0, 0x41, 0x00, 0x00, 0x00, 0x00, 0x33, 0x11, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x7D, 0xF7]
        );
    }

    #[test]
    fn test_decode_roundtrip() {
        let addr = Address::new([0x60, 0x00, 0x00, 0x10]);
        let frame = encode_set(addr, &[0x01, 0x02, 0x03]);
        let dump = decode(&frame).unwrap();
        assert_eq!(dump.start, addr);
        assert_eq!(dump.data, vec![0x01, 0x02, 0x03]);
    }

    #[test]
    fn test_decode_empty_payload() {
        let frame = encode_set(Address::new([0x60, 0x00, 0x00, 0x10]), &[]);
        let dump = decode(&frame).unwrap();
        assert!(dump.data.is_empty());
    }

    #[test]
    fn test_decode_rejects_malformed_frames() {
        // too short
        assert_eq!(decode(&[0xF0, 0x41, 0xF7]), None);
        // foreign manufacturer
        let mut frame = encode_set(Address::new([0x60, 0x00, 0x00, 0x10]), &[0x01]);
        frame[1] = 0x7E;
        assert_eq!(decode(&frame), None);
        // missing terminator
        let mut frame = encode_set(Address::new([0x60, 0x00, 0x00, 0x10]), &[0x01]);
        frame.pop();
        assert_eq!(decode(&frame), None);
    }

    proptest! {
        /// The checksum always brings the body sum to zero mod 128.
        #[test]
        fn prop_checksum_zeroes_the_sum(body in proptest::collection::vec(0u8..0x80, 0..64)) {
            let cs = checksum(&body);
            let total: u32 = body.iter().map(|&b| u32::from(b)).sum::<u32>() + u32::from(cs);
            prop_assert_eq!(total % 128, 0);
            prop_assert!(cs < 0x80);
        }

        /// Any encoded set frame decodes back to its address and payload.
        #[test]
        fn prop_encode_decode_roundtrip(
            addr in proptest::array::uniform4(0u8..0x80),
            payload in proptest::collection::vec(0u8..0x80, 0..32),
        ) {
            let frame = encode_set(Address::new(addr), &payload);
            let dump = decode(&frame).unwrap();
            prop_assert_eq!(dump.start, Address::new(addr));
            prop_assert_eq!(dump.data, payload);
        }
    }
}
