//! # ember-rlp
//!
//! RLP (Recursive Length Prefix) encoding for the Ember Ethereum SDK.
//!
//! Transactions are the only RLP consumer in this workspace and they are
//! write-only, so this crate encodes and never decodes.
//!
//! ## Encoding rules
//!
//! - Single byte `[0x00, 0x7f]`: itself
//! - Short string (0-55 bytes): `0x80 + len` + data
//! - Long string (>55 bytes): `0xb7 + len_of_len` + len + data
//! - Short list (0-55 bytes payload): `0xc0 + len` + items
//! - Long list (>55 bytes payload): `0xf7 + len_of_len` + len + items
//!
//! Integer fields strip leading zero bytes first; zero encodes as the
//! empty string (`0x80`).

#![warn(missing_docs)]
#![warn(clippy::all)]

use bytes::{BufMut, BytesMut};
use ember_primitives::U256;

/// Encode a byte string
pub fn encode_bytes(data: &[u8]) -> Vec<u8> {
    if data.len() == 1 && data[0] < 0x80 {
        return data.to_vec();
    }
    let mut buf = BytesMut::with_capacity(data.len() + 9);
    put_length_prefix(&mut buf, data.len(), 0x80);
    buf.put_slice(data);
    buf.to_vec()
}

/// Encode a u64 as a minimal big-endian integer
pub fn encode_u64(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(8);
    encode_bytes(&bytes[start..])
}

/// Encode a u128 as a minimal big-endian integer
pub fn encode_u128(value: u128) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(16);
    encode_bytes(&bytes[start..])
}

/// Encode a U256 as a minimal big-endian integer
pub fn encode_u256(value: U256) -> Vec<u8> {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(32);
    encode_bytes(&bytes[start..])
}

/// List builder.
///
/// Items are pushed pre-encoded; `finish` frames the concatenation.
/// Nested lists compose by pushing a finished inner list with
/// [`RlpList::push_raw`].
#[derive(Debug, Default)]
pub struct RlpList {
    payload: BytesMut,
}

impl RlpList {
    /// Create an empty list
    pub fn new() -> Self {
        Self { payload: BytesMut::new() }
    }

    /// Append a byte-string item
    pub fn push_bytes(&mut self, data: &[u8]) -> &mut Self {
        self.payload.put_slice(&encode_bytes(data));
        self
    }

    /// Append a u64 integer item
    pub fn push_u64(&mut self, value: u64) -> &mut Self {
        self.payload.put_slice(&encode_u64(value));
        self
    }

    /// Append a U256 integer item
    pub fn push_u256(&mut self, value: U256) -> &mut Self {
        self.payload.put_slice(&encode_u256(value));
        self
    }

    /// Append an already encoded item (e.g. a nested list)
    pub fn push_raw(&mut self, encoded: &[u8]) -> &mut Self {
        self.payload.put_slice(encoded);
        self
    }

    /// Frame the accumulated payload as a list
    pub fn finish(self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(self.payload.len() + 9);
        put_length_prefix(&mut buf, self.payload.len(), 0xc0);
        buf.put_slice(&self.payload);
        buf.to_vec()
    }
}

/// Encode the empty list (`0xc0`)
pub fn empty_list() -> Vec<u8> {
    vec![0xc0]
}

fn put_length_prefix(buf: &mut BytesMut, len: usize, short_base: u8) {
    if len < 56 {
        buf.put_u8(short_base + len as u8);
    } else {
        let be = minimal_be(len);
        // 0xb7 for strings, 0xf7 for lists
        buf.put_u8(short_base + 55 + be.len() as u8);
        buf.put_slice(&be);
    }
}

fn minimal_be(len: usize) -> Vec<u8> {
    let bytes = (len as u64).to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(7);
    bytes[start..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_empty_string() {
        assert_eq!(encode_bytes(b""), vec![0x80]);
    }

    #[test]
    fn test_encode_single_bytes() {
        assert_eq!(encode_bytes(&[0x00]), vec![0x00]);
        assert_eq!(encode_bytes(&[0x7f]), vec![0x7f]);
        assert_eq!(encode_bytes(&[0x80]), vec![0x81, 0x80]);
    }

    #[test]
    fn test_encode_dog() {
        // Yellow Paper example
        assert_eq!(encode_bytes(b"dog"), vec![0x83, b'd', b'o', b'g']);
    }

    #[test]
    fn test_encode_long_string() {
        let data = vec![0xaa; 56];
        let encoded = encode_bytes(&data);
        assert_eq!(encoded[0], 0xb8);
        assert_eq!(encoded[1], 56);
        assert_eq!(&encoded[2..], &data[..]);
    }

    #[test]
    fn test_encode_integers() {
        assert_eq!(encode_u64(0), vec![0x80]);
        assert_eq!(encode_u64(15), vec![0x0f]);
        assert_eq!(encode_u64(127), vec![0x7f]);
        assert_eq!(encode_u64(128), vec![0x81, 0x80]);
        assert_eq!(encode_u64(1024), vec![0x82, 0x04, 0x00]);
        assert_eq!(encode_u256(U256::zero()), vec![0x80]);
        assert_eq!(
            encode_u256(U256::from(1_000_000_000_000_000_000u128)),
            encode_u128(1_000_000_000_000_000_000)
        );
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(RlpList::new().finish(), vec![0xc0]);
        assert_eq!(empty_list(), vec![0xc0]);
    }

    #[test]
    fn test_cat_dog_list() {
        let mut list = RlpList::new();
        list.push_bytes(b"cat").push_bytes(b"dog");
        assert_eq!(
            list.finish(),
            vec![0xc8, 0x83, b'c', b'a', b't', 0x83, b'd', b'o', b'g']
        );
    }

    #[test]
    fn test_nested_list() {
        // [ [], [[]] ]
        let inner_empty = RlpList::new().finish();
        let mut wrapped = RlpList::new();
        wrapped.push_raw(&inner_empty);
        let wrapped = wrapped.finish();

        let mut outer = RlpList::new();
        outer.push_raw(&inner_empty).push_raw(&wrapped);
        assert_eq!(outer.finish(), vec![0xc3, 0xc0, 0xc1, 0xc0]);
    }

    #[test]
    fn test_list_framing_is_frame_of_concat() {
        let items = [encode_u64(1), encode_bytes(b"hello"), encode_u64(1024)];
        let concat: Vec<u8> = items.iter().flatten().copied().collect();

        let mut list = RlpList::new();
        list.push_u64(1).push_bytes(b"hello").push_u64(1024);
        let framed = list.finish();

        assert_eq!(framed[0], 0xc0 + concat.len() as u8);
        assert_eq!(&framed[1..], &concat[..]);
    }

    #[test]
    fn test_long_list_header() {
        let mut list = RlpList::new();
        for _ in 0..8 {
            list.push_bytes(&[0xbb; 8]);
        }
        let encoded = list.finish();
        // 8 items x 9 bytes payload = 72 >= 56
        assert_eq!(encoded[0], 0xf8);
        assert_eq!(encoded[1], 72);
    }

    // Differential checks against the rlp crate

    #[test]
    fn test_cross_check_strings() {
        for data in [&b""[..], &b"d"[..], &b"dog"[..], &[0x80u8][..], &[0u8; 60][..]] {
            assert_eq!(encode_bytes(data), rlp::encode(&data.to_vec()).to_vec());
        }
    }

    #[test]
    fn test_cross_check_integers() {
        for n in [0u64, 1, 15, 127, 128, 255, 256, 1024, u64::MAX] {
            assert_eq!(encode_u64(n), rlp::encode(&n).to_vec());
        }
    }

    #[test]
    fn test_cross_check_list() {
        let mut ours = RlpList::new();
        ours.push_bytes(b"cat").push_bytes(b"dog").push_u64(1024);

        let mut theirs = rlp::RlpStream::new_list(3);
        theirs.append(&b"cat".to_vec()).append(&b"dog".to_vec()).append(&1024u64);

        assert_eq!(ours.finish(), theirs.out().to_vec());
    }
}
