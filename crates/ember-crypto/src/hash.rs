//! Keccak-256 digests

use ember_primitives::H256;
use sha3::{Digest, Keccak256};

/// Keccak-256 of arbitrary input
pub fn keccak256(data: impl AsRef<[u8]>) -> H256 {
    H256::from_bytes(Keccak256::digest(data.as_ref()).into())
}

/// EIP-191 `personal_sign` digest.
///
/// Hashes `"\x19Ethereum Signed Message:\n" || decimal_len(M) || M` so a
/// signed message can never double as a transaction payload.
pub fn hash_message(message: impl AsRef<[u8]>) -> H256 {
    let message = message.as_ref();
    let mut hasher = Keccak256::new();
    hasher.update(format!("\x19Ethereum Signed Message:\n{}", message.len()));
    hasher.update(message);
    H256::from_bytes(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_empty() {
        assert_eq!(
            keccak256(b"").to_hex(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_keccak256_hello() {
        assert_eq!(
            keccak256(b"hello").to_hex(),
            "0x1c8aff950685c2ed4bc3174f3472287b56d9517b9c948127319a09a7a36deac8"
        );
    }

    #[test]
    fn test_keccak256_transfer_selector() {
        // ERC-20 transfer(address,uint256) selector is the first 4 bytes
        let hash = keccak256("transfer(address,uint256)");
        assert_eq!(&hash.as_bytes()[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn test_keccak256_balance_of_selector() {
        let hash = keccak256("balanceOf(address)");
        assert_eq!(&hash.as_bytes()[..4], &[0x70, 0xa0, 0x82, 0x31]);
    }

    #[test]
    fn test_keccak256_transfer_event_topic() {
        assert_eq!(
            keccak256("Transfer(address,address,uint256)").to_hex(),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn test_keccak256_accepts_owned_and_borrowed() {
        let owned = vec![0xde, 0xad, 0xbe, 0xef];
        assert_eq!(keccak256(&owned), keccak256(owned.as_slice()));
        assert_ne!(keccak256(b"a"), keccak256(b"b"));
    }

    #[test]
    fn test_hash_message_applies_prefix() {
        let message = b"hello";
        let mut prefixed = format!("\x19Ethereum Signed Message:\n{}", message.len()).into_bytes();
        prefixed.extend_from_slice(message);

        assert_eq!(hash_message(message), keccak256(&prefixed));
        // the prefix must change the digest
        assert_ne!(hash_message(message), keccak256(message));
    }

    #[test]
    fn test_hash_message_length_sensitive() {
        // same bytes, different framing
        assert_ne!(hash_message(b"ab"), hash_message(b"abc"));
        assert_eq!(hash_message(b""), hash_message(b"".to_vec()));
    }
}
