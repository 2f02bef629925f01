//! ECDSA signing over secp256k1 with public key recovery.
//!
//! Scalar arithmetic stays inside k256: signatures are canonicalized to
//! low-s form through [`ecdsa::Signature::normalize_s`], with the
//! recovery parity flipped whenever s was folded. This module only adds
//! the r/s/v wire shape and the address derivations built on keccak.

use ember_primitives::{Address, H256};
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{self, RecoveryId, SigningKey, VerifyingKey};

use crate::{keccak256, CryptoError};

/// Public key (secp256k1 verifying key)
pub type PublicKey = VerifyingKey;

/// Private key (secp256k1 signing key)
pub type PrivateKey = SigningKey;

/// ECDSA signature in the r/s/v form used on the wire.
///
/// `v` carries the recovery parity in the 27/28 convention of
/// `personal_sign`; envelope code narrows it back through
/// [`Signature::recovery_id`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    /// r scalar, big-endian
    pub r: H256,
    /// s scalar, big-endian (low-s form when produced by [`sign`])
    pub s: H256,
    /// Recovery value (27 or 28)
    pub v: u8,
}

impl Signature {
    /// Assemble from components
    pub fn new(r: H256, s: H256, v: u8) -> Self {
        Signature { r, s, v }
    }

    /// Recovery id (0 or 1), regardless of which v convention is stored
    pub fn recovery_id(&self) -> u8 {
        self.v.checked_sub(27).unwrap_or(self.v)
    }

    /// 65-byte wire form `r || s || v`
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut wire = [0u8; 65];
        wire[..32].copy_from_slice(self.r.as_bytes());
        wire[32..64].copy_from_slice(self.s.as_bytes());
        wire[64] = self.v;
        wire
    }

    /// Hex rendering of the wire form, 0x-prefixed
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// Parse the 65-byte wire form
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 65 {
            return Err(CryptoError::InvalidSignature(format!(
                "expected 65 bytes, got {}",
                bytes.len()
            )));
        }
        let r = H256::from_slice(&bytes[..32])
            .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
        let s = H256::from_slice(&bytes[32..64])
            .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
        Ok(Signature { r, s, v: bytes[64] })
    }

    /// Parse the 0x-hex wire form (as returned by `personal_sign`)
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes =
            hex::decode(stripped).map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Whether s is in the low half of the curve order (EIP-2).
    ///
    /// Out-of-range scalars report false rather than erroring, so this
    /// doubles as a cheap well-formedness probe.
    pub fn is_low_s(&self) -> bool {
        match self.to_ecdsa() {
            Ok(raw) => raw.normalize_s().is_none(),
            Err(_) => false,
        }
    }

    /// View as a k256 signature, validating both scalars
    fn to_ecdsa(&self) -> Result<ecdsa::Signature, CryptoError> {
        let mut scalars = [0u8; 64];
        scalars[..32].copy_from_slice(self.r.as_bytes());
        scalars[32..].copy_from_slice(self.s.as_bytes());
        ecdsa::Signature::from_slice(&scalars)
            .map_err(|e| CryptoError::InvalidSignature(e.to_string()))
    }

    fn from_parts(raw: &ecdsa::Signature, recovery: RecoveryId) -> Result<Self, CryptoError> {
        let scalars = raw.to_bytes();
        let r = H256::from_slice(&scalars[..32])
            .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
        let s = H256::from_slice(&scalars[32..])
            .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
        Ok(Signature { r, s, v: recovery.to_byte() + 27 })
    }
}

/// Sign a 32-byte digest, canonicalizing to low-s form
pub fn sign(digest: &H256, private_key: &PrivateKey) -> Result<Signature, CryptoError> {
    let (raw, recovery) = private_key
        .sign_prehash_recoverable(digest.as_bytes())
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

    // folding s across the curve order mirrors the recovery parity
    let (raw, recovery) = match raw.normalize_s() {
        Some(low) => {
            let flipped = RecoveryId::try_from(recovery.to_byte() ^ 1)
                .map_err(|_| CryptoError::SigningFailed("recovery id out of range".to_string()))?;
            (low, flipped)
        }
        None => (raw, recovery),
    };

    Signature::from_parts(&raw, recovery)
}

/// Verify a signature against a digest and public key.
///
/// High-s signatures fail verification outright (EIP-2).
pub fn verify(
    digest: &H256,
    signature: &Signature,
    public_key: &PublicKey,
) -> Result<bool, CryptoError> {
    let raw = match signature.to_ecdsa() {
        Ok(raw) => raw,
        Err(_) => return Ok(false),
    };
    if raw.normalize_s().is_some() {
        return Ok(false);
    }
    Ok(public_key.verify_prehash(digest.as_bytes(), &raw).is_ok())
}

/// Recover the signing public key from a signature and digest
pub fn recover_public_key(digest: &H256, signature: &Signature) -> Result<PublicKey, CryptoError> {
    let raw = signature.to_ecdsa()?;
    let recovery = RecoveryId::try_from(signature.recovery_id())
        .map_err(|_| CryptoError::InvalidRecoveryId(signature.recovery_id()))?;
    VerifyingKey::recover_from_prehash(digest.as_bytes(), &raw, recovery)
        .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))
}

/// The low 20 bytes of a 32-byte hash, as an address.
///
/// Both account derivation and CREATE address derivation end in this
/// truncation.
pub fn hash_to_address(hash: &H256) -> Address {
    let mut tail = [0u8; 20];
    tail.copy_from_slice(&hash.as_bytes()[12..]);
    Address::from_bytes(tail)
}

/// Derive the account address: keccak-256 over the uncompressed point
/// X ‖ Y (64 bytes, no 0x04 tag), truncated to 20 bytes
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    let point = public_key.to_encoded_point(false);
    hash_to_address(&keccak256(&point.as_bytes()[1..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    fn test_key() -> PrivateKey {
        // repeating 0123... pattern, 32 bytes
        let bytes = hex::decode("0123012301230123012301230123012301230123012301230123012301230123")
            .unwrap();
        SigningKey::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_sign_and_verify() {
        let key = SigningKey::random(&mut OsRng);
        let digest = keccak256(b"sign and verify");
        let sig = sign(&digest, &key).unwrap();
        assert!(sig.is_low_s());
        assert!(verify(&digest, &sig, key.verifying_key()).unwrap());
    }

    #[test]
    fn test_recover_matches_signer() {
        let key = test_key();
        let digest = keccak256(b"recovery");
        let sig = sign(&digest, &key).unwrap();
        let recovered = recover_public_key(&digest, &sig).unwrap();
        assert_eq!(
            public_key_to_address(&recovered),
            public_key_to_address(key.verifying_key())
        );
    }

    #[test]
    fn test_v_is_27_or_28() {
        let sig = sign(&keccak256(b"v value"), &test_key()).unwrap();
        assert!(sig.v == 27 || sig.v == 28);
        assert!(sig.recovery_id() <= 1);
    }

    #[test]
    fn test_recovery_id_handles_both_conventions() {
        let low = Signature::new(H256::ZERO, H256::ZERO, 1);
        assert_eq!(low.recovery_id(), 1);
        let high = Signature::new(H256::ZERO, H256::ZERO, 28);
        assert_eq!(high.recovery_id(), 1);
    }

    #[test]
    fn test_address_derivation_is_stable() {
        let key = test_key();
        let a1 = public_key_to_address(key.verifying_key());
        let a2 = public_key_to_address(key.verifying_key());
        assert_eq!(a1, a2);

        let other = SigningKey::random(&mut OsRng);
        assert_ne!(a1, public_key_to_address(other.verifying_key()));
    }

    #[test]
    fn test_known_key_address() {
        // First account of the common "test ... junk" developer mnemonic
        let bytes = hex::decode("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80")
            .unwrap();
        let key = SigningKey::from_slice(&bytes).unwrap();
        assert_eq!(
            public_key_to_address(key.verifying_key()).to_hex(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_hash_to_address_truncates() {
        let hash = keccak256(b"some hash");
        let address = hash_to_address(&hash);
        assert_eq!(address.as_bytes(), &hash.as_bytes()[12..]);
    }

    #[test]
    fn test_verify_rejects_high_s() {
        let key = test_key();
        let digest = keccak256(b"high s");
        let mut sig = sign(&digest, &key).unwrap();
        // way past the curve order: the scalar check alone must fail it
        sig.s = H256::from_bytes([0xff; 32]);
        assert!(!sig.is_low_s());
        assert!(!verify(&digest, &sig, key.verifying_key()).unwrap());
    }

    #[test]
    fn test_verify_rejects_wrong_digest() {
        let key = test_key();
        let sig = sign(&keccak256(b"one"), &key).unwrap();
        assert!(!verify(&keccak256(b"two"), &sig, key.verifying_key()).unwrap());
    }

    #[test]
    fn test_wire_form_roundtrips() {
        let sig = sign(&keccak256(b"serialize"), &test_key()).unwrap();

        let bytes = sig.to_bytes();
        assert_eq!(Signature::from_bytes(&bytes).unwrap(), sig);

        let hex = sig.to_hex();
        assert_eq!(hex.len(), 2 + 130);
        assert_eq!(Signature::from_hex(&hex).unwrap(), sig);
    }

    #[test]
    fn test_from_bytes_rejects_wrong_length() {
        assert!(matches!(
            Signature::from_bytes(&[0u8; 64]),
            Err(CryptoError::InvalidSignature(_))
        ));
        assert!(Signature::from_hex("0x1234").is_err());
    }

    #[test]
    fn test_invalid_recovery_id() {
        let mut sig = sign(&keccak256(b"bad v"), &test_key()).unwrap();
        sig.v = 30;
        assert!(matches!(
            recover_public_key(&keccak256(b"bad v"), &sig),
            Err(CryptoError::InvalidRecoveryId(_)) | Err(CryptoError::RecoveryFailed(_))
        ));
    }
}
