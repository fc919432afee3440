//! Encryption seam: wraps a section's payload with a block cipher keyed
//! from a password (spec §6, "encryption: password enables a block-cipher
//! layer under every section"). Only a no-op `Identity` implementation is
//! provided — the cipher algorithm itself is an external collaborator per
//! spec §1's non-goals list; this module only fixes the trait shape a
//! real implementation would plug into, the same seam-not-implementation
//! role `ngdp-crypto` plays for its own section-level encryption layer.

use crate::error::Result;

/// Encrypts/decrypts one section's payload, after padding to the cipher's
/// block size (spec §6: "section size is padded to the cipher's block
/// size before encryption").
pub trait SectionCipher: Send + Sync {
    fn block_size(&self) -> usize;
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>>;
}

/// No-op cipher used when no password is configured.
pub struct Identity;

impl SectionCipher for Identity {
    fn block_size(&self) -> usize {
        1
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        Ok(plaintext.to_vec())
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        Ok(ciphertext.to_vec())
    }
}

/// Pads `data` up to a multiple of `block_size` with zero bytes, recording
/// the original length isn't needed here since callers already carry
/// `uncompressed_size` in the section header.
pub fn pad_to_block(data: &[u8], block_size: usize) -> Vec<u8> {
    if block_size <= 1 {
        return data.to_vec();
    }
    let mut out = data.to_vec();
    let rem = out.len() % block_size;
    if rem != 0 {
        out.resize(out.len() + (block_size - rem), 0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_round_trips() {
        let cipher = Identity;
        let data = b"some section payload";
        let enc = cipher.encrypt(data).unwrap();
        let dec = cipher.decrypt(&enc).unwrap();
        assert_eq!(dec, data);
    }

    #[test]
    fn pad_to_block_is_noop_for_block_size_one() {
        assert_eq!(pad_to_block(b"abc", 1), b"abc");
    }

    #[test]
    fn pad_to_block_rounds_up() {
        assert_eq!(pad_to_block(b"abc", 8).len(), 8);
        assert_eq!(pad_to_block(b"abcdefgh", 8).len(), 8);
    }
}
