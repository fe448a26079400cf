//! Authenticated encryption for the stored gateway credential.
//!
//! Uses XChaCha20-Poly1305 (192-bit nonce).
//! Key size: 32 bytes.  Nonce: 24 bytes (random).  Tag: 16 bytes.
//!
//! Column wire format, base64-encoded:
//!   [ nonce (24 bytes) | ciphertext + tag ]
//!
//! A fresh nonce is drawn for every encryption, so identical plaintexts
//! produce different ciphertexts — stored values must never be compared
//! for equality as a substitute for decryption.

use base64::{engine::general_purpose, Engine as _};
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng as AeadOsRng},
    XChaCha20Poly1305,
};
use zeroize::Zeroizing;

use crate::error::CipherError;

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 24;

const CREDENTIAL_AAD: &[u8] = b"courier-credential-v1";

/// Symmetric cipher handle, constructed once at process start from
/// configuration and injected wherever credentials are encoded or decoded.
#[derive(Clone)]
pub struct SecretCipher {
    key: Zeroizing<[u8; KEY_LEN]>,
}

impl SecretCipher {
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }

    /// Parse a base64-encoded 32-byte key, the format used by the
    /// `COURIER_ENCRYPTION_KEY` configuration variable.
    pub fn from_base64(encoded: &str) -> Result<Self, CipherError> {
        let bytes = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| CipherError::KeyInvalid(e.to_string()))?;
        let key: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| CipherError::KeyInvalid(format!("key must be {KEY_LEN} bytes")))?;
        Ok(Self::new(key))
    }

    /// Encrypt a plaintext credential into the base64 column format.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let cipher = XChaCha20Poly1305::new_from_slice(self.key.as_ref())
            .map_err(|_| CipherError::Encrypt)?;
        let nonce = XChaCha20Poly1305::generate_nonce(&mut AeadOsRng);
        let ciphertext = cipher
            .encrypt(
                &nonce,
                chacha20poly1305::aead::Payload {
                    msg: plaintext.as_bytes(),
                    aad: CREDENTIAL_AAD,
                },
            )
            .map_err(|_| CipherError::Encrypt)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(general_purpose::STANDARD.encode(out))
    }

    /// Decrypt a stored column value.  Fails with [`CipherError::Decrypt`]
    /// when the value is malformed, was produced under a different key, or
    /// has been tampered with — callers must treat that as corrupt/foreign
    /// data, which is distinct from the value simply being absent.
    pub fn decrypt(&self, stored: &str) -> Result<Zeroizing<String>, CipherError> {
        let data = general_purpose::STANDARD
            .decode(stored)
            .map_err(|_| CipherError::Decrypt)?;
        if data.len() < NONCE_LEN {
            return Err(CipherError::Decrypt);
        }
        let (nonce_bytes, ct) = data.split_at(NONCE_LEN);
        let nonce = chacha20poly1305::XNonce::from_slice(nonce_bytes);

        let cipher = XChaCha20Poly1305::new_from_slice(self.key.as_ref())
            .map_err(|_| CipherError::Decrypt)?;
        let plaintext = cipher
            .decrypt(
                nonce,
                chacha20poly1305::aead::Payload {
                    msg: ct,
                    aad: CREDENTIAL_AAD,
                },
            )
            .map_err(|_| CipherError::Decrypt)?;

        let text = String::from_utf8(plaintext).map_err(|_| CipherError::Decrypt)?;
        Ok(Zeroizing::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cipher() -> SecretCipher {
        SecretCipher::new([7u8; KEY_LEN])
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let cipher = test_cipher();
        let stored = cipher.encrypt("sk-or-v1-secret").unwrap();
        let plain = cipher.decrypt(&stored).unwrap();
        assert_eq!(plain.as_str(), "sk-or-v1-secret");
    }

    #[test]
    fn nonce_randomization_changes_ciphertext() {
        let cipher = test_cipher();
        let a = cipher.encrypt("same key").unwrap();
        let b = cipher.encrypt("same key").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_key_fails_closed() {
        let stored = test_cipher().encrypt("sk-or-v1-secret").unwrap();
        let other = SecretCipher::new([9u8; KEY_LEN]);
        assert!(matches!(
            other.decrypt(&stored),
            Err(CipherError::Decrypt)
        ));
    }

    #[test]
    fn tampered_ciphertext_rejected() {
        let cipher = test_cipher();
        let stored = cipher.encrypt("sk-or-v1-secret").unwrap();
        let mut raw = general_purpose::STANDARD.decode(&stored).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let tampered = general_purpose::STANDARD.encode(raw);
        assert!(matches!(
            cipher.decrypt(&tampered),
            Err(CipherError::Decrypt)
        ));
    }

    #[test]
    fn malformed_value_rejected() {
        let cipher = test_cipher();
        assert!(cipher.decrypt("not base64 at all!").is_err());
        assert!(cipher.decrypt("c2hvcnQ=").is_err()); // shorter than a nonce
    }

    #[test]
    fn base64_key_parsing() {
        let encoded = general_purpose::STANDARD.encode([3u8; KEY_LEN]);
        let cipher = SecretCipher::from_base64(&encoded).unwrap();
        let stored = cipher.encrypt("k").unwrap();
        assert_eq!(cipher.decrypt(&stored).unwrap().as_str(), "k");

        assert!(matches!(
            SecretCipher::from_base64("@@@"),
            Err(CipherError::KeyInvalid(_))
        ));
        let short = general_purpose::STANDARD.encode([1u8; 16]);
        assert!(matches!(
            SecretCipher::from_base64(&short),
            Err(CipherError::KeyInvalid(_))
        ));
    }
}
