//! AES-256-GCM envelope for encrypted memory content.
//!
//! A [`MemoryCipher`] seals plaintext into a base64 envelope of
//! `nonce || ciphertext || tag` and opens it again. Decryption failures are
//! typed so callers can treat a tampered or wrong-key record as a per-record
//! soft failure rather than a pipeline fault.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::Engine;
use rand::RngCore;
use thiserror::Error;

/// Nonce length for AES-GCM (96 bits).
const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("encryption failed")]
    Encryption,
    #[error("decryption failed: invalid or tampered ciphertext")]
    Decryption,
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),
    #[error("invalid key: expected 32 bytes, got {0}")]
    InvalidKey(usize),
}

/// Symmetric cipher over memory content.
#[derive(Clone)]
pub struct MemoryCipher {
    key: [u8; 32],
}

impl MemoryCipher {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Build a cipher from a base64-encoded 32-byte key.
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidEnvelope(e.to_string()))?;
        let key: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidKey(bytes.len()))?;
        Ok(Self::new(key))
    }

    /// Build a cipher from the base64 key held in the named env var.
    pub fn from_env(var: &str) -> anyhow::Result<Self> {
        let encoded = std::env::var(var)
            .map_err(|_| anyhow::anyhow!("encryption key env var {var} is not set"))?;
        Ok(Self::from_base64(&encoded)?)
    }

    /// Generate a fresh random key, base64-encoded for storage in an env var.
    pub fn generate_key_base64() -> String {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        base64::engine::general_purpose::STANDARD.encode(key)
    }

    /// Encrypt plaintext into a base64 `nonce || ciphertext` envelope.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let cipher =
            Aes256Gcm::new_from_slice(&self.key).map_err(|_| CryptoError::Encryption)?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::Encryption)?;

        let mut envelope = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        envelope.extend_from_slice(&nonce_bytes);
        envelope.extend_from_slice(&ciphertext);
        Ok(base64::engine::general_purpose::STANDARD.encode(envelope))
    }

    /// Open a base64 envelope back into plaintext. Fails on tamper or wrong key.
    pub fn decrypt(&self, envelope: &str) -> Result<String, CryptoError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(envelope.trim())
            .map_err(|e| CryptoError::InvalidEnvelope(e.to_string()))?;

        if bytes.len() <= NONCE_LEN {
            return Err(CryptoError::InvalidEnvelope("envelope too short".into()));
        }
        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_LEN);

        let cipher =
            Aes256Gcm::new_from_slice(&self.key).map_err(|_| CryptoError::Decryption)?;
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CryptoError::Decryption)?;

        String::from_utf8(plaintext)
            .map_err(|_| CryptoError::InvalidEnvelope("plaintext is not UTF-8".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> MemoryCipher {
        MemoryCipher::new([42u8; 32])
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let c = cipher();
        let envelope = c.encrypt("met Sarah at the hackathon").unwrap();
        assert_ne!(envelope, "met Sarah at the hackathon");
        assert_eq!(c.decrypt(&envelope).unwrap(), "met Sarah at the hackathon");
    }

    #[test]
    fn nonces_are_unique_per_envelope() {
        let c = cipher();
        let a = c.encrypt("same text").unwrap();
        let b = c.encrypt("same text").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_key_fails() {
        let envelope = cipher().encrypt("secret").unwrap();
        let other = MemoryCipher::new([7u8; 32]);
        assert!(matches!(
            other.decrypt(&envelope),
            Err(CryptoError::Decryption)
        ));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let c = cipher();
        let envelope = c.encrypt("secret").unwrap();
        let mut bytes = base64::engine::general_purpose::STANDARD
            .decode(&envelope)
            .unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let tampered = base64::engine::general_purpose::STANDARD.encode(bytes);

        assert!(matches!(c.decrypt(&tampered), Err(CryptoError::Decryption)));
    }

    #[test]
    fn garbage_envelope_is_rejected() {
        let c = cipher();
        assert!(matches!(
            c.decrypt("not base64 at all!!!"),
            Err(CryptoError::InvalidEnvelope(_))
        ));
        assert!(matches!(
            c.decrypt("AAAA"),
            Err(CryptoError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn generated_keys_parse_back() {
        let encoded = MemoryCipher::generate_key_base64();
        let c = MemoryCipher::from_base64(&encoded).unwrap();
        let envelope = c.encrypt("round trip").unwrap();
        assert_eq!(c.decrypt(&envelope).unwrap(), "round trip");
    }

    #[test]
    fn short_keys_are_rejected() {
        let encoded = base64::engine::general_purpose::STANDARD.encode([1u8; 16]);
        assert!(matches!(
            MemoryCipher::from_base64(&encoded),
            Err(CryptoError::InvalidKey(16))
        ));
    }
}
