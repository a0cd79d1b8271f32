//! AES-256-GCM sealing for secret blobs at rest.

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use hookrun_core::{Error, Result};
use sha2::{Digest, Sha256};

const NONCE_LEN: usize = 12;

/// Seals and opens secret values. A sealed value is
/// `base64(nonce || ciphertext)` so it can live in a text column or file.
#[derive(Clone)]
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl SecretCipher {
    /// Create a cipher from a 32-byte key.
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)),
        }
    }

    /// Create from a master key string (hashed to 32 bytes).
    pub fn from_master_key(master_key: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(master_key.as_bytes());
        let key: [u8; 32] = hasher.finalize().into();
        Self::new(&key)
    }

    pub fn seal(&self, plaintext: &str) -> Result<String> {
        let nonce_bytes: [u8; NONCE_LEN] = rand::random();
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| Error::Internal(format!("Encryption failed: {}", e)))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(sealed))
    }

    pub fn open(&self, sealed: &str) -> Result<String> {
        let raw = STANDARD
            .decode(sealed.trim())
            .map_err(|e| Error::SecretUnavailable(format!("Corrupt sealed value: {}", e)))?;

        if raw.len() <= NONCE_LEN {
            return Err(Error::SecretUnavailable(
                "Corrupt sealed value: too short".to_string(),
            ));
        }

        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| Error::SecretUnavailable("Decryption failed".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|e| Error::SecretUnavailable(format!("Invalid UTF-8: {}", e)))
    }
}

/// Stable, filesystem-safe digest of a secret key.
pub fn key_digest(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_and_open() {
        let cipher = SecretCipher::from_master_key("test-master-key");
        let sealed = cipher.seal(r#"{"API_KEY":"abc"}"#).unwrap();

        assert!(!sealed.contains("API_KEY"));
        assert_eq!(cipher.open(&sealed).unwrap(), r#"{"API_KEY":"abc"}"#);
    }

    #[test]
    fn test_nonce_differs_per_seal() {
        let cipher = SecretCipher::from_master_key("k");
        assert_ne!(cipher.seal("same").unwrap(), cipher.seal("same").unwrap());
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = SecretCipher::from_master_key("one").seal("value").unwrap();
        let err = SecretCipher::from_master_key("two").open(&sealed).unwrap_err();
        assert!(matches!(err, Error::SecretUnavailable(_)));
    }

    #[test]
    fn test_key_digest_is_hex() {
        let digest = key_digest("8f1c1a0e-hash");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
