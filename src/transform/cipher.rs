//! AES-256-GCM column encryption.
//!
//! Stored layout is `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
//! Text columns keep the layout base64 encoded, binary columns keep it raw.

use crate::error::TransformError;
use crate::transform::ColumnTransform;
use crate::value::{DataType, Value};
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::Aes256Gcm;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// How plaintext is represented on the caller side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Payload {
    Text,
    Binary,
}

/// Non-deterministic AES-256-GCM transform keyed by a password and salt
#[derive(Clone)]
pub struct AesGcmEncryptor {
    key: [u8; 32],
    payload: Payload,
}

impl AesGcmEncryptor {
    /// Encryptor for varchar columns; ciphertext is stored as base64 text.
    pub fn new(password: &str, salt: &str) -> Self {
        Self {
            key: derive_key(password, salt),
            payload: Payload::Text,
        }
    }

    /// Encryptor for binary columns; ciphertext is stored as raw bytes.
    pub fn binary(password: &str, salt: &str) -> Self {
        Self {
            key: derive_key(password, salt),
            payload: Payload::Binary,
        }
    }

    /// Same key, plaintext handled as strings
    pub(crate) fn into_text(mut self) -> Self {
        self.payload = Payload::Text;
        self
    }

    /// Same key, plaintext handled as bytes
    pub(crate) fn into_binary(mut self) -> Self {
        self.payload = Payload::Binary;
        self
    }

    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, TransformError> {
        let cipher = Aes256Gcm::new(GenericArray::from_slice(&self.key));
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(GenericArray::from_slice(&nonce), plaintext)
            .map_err(|_| TransformError::Encryption)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, TransformError> {
        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(TransformError::Malformed(format!(
                "{} bytes is shorter than nonce and tag",
                sealed.len()
            )));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let cipher = Aes256Gcm::new(GenericArray::from_slice(&self.key));
        cipher
            .decrypt(GenericArray::from_slice(nonce), ciphertext)
            .map_err(|_| TransformError::Decryption)
    }
}

fn derive_key(password: &str, salt: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

impl fmt::Debug for AesGcmEncryptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesGcmEncryptor")
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}

impl ColumnTransform for AesGcmEncryptor {
    fn stored_type(&self) -> DataType {
        match self.payload {
            Payload::Text => DataType::Varchar,
            Payload::Binary => DataType::Binary,
        }
    }

    fn encode(&self, plain: &Value) -> Result<Value, TransformError> {
        let b64 = base64::engine::general_purpose::STANDARD;
        match (self.payload, plain) {
            (_, Value::Null) => Ok(Value::Null),
            (Payload::Text, Value::String(s)) => Ok(Value::String(b64.encode(self.seal(s.as_bytes())?))),
            (Payload::Binary, Value::Bytes(b)) => Ok(Value::Bytes(self.seal(b)?)),
            (Payload::Text, other) => Err(TransformError::UnsupportedInput {
                value: other.clone(),
                expected: "string",
            }),
            (Payload::Binary, other) => Err(TransformError::UnsupportedInput {
                value: other.clone(),
                expected: "bytes",
            }),
        }
    }

    fn decode(&self, stored: &Value) -> Result<Value, TransformError> {
        let b64 = base64::engine::general_purpose::STANDARD;
        match (self.payload, stored) {
            (_, Value::Null) => Ok(Value::Null),
            (Payload::Text, Value::String(s)) => {
                let sealed = b64
                    .decode(s)
                    .map_err(|e| TransformError::Malformed(format!("invalid base64: {e}")))?;
                let plain = self.open(&sealed)?;
                String::from_utf8(plain)
                    .map(Value::String)
                    .map_err(|e| TransformError::Malformed(format!("plaintext is not UTF-8: {e}")))
            }
            (Payload::Binary, Value::Bytes(b)) => Ok(Value::Bytes(self.open(b)?)),
            (Payload::Text, other) => Err(TransformError::UnsupportedInput {
                value: other.clone(),
                expected: "base64 string",
            }),
            (Payload::Binary, other) => Err(TransformError::UnsupportedInput {
                value: other.clone(),
                expected: "bytes",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_round_trip() -> anyhow::Result<()> {
        let enc = AesGcmEncryptor::new("passwd", "5c0744940b5c369b");
        let stored = enc.encode(&Value::from("testName"))?;
        assert!(matches!(stored, Value::String(_)));
        assert_ne!(stored, Value::from("testName"));
        assert_eq!(enc.decode(&stored)?, Value::from("testName"));
        Ok(())
    }

    #[test]
    fn test_binary_round_trip() -> anyhow::Result<()> {
        let enc = AesGcmEncryptor::binary("passwd", "5c0744940b5c369b");
        let stored = enc.encode(&Value::from(b"testCity".to_vec()))?;
        assert_eq!(enc.decode(&stored)?, Value::from(b"testCity".to_vec()));
        Ok(())
    }

    #[test]
    fn test_encryption_is_randomized() -> anyhow::Result<()> {
        let enc = AesGcmEncryptor::new("passwd", "salt");
        let a = enc.encode(&Value::from("same"))?;
        let b = enc.encode(&Value::from("same"))?;
        assert_ne!(a, b);
        Ok(())
    }

    #[test]
    fn test_null_passes_through() -> anyhow::Result<()> {
        let enc = AesGcmEncryptor::new("passwd", "salt");
        assert_eq!(enc.encode(&Value::Null)?, Value::Null);
        assert_eq!(enc.decode(&Value::Null)?, Value::Null);
        Ok(())
    }

    #[test]
    fn test_wrong_key_fails() -> anyhow::Result<()> {
        let stored = AesGcmEncryptor::new("passwd", "salt").encode(&Value::from("secret"))?;
        let other = AesGcmEncryptor::new("other", "salt");
        assert_eq!(other.decode(&stored), Err(TransformError::Decryption));
        Ok(())
    }

    #[test]
    fn test_corrupt_ciphertext() {
        let enc = AesGcmEncryptor::new("passwd", "salt");
        assert!(matches!(
            enc.decode(&Value::from("not base64!")),
            Err(TransformError::Malformed(_))
        ));
        assert!(matches!(
            enc.decode(&Value::from("AAAA")),
            Err(TransformError::Malformed(_))
        ));
        assert!(matches!(
            enc.encode(&Value::Int32(1)),
            Err(TransformError::UnsupportedInput { .. })
        ));
    }
}
