//! Payload Encryption
//!
//! Request and response payloads are exchanged with the processor as
//! AES-256-CBC ciphertext under a shared merchant key. The IV is not
//! random and not transmitted: both ends derive it as the first 16
//! bytes of the key, so a given key and plaintext always produce the
//! same ciphertext. Keys of 16 bytes are zero-padded to the full
//! 32-byte AES-256 key, matching the OpenSSL behaviour the processor
//! relies on. Both derivations must be reproduced exactly for wire
//! compatibility.

use base64::{engine::general_purpose, Engine};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::error::CryptoError;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Shortest accepted encryption key, in bytes.
pub const MIN_KEY_LENGTH: usize = 16;

/// The key length operators are asked to supply.
pub const CANONICAL_KEY_LENGTH: usize = 32;

const IV_LENGTH: usize = 16;

/// Symmetric codec for the processor's payload envelope.
#[derive(Clone)]
pub struct PayloadCodec {
    key: [u8; CANONICAL_KEY_LENGTH],
    iv: [u8; IV_LENGTH],
}

impl PayloadCodec {
    /// Build a codec from the merchant encryption key.
    ///
    /// The key must be exactly 16 or 32 bytes.
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != MIN_KEY_LENGTH && key.len() != CANONICAL_KEY_LENGTH {
            return Err(CryptoError::KeyLength(key.len()));
        }

        let mut padded = [0u8; CANONICAL_KEY_LENGTH];
        padded[..key.len()].copy_from_slice(key);

        let mut iv = [0u8; IV_LENGTH];
        iv.copy_from_slice(&key[..IV_LENGTH]);

        Ok(Self { key: padded, iv })
    }

    /// Encrypt a plaintext payload, returning base64 ciphertext.
    pub fn encrypt(&self, plaintext: &str) -> String {
        let encryptor = Aes256CbcEnc::new(&self.key.into(), &self.iv.into());
        let ciphertext = encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        general_purpose::STANDARD.encode(ciphertext)
    }

    /// Decrypt a base64 ciphertext payload.
    ///
    /// Any decode failure is fatal for the request; the codec never
    /// hands garbage back to the caller.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
        let raw = general_purpose::STANDARD.decode(ciphertext)?;
        let decryptor = Aes256CbcDec::new(&self.key.into(), &self.iv.into());
        let plaintext = decryptor
            .decrypt_padded_vec_mut::<Pkcs7>(&raw)
            .map_err(|_| CryptoError::Decrypt)?;
        Ok(String::from_utf8(plaintext)?)
    }
}

impl std::fmt::Debug for PayloadCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("PayloadCodec").finish_non_exhaustive()
    }
}
