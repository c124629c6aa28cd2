// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Reversible encryption for single string fields.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyInit};
use base64ct::{Base64, Encoding};

type Aes256EcbEnc = ecb::Encryptor<aes::Aes256>;
type Aes256EcbDec = ecb::Decryptor<aes::Aes256>;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// Errors raised while encrypting or decrypting a field.
///
/// Callers must propagate these. A field that fails to decrypt is never
/// replaced by an empty or default value.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("ciphertext is not valid base64")]
    InvalidBase64,

    #[error("ciphertext could not be decrypted with the configured key")]
    Decrypt,

    #[error("decrypted field is not valid UTF-8")]
    InvalidUtf8,
}

/// Symmetric codec applied to sensitive fields at the persistence boundary.
///
/// The key is derived once from the configured passphrase and never changes
/// for the lifetime of the process. `FieldCipher` is shared through `Arc` and
/// handed to every repository that stores an encrypted column.
#[derive(Clone)]
pub struct FieldCipher {
    key: [u8; KEY_LEN],
}

impl FieldCipher {
    /// Build a cipher from a passphrase.
    ///
    /// The UTF-8 bytes of the passphrase are zero-padded or truncated to
    /// exactly 32 bytes and used directly as the AES-256 key.
    pub fn new(passphrase: &str) -> Self {
        Self {
            key: derive_key(passphrase),
        }
    }

    /// Encrypt an optional field. `None` and `""` pass through unchanged.
    pub fn encrypt(&self, plaintext: Option<&str>) -> Result<Option<String>, CipherError> {
        plaintext.map(|p| self.encrypt_str(p)).transpose()
    }

    /// Decrypt an optional field. `None` and `""` pass through unchanged.
    pub fn decrypt(&self, ciphertext: Option<&str>) -> Result<Option<String>, CipherError> {
        ciphertext.map(|c| self.decrypt_str(c)).transpose()
    }

    /// Encrypt a present field value.
    pub fn encrypt_str(&self, plaintext: &str) -> Result<String, CipherError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }
        let encrypted =
            Aes256EcbEnc::new(&self.key.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        Ok(Base64::encode_string(&encrypted))
    }

    /// Decrypt a present field value.
    pub fn decrypt_str(&self, ciphertext: &str) -> Result<String, CipherError> {
        if ciphertext.is_empty() {
            return Ok(String::new());
        }
        let raw = Base64::decode_vec(ciphertext).map_err(|_| CipherError::InvalidBase64)?;
        let decrypted = Aes256EcbDec::new(&self.key.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&raw)
            .map_err(|_| {
                tracing::error!("field decryption failed");
                CipherError::Decrypt
            })?;
        String::from_utf8(decrypted).map_err(|_| CipherError::InvalidUtf8)
    }
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCipher").finish_non_exhaustive()
    }
}

fn derive_key(passphrase: &str) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    let bytes = passphrase.as_bytes();
    let len = bytes.len().min(KEY_LEN);
    key[..len].copy_from_slice(&bytes[..len]);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> FieldCipher {
        FieldCipher::new("test-passphrase")
    }

    #[test]
    fn decrypt_inverts_encrypt() {
        let cipher = cipher();
        for plaintext in ["123456789", "a", "exactly-sixteen!", "ünïcødé ssn 987-65-4321"] {
            let encrypted = cipher.encrypt_str(plaintext).unwrap();
            assert_ne!(encrypted, plaintext);
            assert_eq!(cipher.decrypt_str(&encrypted).unwrap(), plaintext);
        }
    }

    #[test]
    fn none_and_empty_pass_through() {
        let cipher = cipher();
        assert_eq!(cipher.encrypt(None).unwrap(), None);
        assert_eq!(cipher.decrypt(None).unwrap(), None);
        assert_eq!(cipher.encrypt(Some("")).unwrap(), Some(String::new()));
        assert_eq!(cipher.decrypt(Some("")).unwrap(), Some(String::new()));
    }

    #[test]
    fn matches_legacy_ciphertext() {
        // AES-256-ECB/PKCS#7 of "123456789" under the zero-padded passphrase.
        assert_eq!(
            cipher().encrypt_str("123456789").unwrap(),
            "BQy5FGfilq5tMO3iWIEPCw=="
        );
        assert_eq!(
            cipher().decrypt_str("BQy5FGfilq5tMO3iWIEPCw==").unwrap(),
            "123456789"
        );
    }

    #[test]
    fn encryption_is_deterministic() {
        let cipher = cipher();
        assert_eq!(
            cipher.encrypt_str("123456789").unwrap(),
            cipher.encrypt_str("123456789").unwrap()
        );
    }

    #[test]
    fn key_is_zero_padded_and_truncated() {
        let short = derive_key("abc");
        assert_eq!(&short[..3], b"abc");
        assert!(short[3..].iter().all(|b| *b == 0));

        let long = "k".repeat(40);
        assert_eq!(derive_key(&long), [b'k'; KEY_LEN]);

        // Only the first 32 bytes matter.
        let a = FieldCipher::new(&format!("{}{}", "x".repeat(32), "tail-one"));
        let b = FieldCipher::new(&format!("{}{}", "x".repeat(32), "tail-two"));
        assert_eq!(a.encrypt_str("secret").unwrap(), b.encrypt_str("secret").unwrap());
    }

    #[test]
    fn wrong_key_fails_instead_of_returning_garbage() {
        let encrypted = cipher().encrypt_str("123456789").unwrap();
        let other = FieldCipher::new("another-passphrase");
        assert!(matches!(
            other.decrypt_str(&encrypted),
            Err(CipherError::Decrypt) | Err(CipherError::InvalidUtf8)
        ));
    }

    #[test]
    fn corrupt_ciphertext_is_rejected() {
        let cipher = cipher();
        assert_eq!(
            cipher.decrypt_str("not base64!!"),
            Err(CipherError::InvalidBase64)
        );
        // Valid base64, but not a whole number of AES blocks.
        assert_eq!(cipher.decrypt_str("AAAA"), Err(CipherError::Decrypt));
    }
}
