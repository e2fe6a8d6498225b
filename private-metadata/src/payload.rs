//! AES-CBC payload decryption
//!
//! Payload layout: `iv (16 bytes) || ciphertext`, PKCS#7 padded. The AES
//! variant follows the key length, so 16, 24 and 32 byte keys are accepted.

use std::fmt;

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::{Aes128, Aes192, Aes256};
use tracing::debug;
use zeroize::Zeroize;

use crate::error::ErrorKind;

/// Initialization vector prefix length
pub const IV_LEN: usize = 16;

/// AES block size
pub const BLOCK_LEN: usize = 16;

/// Key lengths for AES-128, AES-192 and AES-256
pub const AES_KEY_LENS: [usize; 3] = [16, 24, 32];

type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes192CbcDec = cbc::Decryptor<Aes192>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes192CbcEnc = cbc::Encryptor<Aes192>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;

pub fn is_valid_key_len(len: usize) -> bool {
    AES_KEY_LENS.contains(&len)
}

/// Decrypted asset bytes, zeroized on drop
pub struct Plaintext {
    bytes: Vec<u8>,
}

impl Plaintext {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Drop for Plaintext {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl fmt::Debug for Plaintext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Plaintext(<{} bytes>)", self.bytes.len())
    }
}

fn check_key(key: &[u8]) -> Result<(), ErrorKind> {
    if is_valid_key_len(key.len()) {
        Ok(())
    } else {
        Err(ErrorKind::InvalidKeyLength { actual: key.len() })
    }
}

/// Split off the IV and decrypt the body
pub fn decrypt_payload(key: &[u8], payload: &[u8]) -> Result<Plaintext, ErrorKind> {
    check_key(key)?;

    if payload.len() < IV_LEN {
        return Err(ErrorKind::InvalidPayloadLength { actual: payload.len() });
    }
    let (iv, body) = payload.split_at(IV_LEN);

    // CBC with PKCS#7 always emits at least one block
    if body.is_empty() || body.len() % BLOCK_LEN != 0 {
        return Err(ErrorKind::InvalidPayloadLength { actual: payload.len() });
    }

    debug!(key_len = key.len(), body_len = body.len(), "decrypting payload");

    let invalid_key = |_| ErrorKind::InvalidKeyLength { actual: key.len() };
    let decrypted = match key.len() {
        16 => Aes128CbcDec::new_from_slices(key, iv)
            .map_err(invalid_key)?
            .decrypt_padded_vec_mut::<Pkcs7>(body),
        24 => Aes192CbcDec::new_from_slices(key, iv)
            .map_err(invalid_key)?
            .decrypt_padded_vec_mut::<Pkcs7>(body),
        _ => Aes256CbcDec::new_from_slices(key, iv)
            .map_err(invalid_key)?
            .decrypt_padded_vec_mut::<Pkcs7>(body),
    };

    decrypted
        .map(|bytes| Plaintext { bytes })
        .map_err(|_| ErrorKind::PaddingError)
}

/// Encrypt `plaintext` and return `iv || ciphertext`
pub fn encrypt_payload(key: &[u8], iv: &[u8; IV_LEN], plaintext: &[u8]) -> Result<Vec<u8>, ErrorKind> {
    check_key(key)?;

    let invalid_key = |_| ErrorKind::InvalidKeyLength { actual: key.len() };
    let ciphertext = match key.len() {
        16 => Aes128CbcEnc::new_from_slices(key, iv)
            .map_err(invalid_key)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        24 => Aes192CbcEnc::new_from_slices(key, iv)
            .map_err(invalid_key)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        _ => Aes256CbcEnc::new_from_slices(key, iv)
            .map_err(invalid_key)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
    };

    let mut payload = Vec::with_capacity(IV_LEN + ciphertext.len());
    payload.extend_from_slice(iv);
    payload.extend_from_slice(&ciphertext);
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 16] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07,
        0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
    ];

    #[test]
    fn test_roundtrip_each_key_size() {
        let message = b"private image bytes";
        for len in AES_KEY_LENS {
            let key = vec![0x42u8; len];
            let payload = encrypt_payload(&key, &[7u8; IV_LEN], message).unwrap();
            let plaintext = decrypt_payload(&key, &payload).unwrap();
            assert_eq!(plaintext.as_bytes(), message);
        }
    }

    #[test]
    fn test_payload_layout() {
        let iv = [9u8; IV_LEN];
        let payload = encrypt_payload(&KEY, &iv, b"HELLO WORLD!!!!").unwrap();
        // 15 bytes pad to exactly one block
        assert_eq!(payload.len(), IV_LEN + BLOCK_LEN);
        assert_eq!(&payload[..IV_LEN], &iv);
    }

    #[test]
    fn test_empty_plaintext_is_one_padding_block() {
        let payload = encrypt_payload(&KEY, &[0u8; IV_LEN], b"").unwrap();
        assert_eq!(payload.len(), IV_LEN + BLOCK_LEN);
        assert!(decrypt_payload(&KEY, &payload).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_bad_key_lengths() {
        let payload = encrypt_payload(&KEY, &[0u8; IV_LEN], b"x").unwrap();
        for len in [0usize, 8, 15, 17, 20, 31, 33, 64] {
            assert_eq!(
                decrypt_payload(&vec![1u8; len], &payload).unwrap_err(),
                ErrorKind::InvalidKeyLength { actual: len }
            );
        }
    }

    #[test]
    fn test_rejects_short_payload() {
        for len in [0usize, 1, IV_LEN - 1] {
            assert_eq!(
                decrypt_payload(&KEY, &vec![0u8; len]).unwrap_err(),
                ErrorKind::InvalidPayloadLength { actual: len }
            );
        }
    }

    #[test]
    fn test_rejects_unaligned_or_empty_body() {
        assert_eq!(
            decrypt_payload(&KEY, &[0u8; IV_LEN]).unwrap_err(),
            ErrorKind::InvalidPayloadLength { actual: IV_LEN }
        );
        assert_eq!(
            decrypt_payload(&KEY, &[0u8; IV_LEN + 17]).unwrap_err(),
            ErrorKind::InvalidPayloadLength { actual: IV_LEN + 17 }
        );
    }

    #[test]
    fn test_wrong_key_never_yields_plaintext() {
        let message = b"0123456789abcdef0123456789abcdef";
        let payload = encrypt_payload(&KEY, &[3u8; IV_LEN], message).unwrap();

        let mut wrong = KEY;
        wrong[0] ^= 0x80;
        match decrypt_payload(&wrong, &payload) {
            Err(err) => assert_eq!(err, ErrorKind::PaddingError),
            Ok(plaintext) => assert_ne!(plaintext.as_bytes(), message),
        }
    }

    #[test]
    fn test_tampered_padding_block_is_padding_error() {
        // A full block of 0x10 encrypts to two blocks; the second is all padding
        let mut payload = encrypt_payload(&KEY, &[0u8; IV_LEN], &[0x10u8; 16]).unwrap();
        assert_eq!(payload.len(), IV_LEN + 2 * BLOCK_LEN);

        // Flipping the last byte of the first ciphertext block turns the final
        // padding byte into 0x00
        payload[IV_LEN + BLOCK_LEN - 1] ^= 0x10;
        assert_eq!(decrypt_payload(&KEY, &payload).unwrap_err(), ErrorKind::PaddingError);
    }
}
