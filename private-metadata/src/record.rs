//! Decoded private metadata record

use crate::chunks::{EncryptedChunk, CHUNK_PLAINTEXT_LEN};
use crate::elgamal::ElGamalPubkey;

/// What the pipeline needs from the on-chain private metadata account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateMetadataRecord {
    /// Where the encrypted asset lives
    pub uri: String,
    /// The AES key, one ElGamal ciphertext per big-endian u32 word
    pub encrypted_cipher_key: Vec<EncryptedChunk>,
    /// Public key the chunks were encrypted to, when the record carries it
    pub elgamal_pubkey: Option<ElGamalPubkey>,
}

impl PrivateMetadataRecord {
    pub fn new(uri: impl Into<String>, encrypted_cipher_key: Vec<EncryptedChunk>) -> Self {
        Self {
            uri: uri.into(),
            encrypted_cipher_key,
            elgamal_pubkey: None,
        }
    }

    pub fn with_elgamal_pubkey(mut self, pubkey: ElGamalPubkey) -> Self {
        self.elgamal_pubkey = Some(pubkey);
        self
    }

    /// Length in bytes of the key the chunks decrypt to
    pub fn cipher_key_len(&self) -> usize {
        self.encrypted_cipher_key.len() * CHUNK_PLAINTEXT_LEN
    }
}
