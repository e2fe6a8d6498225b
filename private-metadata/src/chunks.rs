//! Cipher key chunks: a symmetric key split into u32 words, each word
//! ElGamal-encrypted on its own
//!
//! Word i covers key bytes 4i..4i+4, big-endian. Chunk order is part of the
//! key: reordering chunks produces a different key.

use std::fmt;
use std::thread;

use tracing::{debug, warn};
use zeroize::Zeroize;

use crate::discrete_log::DiscreteLog;
use crate::elgamal::{
    encrypt_u32, ElGamalCiphertext, ElGamalKeypair, ElGamalPubkey, ELGAMAL_CIPHERTEXT_LEN,
};
use crate::error::{DecryptionFailure, ErrorKind};

/// Byte length of one encrypted chunk
pub const CHUNK_LEN: usize = ELGAMAL_CIPHERTEXT_LEN;

/// Plaintext bytes carried by one chunk
pub const CHUNK_PLAINTEXT_LEN: usize = 4;

/// One encoded ElGamal ciphertext as stored on chain
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct EncryptedChunk(pub [u8; CHUNK_LEN]);

impl EncryptedChunk {
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; CHUNK_LEN] = bytes.try_into().ok()?;
        Some(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; CHUNK_LEN] {
        &self.0
    }
}

impl From<[u8; CHUNK_LEN]> for EncryptedChunk {
    fn from(bytes: [u8; CHUNK_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<ElGamalCiphertext> for EncryptedChunk {
    fn from(ciphertext: ElGamalCiphertext) -> Self {
        Self(ciphertext.to_bytes())
    }
}

impl fmt::Debug for EncryptedChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptedChunk({:02x?}..)", &self.0[..4])
    }
}

/// Recovered symmetric key bytes, zeroized on drop
pub struct SymmetricKey {
    bytes: Vec<u8>,
}

impl SymmetricKey {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

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

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymmetricKey(<{} bytes>)", self.bytes.len())
    }
}

/// Decrypt a single chunk to its u32 word
pub fn decrypt_chunk<R>(
    keypair: &ElGamalKeypair,
    index: usize,
    chunk: &EncryptedChunk,
    recovery: &R,
) -> Result<u32, DecryptionFailure>
where
    R: DiscreteLog + ?Sized,
{
    let ciphertext = ElGamalCiphertext::from_bytes(chunk.as_bytes())
        .ok_or(DecryptionFailure::MalformedChunk(index))?;
    let point = ciphertext.decrypt_to_point(keypair.secret());
    recovery
        .recover(&point)
        .ok_or(DecryptionFailure::OutOfRange(index))
}

/// Decrypt every chunk in order and concatenate the big-endian words
///
/// Any undecryptable chunk fails the whole key; no partial key is returned.
pub fn decrypt_chunks<R>(
    keypair: &ElGamalKeypair,
    chunks: &[EncryptedChunk],
    recovery: &R,
) -> Result<SymmetricKey, ErrorKind>
where
    R: DiscreteLog + ?Sized,
{
    debug!(chunks = chunks.len(), "decrypting cipher key chunks");

    let words = chunks
        .iter()
        .enumerate()
        .map(|(index, chunk)| decrypt_chunk(keypair, index, chunk, recovery));
    assemble_key(chunks.len(), words)
}

/// Same result as [`decrypt_chunks`], with the searches spread over
/// `workers` scoped threads
pub fn decrypt_chunks_parallel<R>(
    keypair: &ElGamalKeypair,
    chunks: &[EncryptedChunk],
    recovery: &R,
    workers: usize,
) -> Result<SymmetricKey, ErrorKind>
where
    R: DiscreteLog + ?Sized,
{
    let workers = workers.clamp(1, chunks.len().max(1));
    if workers == 1 {
        return decrypt_chunks(keypair, chunks, recovery);
    }

    debug!(chunks = chunks.len(), workers, "decrypting cipher key chunks in parallel");

    let per_worker = chunks.len().div_ceil(workers);
    let mut words: Vec<Result<u32, DecryptionFailure>> =
        vec![Err(DecryptionFailure::WorkerPanicked); chunks.len()];

    thread::scope(|scope| {
        let handles: Vec<_> = chunks
            .chunks(per_worker)
            .enumerate()
            .map(|(worker, group)| {
                let offset = worker * per_worker;
                scope.spawn(move || {
                    group
                        .iter()
                        .enumerate()
                        .map(|(i, chunk)| decrypt_chunk(keypair, offset + i, chunk, recovery))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        // Results are written back by index, so completion order is irrelevant
        for (worker, handle) in handles.into_iter().enumerate() {
            match handle.join() {
                Ok(results) => {
                    let offset = worker * per_worker;
                    for (i, result) in results.into_iter().enumerate() {
                        words[offset + i] = result;
                    }
                }
                Err(_) => warn!(worker, "chunk decryption worker panicked"),
            }
        }
    });

    assemble_key(chunks.len(), words)
}

fn assemble_key<I>(count: usize, words: I) -> Result<SymmetricKey, ErrorKind>
where
    I: IntoIterator<Item = Result<u32, DecryptionFailure>>,
{
    let mut bytes = Vec::with_capacity(count * CHUNK_PLAINTEXT_LEN);
    for word in words {
        match word {
            Ok(value) => bytes.extend_from_slice(&value.to_be_bytes()),
            Err(reason) => {
                bytes.zeroize();
                return Err(ErrorKind::DecryptionFailed { reason });
            }
        }
    }
    Ok(SymmetricKey::from_bytes(bytes))
}

/// Split `key` into big-endian words and encrypt each one under `pubkey`
pub fn encrypt_chunks(pubkey: &ElGamalPubkey, key: &[u8]) -> Result<Vec<EncryptedChunk>, ErrorKind> {
    if key.len() % CHUNK_PLAINTEXT_LEN != 0 {
        return Err(ErrorKind::InvalidKeyLength { actual: key.len() });
    }

    Ok(key
        .chunks_exact(CHUNK_PLAINTEXT_LEN)
        .map(|word| {
            let value = u32::from_be_bytes([word[0], word[1], word[2], word[3]]);
            EncryptedChunk::from(encrypt_u32(pubkey, value))
        })
        .collect())
}
