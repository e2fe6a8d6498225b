//! Error taxonomy for private metadata recovery
//!
//! Messages carry stage names, indices and lengths only. Key material,
//! signatures and plaintext never appear in an error.

use std::fmt;

use thiserror::Error;

/// Why the cipher key chunks could not be turned into a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecryptionFailure {
    #[error("chunk {0} is not a pair of valid Ristretto points")]
    MalformedChunk(usize),

    #[error("chunk {0} decrypts outside the discrete log search bound")]
    OutOfRange(usize),

    #[error("derived ElGamal public key does not match the record")]
    KeypairMismatch,

    #[error("chunk decryption worker panicked")]
    WorkerPanicked,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("Wallet declined to sign the key derivation message")]
    SigningRejected,

    #[error("Invalid signature length - expected {expected} bytes, got {actual}")]
    InvalidSignatureLength { expected: usize, actual: usize },

    #[error("Cipher key decryption failed - {reason}")]
    DecryptionFailed { reason: DecryptionFailure },

    #[error("Failed to fetch encrypted payload - {reason}")]
    FetchFailed { reason: String },

    #[error("Invalid symmetric key length - {actual} bytes is not an AES key size")]
    InvalidKeyLength { actual: usize },

    #[error("Invalid payload length - {actual} bytes")]
    InvalidPayloadLength { actual: usize },

    #[error("Invalid padding after decryption - the recovered key is probably wrong")]
    PaddingError,
}

impl ErrorKind {
    /// Only a declined signature is worth re-prompting the wallet for
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SigningRejected)
    }
}

/// The step of a recovery run that was in progress when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    RecordLookup,
    Signing,
    KeyDerivation,
    ChunkDecryption,
    Fetch,
    PayloadDecryption,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::RecordLookup => "record lookup",
            Stage::Signing => "signing",
            Stage::KeyDerivation => "key derivation",
            Stage::ChunkDecryption => "chunk decryption",
            Stage::Fetch => "payload fetch",
            Stage::PayloadDecryption => "payload decryption",
        };
        f.write_str(name)
    }
}

/// A failed recovery run, tagged with the stage it failed in
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} (during {stage})")]
pub struct PipelineError {
    pub stage: Stage,
    pub kind: ErrorKind,
}

impl PipelineError {
    pub fn new(stage: Stage, kind: ErrorKind) -> Self {
        Self { stage, kind }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }
}
