//! Private metadata recovery
//!
//! A private NFT asset is AES-CBC encrypted off chain. Its AES key sits on
//! chain, split into u32 words that are each twisted-ElGamal encrypted to a
//! key the owner's wallet can re-derive by signing a fixed message.
//!
//! Recovery runs in four steps:
//! 1. [`elgamal::derive_keypair`] - wallet signature to ElGamal keypair
//! 2. [`chunks::decrypt_chunks`] - encrypted words to the AES key
//! 3. [`payload::decrypt_payload`] - `iv || ciphertext` to plaintext
//! 4. [`pipeline::Pipeline`] - sequences the above around the wallet and
//!    asset host collaborators

// op_ref warnings are common with curve25519-dalek ergonomics
#![allow(clippy::op_ref)]

pub mod chunks;
pub mod collaborators;
pub mod discrete_log;
pub mod elgamal;
pub mod error;
pub mod payload;
pub mod pipeline;
pub mod record;

#[cfg(test)]
mod testing;


#[cfg(test)]
mod test_vectors;


pub use chunks::{EncryptedChunk, SymmetricKey};
pub use collaborators::{
    FetchCollaborator, FetchFailed, RecordProvider, SigningCollaborator, SigningRejected,
};
pub use discrete_log::{BabyStepGiantStep, DiscreteLog, LinearSearch};
pub use elgamal::{derive_keypair, ElGamalKeypair, ElGamalPubkey};
pub use error::{DecryptionFailure, ErrorKind, PipelineError, Stage};
pub use payload::{decrypt_payload, Plaintext};
pub use pipeline::{Pipeline, PipelineConfig, PipelineState, KEY_DERIVATION_MESSAGE};
pub use record::PrivateMetadataRecord;
