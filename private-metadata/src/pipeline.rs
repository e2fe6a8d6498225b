//! Recovery pipeline
//!
//! Idle → SigningRequested → KeypairDerived → ChunksDecrypted →
//! PayloadFetched → PayloadDecrypted, or Failed from any step. Runs never
//! retry and never share state: each owns its signature, keypair and key,
//! all dropped (and zeroized) when the run ends.

use std::ops::RangeInclusive;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use zeroize::Zeroize;

use crate::chunks::{decrypt_chunks_parallel, EncryptedChunk, SymmetricKey};
use crate::collaborators::{FetchCollaborator, RecordProvider, SigningCollaborator};
use crate::discrete_log::{BabyStepGiantStep, DiscreteLog};
use crate::elgamal::{derive_keypair, ElGamalKeypair};
use crate::error::{DecryptionFailure, ErrorKind, PipelineError, Stage};
use crate::payload::{decrypt_payload, is_valid_key_len, Plaintext};
use crate::record::PrivateMetadataRecord;

/// Fixed label the wallet signs to re-derive the ElGamal secret key
pub const KEY_DERIVATION_MESSAGE: &[u8] = b"ElGamalSecretKey";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// log2 of the baby-step table size, within [`PipelineConfig::BABY_STEP_BITS_RANGE`].
    /// Memory grows with 2^bits and each search walks 2^(32 - bits) giant steps.
    pub baby_step_bits: u32,
    /// Threads used for chunk searches
    pub parallel_workers: usize,
}

impl PipelineConfig {
    /// Table sizes that stay within memory and keep a full search short
    pub const BABY_STEP_BITS_RANGE: RangeInclusive<u32> = 8..=24;
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            baby_step_bits: BabyStepGiantStep::DEFAULT_BABY_STEP_BITS,
            parallel_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    SigningRequested,
    KeypairDerived,
    ChunksDecrypted,
    PayloadFetched,
    PayloadDecrypted,
    Failed { stage: Stage, kind: ErrorKind },
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::PayloadDecrypted | Self::Failed { .. })
    }
}

/// State of one run, mirrored to the caller's progress callback
struct Run<P> {
    state: PipelineState,
    progress: P,
}

impl<P: FnMut(&PipelineState)> Run<P> {
    fn new(mut progress: P) -> Self {
        let state = PipelineState::Idle;
        progress(&state);
        Self { state, progress }
    }

    fn advance(&mut self, next: PipelineState) {
        debug!(from = ?self.state, to = ?next, "pipeline transition");
        self.state = next;
        (self.progress)(&self.state);
    }

    fn fail(&mut self, stage: Stage, kind: ErrorKind) -> PipelineError {
        warn!(%stage, error = %kind, "private metadata recovery failed");
        self.advance(PipelineState::Failed { stage, kind: kind.clone() });
        PipelineError::new(stage, kind)
    }
}

/// Ask the wallet to sign the derivation message and derive the keypair
pub async fn request_keypair<S>(signer: &S) -> Result<ElGamalKeypair, PipelineError>
where
    S: SigningCollaborator + ?Sized,
{
    let mut signature = signer
        .sign(KEY_DERIVATION_MESSAGE)
        .await
        .map_err(|_| PipelineError::new(Stage::Signing, ErrorKind::SigningRejected))?;

    let keypair = derive_keypair(&signature);
    signature.zeroize();
    keypair.map_err(|kind| PipelineError::new(Stage::KeyDerivation, kind))
}

/// Runs recoveries; must be polled inside a Tokio runtime, since chunk
/// searches go through `spawn_blocking`
pub struct Pipeline {
    recovery: Arc<dyn DiscreteLog>,
    workers: usize,
}

impl Pipeline {
    /// Builds the baby-step table up front; reuse the pipeline across runs
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            recovery: Arc::new(BabyStepGiantStep::new(config.baby_step_bits)),
            workers: config.parallel_workers.max(1),
        }
    }

    pub fn with_recovery(recovery: Arc<dyn DiscreteLog>, workers: usize) -> Self {
        Self {
            recovery,
            workers: workers.max(1),
        }
    }

    pub async fn recover_plaintext<S, F>(
        &self,
        record: &PrivateMetadataRecord,
        signer: &S,
        fetcher: &F,
    ) -> Result<Plaintext, PipelineError>
    where
        S: SigningCollaborator + ?Sized,
        F: FetchCollaborator + ?Sized,
    {
        self.recover_plaintext_with_progress(record, signer, fetcher, |_| {})
            .await
    }

    /// Like [`Pipeline::recover_plaintext`], reporting every state change
    #[instrument(skip_all, fields(uri = %record.uri, chunks = record.encrypted_cipher_key.len()))]
    pub async fn recover_plaintext_with_progress<S, F, P>(
        &self,
        record: &PrivateMetadataRecord,
        signer: &S,
        fetcher: &F,
        progress: P,
    ) -> Result<Plaintext, PipelineError>
    where
        S: SigningCollaborator + ?Sized,
        F: FetchCollaborator + ?Sized,
        P: FnMut(&PipelineState) + Send,
    {
        let mut run = Run::new(progress);

        run.advance(PipelineState::SigningRequested);
        let keypair = request_keypair(signer)
            .await
            .map_err(|err| run.fail(err.stage, err.kind))?;
        run.advance(PipelineState::KeypairDerived);

        if let Some(expected) = &record.elgamal_pubkey {
            if expected != keypair.pubkey() {
                return Err(run.fail(
                    Stage::ChunkDecryption,
                    ErrorKind::DecryptionFailed { reason: DecryptionFailure::KeypairMismatch },
                ));
            }
        }

        // Never search for a key the cipher would refuse
        let key_len = record.cipher_key_len();
        if !is_valid_key_len(key_len) {
            return Err(run.fail(
                Stage::ChunkDecryption,
                ErrorKind::InvalidKeyLength { actual: key_len },
            ));
        }

        let key = self
            .decrypt_cipher_key(keypair, record.encrypted_cipher_key.clone())
            .await
            .map_err(|kind| run.fail(Stage::ChunkDecryption, kind))?;
        run.advance(PipelineState::ChunksDecrypted);

        let payload = fetcher
            .fetch(&record.uri)
            .await
            .map_err(|err| run.fail(Stage::Fetch, ErrorKind::FetchFailed { reason: err.to_string() }))?;
        run.advance(PipelineState::PayloadFetched);

        let plaintext = decrypt_payload(key.as_bytes(), &payload)
            .map_err(|kind| run.fail(Stage::PayloadDecryption, kind))?;
        run.advance(PipelineState::PayloadDecrypted);

        info!(bytes = plaintext.len(), "recovered private metadata");
        Ok(plaintext)
    }

    /// Look the record up first, then run the pipeline
    pub async fn recover_from_provider<R, S, F>(
        &self,
        address: &[u8; 32],
        provider: &R,
        signer: &S,
        fetcher: &F,
    ) -> Result<Plaintext, PipelineError>
    where
        R: RecordProvider + ?Sized,
        S: SigningCollaborator + ?Sized,
        F: FetchCollaborator + ?Sized,
    {
        let record = match provider.record(address).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                return Err(PipelineError::new(
                    Stage::RecordLookup,
                    ErrorKind::FetchFailed {
                        reason: "no private metadata account at address".to_string(),
                    },
                ))
            }
            Err(err) => {
                return Err(PipelineError::new(
                    Stage::RecordLookup,
                    ErrorKind::FetchFailed { reason: err.to_string() },
                ))
            }
        };

        self.recover_plaintext(&record, signer, fetcher).await
    }

    /// Chunk searches are CPU-bound; keep them off the async workers
    async fn decrypt_cipher_key(
        &self,
        keypair: ElGamalKeypair,
        chunks: Vec<EncryptedChunk>,
    ) -> Result<SymmetricKey, ErrorKind> {
        let recovery = Arc::clone(&self.recovery);
        let workers = self.workers;

        tokio::task::spawn_blocking(move || {
            decrypt_chunks_parallel(&keypair, &chunks, recovery.as_ref(), workers)
        })
        .await
        .unwrap_or_else(|err| {
            warn!(error = %err, "chunk decryption task failed");
            Err(ErrorKind::DecryptionFailed { reason: DecryptionFailure::WorkerPanicked })
        })
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("search_bound", &self.recovery.bound())
            .field("workers", &self.workers)
            .finish()
    }
}
