//! In-memory collaborators and fixtures shared by the test modules

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::chunks::encrypt_chunks;
use crate::collaborators::{
    FetchCollaborator, FetchFailed, RecordProvider, SigningCollaborator, SigningRejected,
};
use crate::discrete_log::BabyStepGiantStep;
use crate::elgamal::{derive_keypair, SIGNATURE_LEN};
use crate::payload::{encrypt_payload, IV_LEN};
use crate::pipeline::Pipeline;
use crate::record::PrivateMetadataRecord;

/// Sixteen fixed bytes, repeated out to a full ed25519 signature
pub const S1_SEED: [u8; 16] = [
    0x10, 0x32, 0x54, 0x76, 0x98, 0xba, 0xdc, 0xfe,
    0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef,
];

pub fn signature_s1() -> Vec<u8> {
    S1_SEED.iter().copied().cycle().take(SIGNATURE_LEN).collect()
}

/// Key words used by the scenario tests: 1000, 2000, 3000, 4000
pub fn scenario_key() -> Vec<u8> {
    [1000u32, 2000, 3000, 4000]
        .iter()
        .flat_map(|word| word.to_be_bytes())
        .collect()
}

pub const SCENARIO_MESSAGE: &[u8] = b"HELLO WORLD!!!!";
pub const SCENARIO_URI: &str = "https://assets.example/private.png.enc";

/// Searches [0, 2^16); enough for every fixture word
pub fn test_pipeline() -> Pipeline {
    Pipeline::with_recovery(Arc::new(BabyStepGiantStep::with_bound(8, 16)), 2)
}

/// Record + payload for `key` encrypted to the keypair derived from `signature`
pub fn fixture(signature: &[u8], key: &[u8], message: &[u8]) -> (PrivateMetadataRecord, Vec<u8>) {
    let keypair = derive_keypair(signature).unwrap();
    let chunks = encrypt_chunks(keypair.pubkey(), key).unwrap();
    let payload = encrypt_payload(key, &[0u8; IV_LEN], message).unwrap();
    (PrivateMetadataRecord::new(SCENARIO_URI, chunks), payload)
}

pub struct FixedSigner {
    pub signature: Vec<u8>,
    pub calls: AtomicUsize,
}

impl FixedSigner {
    pub fn new(signature: Vec<u8>) -> Self {
        Self { signature, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl SigningCollaborator for FixedSigner {
    async fn sign(&self, _message: &[u8]) -> Result<Vec<u8>, SigningRejected> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.signature.clone())
    }
}

pub struct RejectingSigner;

#[async_trait]
impl SigningCollaborator for RejectingSigner {
    async fn sign(&self, _message: &[u8]) -> Result<Vec<u8>, SigningRejected> {
        Err(SigningRejected)
    }
}

/// Never answers, like a wallet popup the user walked away from
pub struct PendingSigner;

#[async_trait]
impl SigningCollaborator for PendingSigner {
    async fn sign(&self, _message: &[u8]) -> Result<Vec<u8>, SigningRejected> {
        std::future::pending::<()>().await;
        Err(SigningRejected)
    }
}

#[derive(Default)]
pub struct MemoryFetcher {
    pub objects: HashMap<String, Vec<u8>>,
    pub calls: AtomicUsize,
}

impl MemoryFetcher {
    pub fn with(uri: &str, bytes: Vec<u8>) -> Self {
        let mut objects = HashMap::new();
        objects.insert(uri.to_string(), bytes);
        Self { objects, calls: AtomicUsize::new(0) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FetchCollaborator for MemoryFetcher {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, FetchFailed> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.objects
            .get(uri)
            .cloned()
            .ok_or_else(|| FetchFailed::new(uri, "404 Not Found"))
    }
}

/// Fetch that never completes, like a stalled asset host
#[derive(Default)]
pub struct PendingFetcher {
    pub calls: AtomicUsize,
}

impl PendingFetcher {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FetchCollaborator for PendingFetcher {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, FetchFailed> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending::<()>().await;
        Err(FetchFailed::new(uri, "unreachable"))
    }
}

#[derive(Default)]
pub struct MemoryRecords {
    pub records: HashMap<[u8; 32], PrivateMetadataRecord>,
}

#[async_trait]
impl RecordProvider for MemoryRecords {
    async fn record(&self, address: &[u8; 32]) -> Result<Option<PrivateMetadataRecord>, FetchFailed> {
        Ok(self.records.get(address).cloned())
    }
}
