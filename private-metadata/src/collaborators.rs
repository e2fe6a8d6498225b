//! Interfaces to the wallet, the chain and the asset host
//!
//! Each call is an await point the pipeline suspends on. Dropping the
//! pipeline future while suspended cancels the run.

use async_trait::async_trait;
use thiserror::Error;

use crate::record::PrivateMetadataRecord;

/// The wallet declined (or failed) to produce a signature
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("signing request was rejected")]
pub struct SigningRejected;

/// A remote read did not produce bytes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to fetch {target}: {reason}")]
pub struct FetchFailed {
    pub target: String,
    pub reason: String,
}

impl FetchFailed {
    pub fn new(target: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            target: target.into(),
            reason: reason.to_string(),
        }
    }
}

/// Signs the key derivation message with the wallet key
///
/// Implementations must return identical bytes for identical messages, or
/// the derived keypair changes between runs.
#[async_trait]
pub trait SigningCollaborator: Send + Sync {
    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SigningRejected>;
}

/// Fetches the encrypted payload behind a record's uri
#[async_trait]
pub trait FetchCollaborator: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, FetchFailed>;
}

/// Looks up and decodes the private metadata record at an account address
///
/// `Ok(None)` means the account does not exist.
#[async_trait]
pub trait RecordProvider: Send + Sync {
    async fn record(&self, address: &[u8; 32]) -> Result<Option<PrivateMetadataRecord>, FetchFailed>;
}
