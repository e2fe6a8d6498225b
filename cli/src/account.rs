//! On-chain private metadata account
//!
//! Borsh layout:
//! key (u8) | mint (32) | elgamal_pk (32) | encrypted_cipher_key (vec of 64-byte chunks) | uri (string)

use async_trait::async_trait;
use borsh::{BorshDeserialize, BorshSerialize};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};
use thiserror::Error;
use tracing::debug;

use private_metadata::{
    ElGamalPubkey, EncryptedChunk, FetchFailed, PrivateMetadataRecord, RecordProvider,
};

/// Account discriminator for private metadata (v1)
pub const PRIVATE_METADATA_KEY: u8 = 1;

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct PrivateMetadataAccount {
    pub key: u8,
    pub mint: [u8; 32],
    pub elgamal_pk: [u8; 32],
    pub encrypted_cipher_key: Vec<[u8; 64]>,
    pub uri: String,
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Account data is not a private metadata account: {0}")]
    Malformed(#[from] std::io::Error),

    #[error("Unexpected account key {0}")]
    WrongKey(u8),

    #[error("Account holds an invalid ElGamal public key")]
    InvalidPubkey,
}

impl PrivateMetadataAccount {
    /// Decode account data, tolerating trailing zero padding
    pub fn decode(data: &[u8]) -> Result<Self, AccountError> {
        let mut cursor = data;
        let account = Self::deserialize(&mut cursor)?;
        if account.key != PRIVATE_METADATA_KEY {
            return Err(AccountError::WrongKey(account.key));
        }
        Ok(account)
    }

    pub fn mint(&self) -> Pubkey {
        Pubkey::new_from_array(self.mint)
    }

    pub fn into_record(self) -> Result<PrivateMetadataRecord, AccountError> {
        let pubkey = ElGamalPubkey::from_bytes(&self.elgamal_pk).ok_or(AccountError::InvalidPubkey)?;
        let chunks = self
            .encrypted_cipher_key
            .into_iter()
            .map(EncryptedChunk::from)
            .collect();
        Ok(PrivateMetadataRecord::new(self.uri, chunks).with_elgamal_pubkey(pubkey))
    }
}

/// Reads private metadata accounts over JSON-RPC
pub struct RpcRecordProvider {
    client: RpcClient,
}

impl RpcRecordProvider {
    pub fn new(rpc_url: &str) -> Self {
        Self {
            client: RpcClient::new_with_commitment(rpc_url.to_string(), CommitmentConfig::confirmed()),
        }
    }

    /// Raw decoded account, for display
    pub async fn account(&self, address: &Pubkey) -> Result<Option<PrivateMetadataAccount>, FetchFailed> {
        let response = self
            .client
            .get_account_with_commitment(address, CommitmentConfig::confirmed())
            .await
            .map_err(|e| FetchFailed::new(address.to_string(), e))?;

        let Some(account) = response.value else {
            return Ok(None);
        };
        debug!(%address, len = account.data.len(), "fetched private metadata account");

        PrivateMetadataAccount::decode(&account.data)
            .map(Some)
            .map_err(|e| FetchFailed::new(address.to_string(), e))
    }
}

#[async_trait]
impl RecordProvider for RpcRecordProvider {
    async fn record(&self, address: &[u8; 32]) -> Result<Option<PrivateMetadataRecord>, FetchFailed> {
        let address = Pubkey::new_from_array(*address);
        match self.account(&address).await? {
            Some(account) => account
                .into_record()
                .map(Some)
                .map_err(|e| FetchFailed::new(address.to_string(), e)),
            None => Ok(None),
        }
    }
}
