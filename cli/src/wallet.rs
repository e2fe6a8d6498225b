//! Wallet signer bound to one mint
//!
//! The derivation label is wrapped in a legacy Solana message, the way a
//! browser wallet is asked to sign it: one instruction whose program id is
//! the mint and whose data is the label, the wallet as fee payer, and an
//! all-zero recent blockhash. The message therefore differs per mint and is
//! fixed for a given wallet and mint.

use async_trait::async_trait;
use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    message::Message,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use tracing::{debug, warn};

use private_metadata::{SigningCollaborator, SigningRejected};

pub struct WalletSigner {
    keypair: Keypair,
    mint: Pubkey,
}

impl WalletSigner {
    pub fn new(keypair: Keypair, mint: Pubkey) -> Self {
        Self { keypair, mint }
    }

    pub fn wallet(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    /// Serialized message the wallet actually signs for `label`
    pub fn derivation_message(&self, label: &[u8]) -> Vec<u8> {
        derivation_message(&self.keypair.pubkey(), &self.mint, label)
    }
}

pub fn derivation_message(wallet: &Pubkey, mint: &Pubkey, label: &[u8]) -> Vec<u8> {
    let instruction = Instruction::new_with_bytes(*mint, label, vec![]);
    Message::new_with_blockhash(&[instruction], Some(wallet), &Hash::default()).serialize()
}

#[async_trait]
impl SigningCollaborator for WalletSigner {
    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SigningRejected> {
        let wrapped = self.derivation_message(message);
        debug!(wallet = %self.wallet(), mint = %self.mint, "signing key derivation message");

        match self.keypair.try_sign_message(&wrapped) {
            Ok(signature) => Ok(signature.as_ref().to_vec()),
            Err(e) => {
                warn!(error = %e, "wallet failed to sign");
                Err(SigningRejected)
            }
        }
    }
}
