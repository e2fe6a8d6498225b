//! Recover and write the decrypted private asset

use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;

use private_metadata::{Pipeline, PipelineState, RecordProvider};

use crate::account::RpcRecordProvider;
use crate::config::{load_solana_keypair, parse_mint, private_metadata_address, Settings};
use crate::fetch::UriFetcher;
use crate::wallet::WalletSigner;

pub struct DecryptOptions<'a> {
    pub mint: &'a str,
    pub out: &'a Path,
    pub uri: Option<String>,
}

fn describe(state: &PipelineState) -> Option<&'static str> {
    match state {
        PipelineState::SigningRequested => Some("Requesting wallet signature..."),
        PipelineState::KeypairDerived => Some("Decrypting cipher key chunks..."),
        PipelineState::ChunksDecrypted => Some("Fetching encrypted asset..."),
        PipelineState::PayloadFetched => Some("Decrypting asset..."),
        _ => None,
    }
}

pub async fn run(settings: &Settings, options: DecryptOptions<'_>) -> Result<()> {
    let mint = parse_mint(options.mint)?;
    let program_id = settings.require_program_id()?;
    let address = private_metadata_address(&mint, &program_id);

    let keypair = load_solana_keypair(&settings.keypair_path)?;
    let signer = WalletSigner::new(keypair, mint);
    let fetcher = UriFetcher::new()?;
    let provider = RpcRecordProvider::new(&settings.rpc_url);

    println!("{}", "Fetching private metadata account...".cyan());
    let Some(mut record) = provider.record(&address.to_bytes()).await? else {
        bail!("No private metadata account at {} for mint {}", address, mint);
    };
    if let Some(uri) = options.uri {
        record.uri = uri;
    }

    println!("{}", "Building discrete log table...".cyan());
    let pipeline = Pipeline::new(&settings.pipeline);

    let plaintext = pipeline
        .recover_plaintext_with_progress(&record, &signer, &fetcher, |state| {
            if let Some(step) = describe(state) {
                println!("{}", step.cyan());
            }
        })
        .await?;

    std::fs::write(options.out, plaintext.as_bytes())
        .with_context(|| format!("Failed to write {}", options.out.display()))?;

    println!();
    println!("{}", "Private metadata decrypted!".green().bold());
    println!("  Wallet: {}", signer.wallet());
    println!("  Source: {}", record.uri);
    println!("  Output: {} ({} bytes)", options.out.display(), plaintext.len());

    Ok(())
}
