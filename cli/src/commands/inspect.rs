//! Fetch and decode a private metadata account

use anyhow::{bail, Result};
use colored::Colorize;

use crate::account::RpcRecordProvider;
use crate::config::{parse_mint, private_metadata_address, Settings};

pub async fn run(settings: &Settings, mint: &str) -> Result<()> {
    let mint = parse_mint(mint)?;
    let program_id = settings.require_program_id()?;
    let address = private_metadata_address(&mint, &program_id);

    println!("{}", "Fetching private metadata account...".cyan());

    let provider = RpcRecordProvider::new(&settings.rpc_url);
    let Some(account) = provider.account(&address).await? else {
        bail!("No private metadata account at {} for mint {}", address, mint);
    };
    if account.mint() != mint {
        println!(
            "{}",
            format!("Warning: account is recorded for mint {}", account.mint()).red()
        );
    }

    let key_len = account.encrypted_cipher_key.len() * private_metadata::chunks::CHUNK_PLAINTEXT_LEN;

    println!();
    println!("{}", "Private Metadata".yellow().bold());
    println!();
    println!("  Account:       {}", address);
    println!("  Mint:          {}", account.mint());
    println!("  URI:           {}", account.uri);
    println!("  Chunks:        {}", account.encrypted_cipher_key.len());
    if private_metadata::payload::is_valid_key_len(key_len) {
        println!("  Cipher key:    {} bytes (AES-{})", key_len, key_len * 8);
    } else {
        println!("  Cipher key:    {} bytes {}", key_len, "(not a valid AES key size)".red());
    }
    println!("  ElGamal key:   {}", bs58::encode(account.elgamal_pk).into_string());

    Ok(())
}
