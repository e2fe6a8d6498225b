//! Re-derive the ElGamal keypair from a wallet signature

use anyhow::Result;
use colored::Colorize;

use private_metadata::pipeline::request_keypair;

use crate::account::RpcRecordProvider;
use crate::config::{load_solana_keypair, parse_mint, private_metadata_address, Settings};
use crate::wallet::WalletSigner;

pub async fn run(settings: &Settings, mint: &str) -> Result<()> {
    let mint = parse_mint(mint)?;
    let keypair = load_solana_keypair(&settings.keypair_path)?;
    let signer = WalletSigner::new(keypair, mint);

    let elgamal = request_keypair(&signer).await?;
    let pubkey = bs58::encode(elgamal.pubkey().to_bytes()).into_string();

    println!();
    println!("{}", "Derived ElGamal Key".yellow().bold());
    println!();
    println!("  Wallet:     {}", signer.wallet());
    println!("  Mint:       {}", mint);
    println!("  Public key: {}", pubkey);
    println!("  Hex:        {}", hex::encode(elgamal.pubkey().to_bytes()));

    // Compare against the record when a program is configured
    if let Some(program_id) = settings.program_id {
        let address = private_metadata_address(&mint, &program_id);
        let provider = RpcRecordProvider::new(&settings.rpc_url);
        println!();
        match provider.account(&address).await {
            Ok(Some(account)) if account.elgamal_pk == elgamal.pubkey().to_bytes() => {
                println!("{}", "Matches the on-chain record.".green());
            }
            Ok(Some(_)) => {
                println!(
                    "{}",
                    "Does NOT match the on-chain record. This wallet cannot decrypt it.".red()
                );
            }
            Ok(None) => {
                println!("{}", format!("No private metadata account at {}", address).dimmed());
            }
            Err(e) => {
                println!("{}", format!("Could not fetch record: {}", e).dimmed());
            }
        }
    }

    Ok(())
}
