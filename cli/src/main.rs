//! Janus CLI - Recover private NFT metadata with your Solana wallet

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod account;
mod commands;
mod config;
mod fetch;
mod wallet;


use commands::*;
use config::{load_config, Overrides, Settings};

#[derive(Parser)]
#[command(name = "janus")]
#[command(author = "Janus Team")]
#[command(version = "0.1.0")]
#[command(about = "Decrypt private NFT metadata bound to your Solana wallet")]
#[command(long_about = r#"
Janus recovers the encrypted asset behind a private NFT.

The asset's AES key is stored on chain, ElGamal encrypted to a key that
only the owner's wallet can re-derive. Janus asks the wallet to sign a
fixed message, re-derives that key, decrypts the AES key and then the
asset.

Quick Start:
  1. janus address <MINT>                 Locate the private metadata account
  2. janus inspect <MINT>                 Show what the account holds
  3. janus derive-key <MINT>              Check your wallet can decrypt it
  4. janus decrypt <MINT> --out asset.png Recover the asset
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Solana RPC URL (default: devnet, or rpc_url from ~/.janus/config.json)
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Path to keypair file
    #[arg(long, global = true)]
    keypair: Option<String>,

    /// Private metadata program id
    #[arg(long, global = true)]
    program_id: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the private metadata account address for a mint
    Address {
        /// NFT mint address
        mint: String,
    },

    /// Fetch and decode the private metadata account for a mint
    Inspect {
        /// NFT mint address
        mint: String,
    },

    /// Sign with your wallet and show the derived ElGamal public key
    DeriveKey {
        /// NFT mint address
        mint: String,
    },

    /// Decrypt the private asset and write it to a file
    Decrypt {
        /// NFT mint address
        mint: String,

        /// Where to write the decrypted asset
        #[arg(short, long)]
        out: PathBuf,

        /// Fetch the encrypted asset from here instead of the recorded uri
        #[arg(long)]
        uri: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let overrides = Overrides {
        rpc_url: cli.rpc_url,
        program_id: cli.program_id,
        keypair: cli.keypair,
    };
    let settings = Settings::resolve(load_config()?, overrides)?;

    match cli.command {
        Commands::Address { mint } => {
            address::run(&settings, &mint)?;
        }
        Commands::Inspect { mint } => {
            inspect::run(&settings, &mint).await?;
        }
        Commands::DeriveKey { mint } => {
            derive_key::run(&settings, &mint).await?;
        }
        Commands::Decrypt { mint, out, uri } => {
            decrypt::run(
                &settings,
                decrypt::DecryptOptions {
                    mint: &mint,
                    out: &out,
                    uri,
                },
            )
            .await?;
        }
    }

    Ok(())
}
