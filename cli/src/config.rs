//! Configuration for the Janus CLI
//!
//! Values come from `~/.janus/config.json`, then CLI flags override them.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use private_metadata::PipelineConfig;

/// Default directory for Janus configuration
const JANUS_DIR: &str = ".janus";
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";

/// Seed prefix of the private metadata account address
pub const METADATA_SEED: &[u8] = b"metadata";

/// On-disk configuration; every field optional
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct JanusConfig {
    pub rpc_url: Option<String>,
    /// Private metadata program id (base58)
    pub program_id: Option<String>,
    /// Path to the Solana wallet keypair file
    pub keypair_path: Option<String>,
    /// log2 of the baby-step table size
    pub baby_step_bits: Option<u32>,
    pub parallel_workers: Option<usize>,
}

/// Flags given on the command line
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub rpc_url: Option<String>,
    pub program_id: Option<String>,
    pub keypair: Option<String>,
}

/// Fully resolved settings for one command
#[derive(Debug, Clone)]
pub struct Settings {
    pub rpc_url: String,
    pub program_id: Option<Pubkey>,
    pub keypair_path: PathBuf,
    pub pipeline: PipelineConfig,
}

impl Settings {
    pub fn resolve(file: JanusConfig, overrides: Overrides) -> Result<Self> {
        let rpc_url = overrides
            .rpc_url
            .or(file.rpc_url)
            .unwrap_or_else(|| DEFAULT_RPC_URL.to_string());

        let program_id = match overrides.program_id.or(file.program_id) {
            Some(id) => Some(
                id.parse::<Pubkey>()
                    .with_context(|| format!("Invalid program id: {}", id))?,
            ),
            None => None,
        };

        let keypair_path = match overrides.keypair.or(file.keypair_path) {
            Some(path) => PathBuf::from(path),
            None => default_keypair_path()?,
        };

        let mut pipeline = PipelineConfig::default();
        if let Some(bits) = file.baby_step_bits {
            let range = PipelineConfig::BABY_STEP_BITS_RANGE;
            if !range.contains(&bits) {
                bail!(
                    "baby_step_bits must be between {} and {}, got {}",
                    range.start(),
                    range.end(),
                    bits
                );
            }
            pipeline.baby_step_bits = bits;
        }
        if let Some(workers) = file.parallel_workers {
            pipeline.parallel_workers = workers;
        }

        Ok(Self {
            rpc_url,
            program_id,
            keypair_path,
            pipeline,
        })
    }

    pub fn require_program_id(&self) -> Result<Pubkey> {
        match self.program_id {
            Some(id) => Ok(id),
            None => bail!(
                "No private metadata program id configured. Pass --program-id or set program_id in {}",
                config_file().map(|p| p.display().to_string()).unwrap_or_else(|_| CONFIG_FILE.to_string())
            ),
        }
    }
}

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("Could not find home directory")
}

/// Get the Janus directory path
pub fn janus_dir() -> Result<PathBuf> {
    Ok(home_dir()?.join(JANUS_DIR))
}

/// Get the config file path
pub fn config_file() -> Result<PathBuf> {
    Ok(janus_dir()?.join(CONFIG_FILE))
}

/// Default Solana keypair location
pub fn default_keypair_path() -> Result<PathBuf> {
    Ok(home_dir()?.join(".config").join("solana").join("id.json"))
}

/// Load the config file; a missing file is an empty config
pub fn load_config() -> Result<JanusConfig> {
    load_config_from(&config_file()?)
}

pub fn load_config_from(path: &Path) -> Result<JanusConfig> {
    if !path.exists() {
        return Ok(JanusConfig::default());
    }

    let json = fs::read_to_string(path).context("Failed to read config file")?;
    let config = serde_json::from_str(&json).context("Failed to parse config file")?;
    Ok(config)
}

#[cfg(test)]
pub fn save_config_to(path: &Path, config: &JanusConfig) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).context("Failed to create config directory")?;
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json).context("Failed to write config file")?;
    Ok(())
}

/// Load Solana keypair from a JSON byte-array file
pub fn load_solana_keypair(path: &Path) -> Result<solana_sdk::signature::Keypair> {
    if !path.exists() {
        bail!(
            "Solana keypair not found at {:?}. Generate one with 'solana-keygen new' or specify path with --keypair",
            path
        );
    }

    let keypair_json = fs::read_to_string(path)?;
    let mut bytes: Vec<u8> = serde_json::from_str(&keypair_json)
        .context("Keypair file is not a JSON byte array")?;
    let keypair = solana_sdk::signature::Keypair::from_bytes(&bytes)
        .map_err(|e| anyhow::anyhow!("Invalid keypair file: {}", e));
    zeroize::Zeroize::zeroize(&mut bytes);

    keypair
}

/// Private metadata account address for a mint
pub fn private_metadata_address(mint: &Pubkey, program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[METADATA_SEED, mint.as_ref()], program_id).0
}

pub fn parse_mint(input: &str) -> Result<Pubkey> {
    input
        .trim()
        .parse::<Pubkey>()
        .with_context(|| format!("Failed to parse mint {}", input))
}
