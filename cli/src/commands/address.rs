//! Display the private metadata account address for a mint

use anyhow::Result;
use colored::Colorize;

use crate::config::{parse_mint, private_metadata_address, Settings};

pub fn run(settings: &Settings, mint: &str) -> Result<()> {
    let mint = parse_mint(mint)?;
    let program_id = settings.require_program_id()?;
    let address = private_metadata_address(&mint, &program_id);

    println!();
    println!("{}", "Private Metadata Account".yellow().bold());
    println!();
    println!("{}", address);
    println!();
    println!("{}:", "Derived from".dimmed());
    println!("  Mint:    {}", mint);
    println!("  Program: {}", program_id);

    Ok(())
}
