//! CLI command implementations

pub mod address;
pub mod decrypt;
pub mod derive_key;
pub mod inspect;
