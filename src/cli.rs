//! Command line interface for the fieldwire demo binary.
//!
//! Provides a small CLI that formats a sample authorization message and
//! prints its redacted wire image.

use clap::Parser;

/// Command line arguments for the `fieldwire` binary.
#[derive(Debug, Parser)]
#[command(name = "fieldwire", version, about = "Format a sample field message")]
pub struct Cli {
    /// Message header, four characters.
    #[arg(long, default_value = "0200")]
    pub header: String,

    /// Primary account number, formatted into field 2.
    #[arg(long, default_value = "4000000000000002")]
    pub pan: String,

    /// Processing code, formatted into field 3.
    #[arg(long, default_value = "000000")]
    pub processing_code: String,
}
