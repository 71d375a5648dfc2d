//! version command - Print the version

use anyhow::Result;

/// Print the crate version on stdout.
pub fn version() -> Result<()> {
    println!("{}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
