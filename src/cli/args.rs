//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--cwd <path>`: Run as if started in that directory
//! - `--debug`: Enable debug logging on stderr
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// git-lfs custom transfer agent storing objects on a WebDAV server
#[derive(Parser, Debug)]
#[command(name = "git-lfs-webdav")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if git-lfs-webdav was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Register this program as the repository's LFS transfer agent
    Init {
        /// WebDAV URL to store in .lfsconfig (http/https)
        url: Option<String>,
    },

    /// Store login credentials for the URL in .lfsconfig
    Login,

    /// Run the transfer protocol on stdin/stdout (invoked by git-lfs)
    Transfer,

    /// Print the version
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_init_with_and_without_url() {
        let cli = Cli::try_parse_from(["git-lfs-webdav", "init"]).unwrap();
        assert_eq!(cli.command, Command::Init { url: None });

        let cli =
            Cli::try_parse_from(["git-lfs-webdav", "init", "https://dav.example.com/lfs"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Init {
                url: Some("https://dav.example.com/lfs".into())
            }
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["git-lfs-webdav", "transfer", "--debug", "--cwd", "/repo"])
            .unwrap();
        assert_eq!(cli.command, Command::Transfer);
        assert!(cli.debug);
        assert_eq!(cli.cwd, Some(PathBuf::from("/repo")));
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(Cli::try_parse_from(["git-lfs-webdav", "upload"]).is_err());
        assert!(Cli::try_parse_from(["git-lfs-webdav"]).is_err());
    }
}
