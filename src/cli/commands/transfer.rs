//! transfer command - Serve the git-lfs custom transfer protocol

use std::sync::Arc;

use anyhow::{Context as _, Result};
use tokio::io::BufReader;

use crate::cli::Context;
use crate::credentials::GitCredentialHelper;
use crate::git::Git;
use crate::transfer::Processor;
use crate::webdav::WebDavConnector;

/// Run the transfer agent on stdin/stdout until `terminate`.
///
/// This is a synchronous wrapper that runs the event loop on a
/// current-thread runtime; requests are handled one at a time anyway.
pub fn transfer(ctx: &Context) -> Result<()> {
    // Repository problems are reported to git-lfs in the init response
    let repo = Git::new(ctx.cwd()?);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    rt.block_on(transfer_async(repo))
}

async fn transfer_async(repo: Git) -> Result<()> {
    let mut processor = Processor::new(
        Box::new(repo),
        Arc::new(WebDavConnector),
        Arc::new(GitCredentialHelper::new()),
    );

    let input = BufReader::new(tokio::io::stdin());
    let mut output = tokio::io::stdout();
    processor
        .run(input, &mut output)
        .await
        .context("Transfer protocol failed")
}
