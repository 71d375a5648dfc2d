//! login command - Store credentials for the shared LFS URL
//!
//! The URL with credentials goes to the repository-local config only, so
//! it never ends up in the committed `.lfsconfig`.

use anyhow::{anyhow, Context as _, Result};

use crate::cli::Context;
use crate::core::endpoint;
use crate::git::{ConfigScope, Git, Repo, LFS_CONFIG_FILE, LFS_URL_KEY};
use crate::ui::output::{self, Verbosity};
use crate::ui::prompts;

/// What `login` did to the repository-local `lfs.url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LoginOutcome {
    /// A URL with user info was stored
    Stored,
    /// The override was removed; `.lfsconfig` applies
    Cleared,
}

/// Prompt for username and password and store them.
pub fn login(ctx: &Context) -> Result<()> {
    let git = Git::open(&ctx.cwd()?).context("Failed to open repository")?;
    let shared = shared_url(&git)?;
    let host = endpoint::host_of(&shared)?;

    let username = prompts::input(&format!("Username for {:?}: ", host))?;
    let password = prompts::password(&format!("Password for {:?}: ", host))?;

    let verbosity = Verbosity::from_quiet(ctx.quiet);
    match store_login(&git, &shared, &username, &password)? {
        LoginOutcome::Stored => output::print("Successfully set login credentials!", verbosity),
        LoginOutcome::Cleared => output::print("Successfully unset login credentials.", verbosity),
    }
    Ok(())
}

/// The `lfs.url` of `.lfsconfig`; the URL in the repository config may
/// already carry stale credentials.
pub(crate) fn shared_url(repo: &dyn Repo) -> Result<String> {
    repo.config_get(&ConfigScope::lfs_config(), LFS_URL_KEY)?
        .filter(|url| !url.is_empty())
        .ok_or_else(|| {
            anyhow!(
                "'{}' is not set in {}; run 'git-lfs-webdav init <url>' first",
                LFS_URL_KEY,
                LFS_CONFIG_FILE
            )
        })
}

/// Put `username`/`password` into `shared` and store or clear the
/// repository-local override.
pub(crate) fn store_login(
    repo: &dyn Repo,
    shared: &str,
    username: &str,
    password: &str,
) -> Result<LoginOutcome> {
    let personal = endpoint::with_user_info(shared, username, password)?;

    if personal != shared {
        repo.config_set(&ConfigScope::Repository, LFS_URL_KEY, &personal)?;
        tracing::debug!(url = %endpoint::redact(&personal), "stored login url");
        Ok(LoginOutcome::Stored)
    } else {
        repo.config_unset(&ConfigScope::Repository, LFS_URL_KEY)?;
        tracing::debug!("cleared login url");
        Ok(LoginOutcome::Cleared)
    }
}
