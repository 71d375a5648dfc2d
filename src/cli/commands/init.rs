//! init command - Register git-lfs-webdav as the repository's transfer agent

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::core::endpoint;
use crate::git::{ConfigScope, Git, Repo, LFS_URL_KEY};
use crate::ui::output::{self, Verbosity};

/// Name the agent is registered under in git-lfs config.
pub const AGENT_NAME: &str = "webdav";

const AGENT_PATH_KEY: &str = "lfs.customtransfer.webdav.path";
const AGENT_ARGS_KEY: &str = "lfs.customtransfer.webdav.args";
const STANDALONE_AGENT_KEY: &str = "lfs.standalonetransferagent";

/// Register this executable with git-lfs and optionally store the URL.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `url` - WebDAV URL to write to `.lfsconfig`
pub fn init(ctx: &Context, url: Option<&str>) -> Result<()> {
    let git = Git::open(&ctx.cwd()?).context("Failed to open repository")?;
    let exe = std::env::current_exe().context("Failed to determine executable path")?;
    let verbosity = Verbosity::from_quiet(ctx.quiet);

    match register(&git, &exe, url)? {
        Some(masked) => output::print(
            format!("Successfully initialized LFS WebDAV with url {:?}!", masked),
            verbosity,
        ),
        None => {
            output::print("Successfully initialized LFS WebDAV!", verbosity);
            output::print(
                "If you have just cloned the repository run 'git reset --hard' to check out the LFS files.",
                verbosity,
            );
        }
    }
    Ok(())
}

/// Write the agent registration and, if given, the masked URL.
///
/// Returns the URL as stored in `.lfsconfig`.
pub(crate) fn register(repo: &dyn Repo, exe: &Path, url: Option<&str>) -> Result<Option<String>> {
    let exe = exe
        .to_str()
        .with_context(|| format!("Executable path {:?} is not valid UTF-8", exe))?;

    repo.config_set(&ConfigScope::Repository, AGENT_PATH_KEY, exe)?;
    repo.config_set(&ConfigScope::Repository, AGENT_ARGS_KEY, "transfer")?;
    repo.config_set(&ConfigScope::Repository, STANDALONE_AGENT_KEY, AGENT_NAME)?;
    tracing::debug!(exe, "registered custom transfer agent");

    let Some(url) = url else {
        return Ok(None);
    };
    let masked = endpoint::mask_scheme(url)?;
    repo.config_set(&ConfigScope::lfs_config(), LFS_URL_KEY, &masked)?;
    Ok(Some(masked))
}
