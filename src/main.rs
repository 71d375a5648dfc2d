use std::process::ExitCode;

fn main() -> ExitCode {
    match git_lfs_webdav::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            git_lfs_webdav::ui::output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
