use std::{
    env, io,
    path::{Path, PathBuf},
};

use tracing_subscriber::{EnvFilter, fmt};

use crate::CliResult;

/// Root directory for saved surveys and submissions when `--out` is absent.
pub const OUTPUT_DIR_ENV: &str = "SURVEY_OUTPUT_DIR";
/// Log filter directive, e.g. `survey_spec=debug`.
pub const LOG_ENV: &str = "SURVEY_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

/// Logs go to stderr so prompts on stdout stay readable.
pub fn init_tracing() -> CliResult<()> {
    let directive = env::var(LOG_ENV).unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
    let filter =
        EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .try_init()
        .map_err(|err| err.to_string())?;
    Ok(())
}

pub fn resolve_output_root(out: Option<PathBuf>) -> CliResult<PathBuf> {
    let candidate = out
        .or_else(|| env::var_os(OUTPUT_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    if candidate.as_os_str().is_empty() {
        return Err("output directory cannot be empty".into());
    }
    if !has_writable_ancestor(&candidate) {
        return Err(format!("output directory '{}' is not writable", candidate.display()).into());
    }
    Ok(candidate)
}

// Missing directories are created later, so the nearest existing ancestor decides.
fn has_writable_ancestor(target: &Path) -> bool {
    let absolute = if target.is_absolute() {
        target.to_path_buf()
    } else {
        match env::current_dir() {
            Ok(cwd) => cwd.join(target),
            Err(_) => return false,
        }
    };
    absolute
        .ancestors()
        .find(|path| path.exists())
        .and_then(|path| path.metadata().ok())
        .is_some_and(|metadata| metadata.is_dir() && !metadata.permissions().readonly())
}
