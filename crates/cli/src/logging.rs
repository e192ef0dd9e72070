use anyhow::Result;
use examkit_core::StateDir;
use examkit_core::tracing::{InstrumentationConfig, LogFormat, init_tracing};
use tracing::Level;

/// Initialize logging for the CLI
///
/// Events go to stderr and, unless disabled, are appended to `cli.log` in
/// the state directory's log folder.
pub fn init_logging(
    log_level: Level,
    state_dir: &StateDir,
    json: bool,
    no_file_log: bool,
) -> Result<()> {
    let mut config = InstrumentationConfig::from_env();

    // RUST_LOG still wins inside init_tracing; this is the fallback level
    config.log_level = log_level.as_str().to_lowercase();

    if json {
        config.format = LogFormat::Json;
    }

    if !no_file_log {
        config.log_file = Some(state_dir.logs_dir().join("cli.log"));
    }

    init_tracing(&config)?;
    Ok(())
}
