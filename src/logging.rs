use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

use crate::eval::Ruling;

/// Log target for per-request decision records.
pub const DECISION_TARGET: &str = "zonegate::decisions";

/// Default location of the decisions log.
pub const DEFAULT_LOG_PATH: &str = "~/.local/share/zonegate/decisions.log";

/// Expand `~` and environment variables in a user-supplied path.
pub fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => PathBuf::from(shellexpand::tilde(raw).into_owned()),
    }
}

/// Stderr logger settings. Decision records go only to the decisions log.
fn stderr_config() -> simplelog::Config {
    ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .add_filter_ignore_str(DECISION_TARGET)
        .build()
}

/// Install the global logger: stderr at `level`, plus decision records
/// appended to `decision_log` when given.
pub fn init(level: LevelFilter, decision_log: Option<&Path>) -> std::io::Result<()> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        stderr_config(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    if let Some(path) = decision_log {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let file_config = ConfigBuilder::new()
            .add_filter_allow_str(DECISION_TARGET)
            .set_time_format_rfc3339()
            .build();
        loggers.push(WriteLogger::new(LevelFilter::Info, file_config, file));
    }

    CombinedLogger::init(loggers).map_err(std::io::Error::other)
}

/// Emit one record per decision: `<verdict>\t<path>\t<reason>`.
pub fn log_decision(path: &str, ruling: &Ruling) {
    // Single-line record; paths are attacker-controlled so cap their length.
    let reason_oneline = ruling.reason.replace('\n', "; ");
    let path_truncated: String = path.chars().take(200).collect();
    log::info!(
        target: DECISION_TARGET,
        "{decision}\t{path}\t{reason}",
        decision = ruling.verdict.as_str(),
        path = path_truncated.escape_debug(),
        reason = reason_oneline,
    );
}
