use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use log::{LevelFilter, SetLoggerError, info};
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

use crate::eval::MatchResult;

/// Log target for match records; the only target written to the match log.
pub const MATCH_TARGET: &str = "override_trigger::matches";

/// ~/.local/share/override-trigger/matches.log
pub fn match_log_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(Path::new(&home).join(".local/share/override-trigger/matches.log"))
}

/// Open the match log for appending, creating its directory.
/// Best-effort: any failure yields `None`.
fn open_match_log(path: &Path) -> Option<File> {
    if let Some(dir) = path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}

/// Install the global logger: stderr at `level`, plus the match log when
/// `log_matches` is set and the file can be opened.
pub fn init(level: LevelFilter, log_matches: bool) -> Result<(), SetLoggerError> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        term_config(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    if log_matches
        && let Some(file) = match_log_path().as_deref().and_then(open_match_log)
    {
        loggers.push(WriteLogger::new(LevelFilter::Info, match_log_config(), file));
    }

    CombinedLogger::init(loggers)
}

/// stderr gets everything except match records.
fn term_config() -> simplelog::Config {
    ConfigBuilder::new()
        .add_filter_ignore_str(MATCH_TARGET)
        .build()
}

/// The match log gets only match records.
fn match_log_config() -> simplelog::Config {
    ConfigBuilder::new()
        .add_filter_allow_str(MATCH_TARGET)
        .set_time_format_rfc3339()
        .build()
}

/// Emit one match record: tab-separated source, reason, signature, and the
/// rendered sentence collapsed onto a single line.
pub fn log_match(result: &MatchResult, rendered: &str) {
    info!(target: MATCH_TARGET, "{}", match_record(result, rendered));
}

fn match_record(result: &MatchResult, rendered: &str) -> String {
    let oneline = rendered.replace('\n', " ");
    let summary: String = oneline.chars().take(400).collect();
    format!(
        "{}\t{}\t{}\t{}",
        result.source.as_str(),
        result.reason.as_str(),
        result.signature,
        summary
    )
}
