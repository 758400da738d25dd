use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

const LOG_FILE: &str = "support-gtk.log";

/// Strips a file path down to the part below `src/`.
fn simplify_file_path(file_path: &str) -> &str {
    match file_path.rfind("src/") {
        Some(pos) => &file_path[pos..],
        None => file_path,
    }
}

fn get_level(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "ERROR",
        log::Level::Warn => "WARN ",
        log::Level::Info => "INFO ",
        log::Level::Debug => "DEBUG",
        log::Level::Trace => "TRACE",
    }
}

pub fn console_log_formatter(
    out: fern::FormatCallback,
    message: &std::fmt::Arguments,
    record: &log::Record,
) {
    out.finish(format_args!(
        "{}[{}] {} {}",
        chrono::Local::now().format("%H:%M:%S%.3f "),
        get_level(record.level()),
        record.target(),
        message,
    ))
}

pub fn file_log_formatter(
    out: fern::FormatCallback,
    message: &std::fmt::Arguments,
    record: &log::Record,
) {
    out.finish(format_args!(
        "{}[{}] {} {}:{} {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f "),
        get_level(record.level()),
        record.target(),
        simplify_file_path(record.file().unwrap_or("")),
        record.line().unwrap_or(0),
        message
    ))
}

/// Installs the global logger: console on stderr, plus a file when `log_dir` is given.
///
/// Dependency crates are capped at `Warn` so zbus does not flood the output.
pub fn setup_logger(level: log::LevelFilter, log_dir: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    let mut dispatcher = fern::Dispatch::new()
        .level(log::LevelFilter::Warn)
        .level_for("catalog", level)
        .level_for("support_gtk", level)
        .chain(
            fern::Dispatch::new()
                .format(console_log_formatter)
                .chain(std::io::stderr()),
        );

    let mut file_path = None;
    if let Some(dir) = log_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
        let path = dir.join(LOG_FILE);
        let file = fern::log_file(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        dispatcher = dispatcher.chain(
            fern::Dispatch::new()
                .format(file_log_formatter)
                .chain(file),
        );
        file_path = Some(path);
    }

    dispatcher
        .apply()
        .context("A global logger is already installed")?;
    Ok(file_path)
}
