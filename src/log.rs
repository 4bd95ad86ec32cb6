//! Logging for planning runs.
//!
//! Messages go to the console (errors and warnings on stderr, everything else on stdout) and, for
//! the `run` command, to a pair of log files in the output folder. The level comes from the
//! `IMES_LOG_LEVEL` environment variable, then `settings.toml`, then [`DEFAULT_LOG_LEVEL`].
use anyhow::{Context, Result, bail, ensure};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback, Output};
use log::{LevelFilter, Record};
use std::env;
use std::fmt::Arguments;
use std::fs::File;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::OnceLock;

/// Set once the global logger has been installed
static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// The environment variable which overrides the log level
pub const LOG_LEVEL_ENV_VAR: &str = "IMES_LOG_LEVEL";

/// The log level used when neither `IMES_LOG_LEVEL` nor `settings.toml` gives one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Log file for progress messages (info and below)
const LOG_INFO_FILE_NAME: &str = "imes_info.log";

/// Log file for warnings and errors
const LOG_ERROR_FILE_NAME: &str = "imes_error.log";

/// Whether the program logger has been initialised
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Initialise the program logger.
///
/// Accepted levels are `off`, `error`, `warn`, `info`, `debug` and `trace` (case-insensitive).
/// At `debug` and above the solver also prints its own progress.
///
/// # Arguments
///
/// * `log_level_from_settings`: The log level specified in `settings.toml`
/// * `log_file_path`: Folder in which to create log files. No files are written if `None`.
pub fn init(log_level_from_settings: Option<&str>, log_file_path: Option<&Path>) -> Result<()> {
    ensure!(!is_logger_initialised(), "Logger already initialised");

    let log_level = match env::var(LOG_LEVEL_ENV_VAR) {
        Ok(level) => parse_log_level(&level)
            .with_context(|| format!("Invalid value for {LOG_LEVEL_ENV_VAR}"))?,
        Err(_) => parse_log_level(log_level_from_settings.unwrap_or(DEFAULT_LOG_LEVEL))?,
    };

    let mut dispatch = Dispatch::new()
        .chain(console_dispatch(
            std::io::stdout().is_terminal(),
            log_level,
            true,
            std::io::stdout(),
        ))
        .chain(console_dispatch(
            std::io::stderr().is_terminal(),
            log_level.min(LevelFilter::Warn),
            false,
            std::io::stderr(),
        ));

    if let Some(dir) = log_file_path {
        let info_file = create_log_file(dir, LOG_INFO_FILE_NAME)?;
        let error_file = create_log_file(dir, LOG_ERROR_FILE_NAME)?;
        dispatch = dispatch
            .chain(file_dispatch(log_level.max(LevelFilter::Info), true, info_file))
            .chain(file_dispatch(LevelFilter::Warn, false, error_file));
    }

    dispatch.apply()?;
    let _ = LOGGER_INIT.set(());

    Ok(())
}

/// Convert a log level string to a [`LevelFilter`]
fn parse_log_level(log_level: &str) -> Result<LevelFilter> {
    Ok(match log_level.trim().to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {unknown}"),
    })
}

/// Create (or truncate) a log file in `dir`
fn create_log_file(dir: &Path, file_name: &str) -> Result<File> {
    let path = dir.join(file_name);
    File::create(&path).with_context(|| format!("Could not create log file {}", path.display()))
}

/// A dispatch for one console stream.
///
/// If `progress_only` is set, warnings and errors are filtered out (they go to stderr instead).
fn console_dispatch<T: Into<Output>>(
    use_colour: bool,
    level: LevelFilter,
    progress_only: bool,
    stream: T,
) -> Dispatch {
    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);

    Dispatch::new()
        .filter(move |metadata| !progress_only || metadata.level() > LevelFilter::Warn)
        .format(move |out, message, record| {
            if use_colour {
                write_record(out, colours.color(record.level()), record, message);
            } else {
                write_record(out, record.level(), record, message);
            }
        })
        .level(level)
        .chain(stream)
}

/// A dispatch writing plain text to a log file
fn file_dispatch(level: LevelFilter, progress_only: bool, file: File) -> Dispatch {
    Dispatch::new()
        .filter(move |metadata| !progress_only || metadata.level() > LevelFilter::Warn)
        .format(|out, message, record| write_record(out, record.level(), record, message))
        .level(level)
        .chain(file)
}

/// Write a single log line: `[time level target] message`
fn write_record<L: std::fmt::Display>(
    out: FormatCallback,
    level: L,
    record: &Record,
    message: &Arguments,
) {
    let timestamp = Local::now().format("%H:%M:%S");
    out.finish(format_args!(
        "[{timestamp} {level} {}] {message}",
        record.target()
    ));
}
