//! Log output in the `timestamp [LEVEL] - message` format.

use chrono::{DateTime, Local};
use env_logger::Builder;
use failure::Error;
use log::{Level, LevelFilter};
use std::env;
use std::fmt::Display;
use std::io::Write;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Set up the global logger. This should be called exactly once, right at
/// the start of `main()`.
///
/// `INFO` and above are shown by default, each `-v` turns the verbosity up a
/// notch, and `RUST_LOG` has the final say.
pub fn initialize(verbosity: u64) -> Result<(), Error> {
    let mut builder = Builder::new();

    let level = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    builder.filter(Some("repo_archiver"), level);

    if let Ok(filter) = env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    }

    builder.format(|out, record| {
        writeln!(
            out,
            "{}",
            format_line(&Local::now(), record.level(), record.args())
        )
    });

    builder.try_init()?;

    Ok(())
}

/// The name printed for each log level.
pub fn level_label(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARNING",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

pub fn format_line<M: Display>(timestamp: &DateTime<Local>, level: Level, message: M) -> String {
    format!(
        "{} [{}] - {}",
        timestamp.format(TIMESTAMP_FORMAT),
        level_label(level),
        message
    )
}
