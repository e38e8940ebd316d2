// src/logger.rs

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use time::{OffsetDateTime, UtcOffset, format_description};
use tracing::{Level, subscriber::set_global_default};
use tracing_subscriber::{FmtSubscriber, fmt::time::OffsetTime, fmt::writer::BoxMakeWriter};

use crate::error::HarnessError;

pub enum LogTarget {
    Stderr,
    /// A timestamped `*_log.txt` file inside this directory.
    File(PathBuf),
}

/// Installs the global tracing subscriber. Returns the log file path when
/// logging to a file.
pub fn init_logger(target: LogTarget, level: Level) -> Result<Option<PathBuf>, HarnessError> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let timer_format = format_description::parse("[year]-[month]-[day] [hour]:[minute]:[second]")
        .map_err(|e| HarnessError::Config(format!("log time format: {e}")))?;
    let timer = OffsetTime::new(offset, timer_format);

    let (writer, ansi, path) = match target {
        LogTarget::Stderr => (BoxMakeWriter::new(std::io::stderr), true, None),
        LogTarget::File(dir) => {
            std::fs::create_dir_all(&dir).map_err(|e| HarnessError::io(&dir, e))?;
            let path = dir.join(log_file_name()?);
            let file = File::create(&path).map_err(|e| HarnessError::io(&path, e))?;
            (BoxMakeWriter::new(Mutex::new(file)), false, Some(path))
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_ansi(ansi)
        .with_timer(timer)
        .with_writer(writer)
        .finish();

    set_global_default(subscriber)
        .map_err(|e| HarnessError::Config(format!("tracing subscriber already set: {e}")))?;
    Ok(path)
}

fn log_file_name() -> Result<String, HarnessError> {
    let format = format_description::parse("[year]-[month]-[day]_[hour]-[minute]-[second]_log.txt")
        .map_err(|e| HarnessError::Config(format!("log file name format: {e}")))?;
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(&format)
        .map_err(|e| HarnessError::Config(format!("log file name: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_names_are_timestamped() {
        let name = log_file_name().unwrap();
        assert!(name.ends_with("_log.txt"));
        assert_eq!(name.len(), "2024-01-01_00-00-00_log.txt".len());
        assert!(!name.contains(':'));
    }
}
