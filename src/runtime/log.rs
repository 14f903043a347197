use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use env_logger::{Builder, Target, WriteStyle};
use log::LevelFilter;

#[derive(Clone, Copy, Debug)]
pub struct LogLevel(pub LevelFilter);
impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s.to_lowercase().as_str() {
            "trace" => LevelFilter::Trace,
            "debug" => LevelFilter::Debug,
            "info" => LevelFilter::Info,
            "warn" | "warning" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            "off" | "none" => LevelFilter::Off,
            _ => return Err(format!("Invalid log level: {}", s)),
        };
        Ok(LogLevel(level))
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        level.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogMode {
    Both,
    Path,
    Terminal,
    Discard,
}
impl std::str::FromStr for LogMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mode = match s.to_lowercase().as_str() {
            "both" => LogMode::Both,
            "path" | "file" => LogMode::Path,
            "terminal" | "term" | "cli" => LogMode::Terminal,
            "discard" | "none" => LogMode::Discard,
            _ => return Err(format!("Invalid log mode: {}", s)),
        };
        Ok(mode)
    }
}

///////////////////////////////
/// Copies every log line to stdout and to a log file
struct TeeWriter {
    file: File,
}
impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        self.file.flush()
    }
}

fn open_log_file(log_path: &Path) -> anyhow::Result<File> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)
        .map_err(|e| {
            anyhow::anyhow!("Failed to open log file {}: {}", log_path.display(), e)
        })?;
    Ok(file)
}

///////////////////////////////
/// Install the process-wide logger. Lines look like `[timestamp] LEVEL: message`.
///
/// Only the first call in a process installs a logger; later calls are ignored,
/// which happens when several runs share one process
pub fn setup_global_logger(
    log_level: LogLevel,
    log_output: LogMode,
    log_path: &Path,
) -> anyhow::Result<()> {
    let (target, level) = match log_output {
        LogMode::Discard => (Target::Pipe(Box::new(io::sink())), LevelFilter::Off),
        LogMode::Terminal => (Target::Stdout, log_level.0),
        LogMode::Path => (Target::Pipe(Box::new(open_log_file(log_path)?)), log_level.0),
        LogMode::Both => {
            let file = open_log_file(log_path)?;
            (Target::Pipe(Box::new(TeeWriter { file })), log_level.0)
        }
    };

    let result = Builder::new()
        .filter_level(level)
        .write_style(WriteStyle::Never)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                buf.timestamp_seconds(),
                record.level(),
                record.args()
            )
        })
        .target(target)
        .try_init();

    if result.is_err() {
        log::debug!("Logger already installed; keeping the existing one");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        let level: LogLevel = "WARNING".parse().unwrap();
        assert_eq!(level.0, LevelFilter::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_parse_log_mode() {
        assert_eq!("file".parse::<LogMode>().unwrap(), LogMode::Path);
        assert_eq!("cli".parse::<LogMode>().unwrap(), LogMode::Terminal);
        assert_eq!("both".parse::<LogMode>().unwrap(), LogMode::Both);
        assert!("syslog".parse::<LogMode>().is_err());
    }
}
