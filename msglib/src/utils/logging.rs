/*
 * msgview - logging
 *
 * Copyright 2024 msgview contributors
 *
 * This file is part of msgview.
 *
 * msgview is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * msgview is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with msgview. If not, see <http://www.gnu.org/licenses/>.
 */

//! A [`log::Log`] implementation writing to a log file, and to stderr when
//! `MSGVIEW_DEBUG_STDERR` is set.

use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc, Mutex, PoisonError,
    },
};

use log::{LevelFilter, Log, Metadata, Record};

use crate::{
    error::Result,
    utils::{datetime, shellexpand::ShellExpandTrait},
};

/// Targets of dependencies that log too much to be useful.
const QUIET_TARGETS: &[&str] = &["polling", "async_io"];

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, PartialOrd, Serialize)]
#[repr(u8)]
pub enum LogLevel {
    OFF = 0,
    ERROR,
    WARN,
    #[default]
    INFO,
    DEBUG,
    TRACE,
}

impl From<u8> for LogLevel {
    fn from(verbosity: u8) -> Self {
        match verbosity {
            0 => Self::OFF,
            1 => Self::ERROR,
            2 => Self::WARN,
            3 => Self::INFO,
            4 => Self::DEBUG,
            _ => Self::TRACE,
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::OFF => Self::Off,
            LogLevel::ERROR => Self::Error,
            LogLevel::WARN => Self::Warn,
            LogLevel::INFO => Self::Info,
            LogLevel::DEBUG => Self::Debug,
            LogLevel::TRACE => Self::Trace,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

enum Sink {
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
    Stderr,
}

impl Sink {
    fn write_line(&mut self, line: &str) {
        _ = match self {
            Self::File { writer, .. } => writer
                .write_all(line.as_bytes())
                .and_then(|()| writer.flush()),
            Self::Stderr => std::io::stderr().write_all(line.as_bytes()),
        };
    }
}

/// The process-wide logger. Clones share the destination and level.
#[derive(Clone)]
pub struct StderrLogger {
    sink: Arc<Mutex<Sink>>,
    level: Arc<AtomicU8>,
    mirror_stderr: bool,
}

impl std::fmt::Debug for StderrLogger {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.debug_struct(stringify!(StderrLogger))
            .field("level", &self.log_level())
            .field("dest", &self.log_dest())
            .field("mirror_stderr", &self.mirror_stderr)
            .finish()
    }
}

impl Default for StderrLogger {
    fn default() -> Self {
        Self::new(LogLevel::default())
    }
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().append(true).create(true).open(path)
}

fn format_line(record: &Record) -> String {
    format!(
        "{} [{}]: {}: {}\n",
        datetime::timestamp_to_string(datetime::now(), None),
        record.level(),
        record.target(),
        record.args()
    )
}

impl StderrLogger {
    /// Create a logger and install it as the global [`log`] logger, the
    /// first time this is called in the process.
    ///
    /// Outside of tests the log file is `msgview.log` in the XDG data
    /// directory; if it cannot be opened, output goes to stderr.
    pub fn new(level: LogLevel) -> Self {
        use std::sync::Once;

        static INIT: Once = Once::new();

        let log_file = if cfg!(test) {
            None
        } else {
            xdg::BaseDirectories::with_prefix("msgview")
                .ok()
                .and_then(|dirs| dirs.place_data_file("msgview.log").ok())
                .and_then(|path| Some((open_log_file(&path).ok()?, path)))
        };
        let (sink, mirror_stderr) = match log_file {
            Some((file, path)) => (
                Sink::File {
                    writer: BufWriter::new(file),
                    path,
                },
                std::env::var_os("MSGVIEW_DEBUG_STDERR").is_some(),
            ),
            None => (Sink::Stderr, false),
        };
        let logger = Self {
            sink: Arc::new(Mutex::new(sink)),
            level: Arc::new(AtomicU8::new(level as u8)),
            mirror_stderr,
        };

        #[cfg(feature = "debug-tracing")]
        log::set_max_level(if matches!(level, LogLevel::OFF) {
            LevelFilter::Off
        } else {
            LevelFilter::Trace
        });
        #[cfg(not(feature = "debug-tracing"))]
        log::set_max_level(LevelFilter::from(level));

        INIT.call_once(|| {
            _ = log::set_boxed_logger(Box::new(logger.clone()));
        });
        logger
    }

    pub fn log_level(&self) -> LogLevel {
        self.level.load(Ordering::SeqCst).into()
    }

    pub fn set_log_level(&self, new_val: LogLevel) {
        self.level.store(new_val as u8, Ordering::SeqCst);
        log::set_max_level(LevelFilter::from(new_val));
    }

    /// Append to the file at `path` from now on.
    pub fn change_log_dest(&self, path: PathBuf) -> Result<()> {
        let path = path.expand();
        let file = open_log_file(&path)?;
        let mut sink = self.sink.lock()?;
        if let Sink::File { ref mut writer, .. } = *sink {
            _ = writer.flush();
        }
        *sink = Sink::File {
            writer: BufWriter::new(file),
            path,
        };
        Ok(())
    }

    /// The log file in use, or `None` when logging to stderr.
    pub fn log_dest(&self) -> Option<PathBuf> {
        match *self.sink.lock().unwrap_or_else(PoisonError::into_inner) {
            Sink::File { ref path, .. } => Some(path.clone()),
            Sink::Stderr => None,
        }
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= LevelFilter::from(self.log_level())
            && !QUIET_TARGETS
                .iter()
                .any(|t| metadata.target().starts_with(t))
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(record);
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        sink.write_line(&line);
        if self.mirror_stderr && matches!(*sink, Sink::File { .. }) {
            _ = std::io::stderr().write_all(line.as_bytes());
        }
    }

    fn flush(&self) {
        if let Sink::File { ref mut writer, .. } =
            *self.sink.lock().unwrap_or_else(PoisonError::into_inner)
        {
            _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use log::Level;
    use rusty_fork::rusty_fork_test;

    use super::*;

    #[test]
    fn test_logging_level_conversions() {
        assert_eq!(LogLevel::from(0), LogLevel::OFF);
        assert_eq!(LogLevel::from(4), LogLevel::DEBUG);
        assert_eq!(LogLevel::from(200), LogLevel::TRACE);
        assert_eq!(LevelFilter::from(LogLevel::OFF), LevelFilter::Off);
        assert_eq!(LogLevel::INFO.to_string(), "INFO");
        assert!(LogLevel::ERROR < LogLevel::TRACE);
    }

    #[test]
    fn test_logging_format_line() {
        let line = format_line(
            &Record::builder()
                .args(format_args!("fetch {} done", 7))
                .level(Level::Warn)
                .target("msglib::jobs")
                .build(),
        );
        assert!(line.ends_with(" [WARN]: msglib::jobs: fetch 7 done\n"));
    }

    rusty_fork_test! {
        #[test]
        fn test_logging_change_dest() {
            let tempdir = tempfile::tempdir().unwrap();
            let log_path = tempdir.path().join("msgview.log");
            let logger = StderrLogger::new(LogLevel::DEBUG);
            assert_eq!(logger.log_dest(), None);
            assert_eq!(logger.log_level(), LogLevel::DEBUG);
            logger.change_log_dest(log_path.clone()).unwrap();
            assert_eq!(logger.log_dest(), Some(log_path.clone()));
            log::debug!("written to the new destination");
            log::trace!("filtered out");
            log::debug!(target: "polling", "quiet dependency");
            log::logger().flush();
            let contents = std::fs::read_to_string(&log_path).unwrap();
            assert!(contents.contains("[DEBUG]: "));
            assert!(contents.contains("written to the new destination"));
            assert!(!contents.contains("filtered out"));
            assert!(!contents.contains("quiet dependency"));
            logger.set_log_level(LogLevel::OFF);
            assert_eq!(logger.log_level(), LogLevel::OFF);
        }
    }
}
