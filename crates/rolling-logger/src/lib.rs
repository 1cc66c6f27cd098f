//! Rolling File Logger
//!
//! Routes `tracing` events, and `log` records through the bridge, into
//! `<log_dir>/<app_name>.log`. When the file grows past `max_bytes` it is
//! rewritten keeping only the newest `keep_lines` lines. The most recent lines
//! are also held in an in-memory circular buffer so a host can show them
//! without touching the disk.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use chrono::Local;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;

const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024; // 5MB
const DEFAULT_KEEP_LINES: usize = 1000;
const DEFAULT_BUFFER_LINES: usize = 200;

static LOGGER: OnceLock<SharedRollingFile> = OnceLock::new();

/// Logger errors
#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("log file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("failed to install subscriber: {0}")]
    Subscriber(String),
    #[error("logger already initialized")]
    AlreadyInitialized,
    #[error("logger not initialized")]
    NotInitialized,
}

/// Tuning knobs for the rolling file
#[derive(Debug, Clone)]
pub struct LoggerOptions {
    /// Trim the file once it grows past this many bytes
    pub max_bytes: u64,
    /// Lines kept when the file is trimmed
    pub keep_lines: usize,
    /// Capacity of the in-memory circular buffer
    pub buffer_lines: usize,
    /// Most verbose level written
    pub level: log::LevelFilter,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            keep_lines: DEFAULT_KEEP_LINES,
            buffer_lines: DEFAULT_BUFFER_LINES,
            level: if cfg!(debug_assertions) {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            },
        }
    }
}

/// Log file with size-capped trimming and a ring buffer of recent lines
#[derive(Debug)]
pub struct RollingFile {
    path: PathBuf,
    max_bytes: u64,
    keep_lines: usize,
    buffer_lines: usize,
    recent: VecDeque<String>,
}

impl RollingFile {
    pub fn new(path: PathBuf, options: &LoggerOptions) -> Self {
        Self {
            path,
            max_bytes: options.max_bytes,
            keep_lines: options.keep_lines,
            buffer_lines: options.buffer_lines,
            recent: VecDeque::with_capacity(options.buffer_lines),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append formatted output, trimming the file first if it is too large
    pub fn append(&mut self, buf: &[u8]) -> io::Result<()> {
        self.trim_if_needed()?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(buf)?;

        for line in String::from_utf8_lossy(buf).lines() {
            if line.is_empty() {
                continue;
            }
            if self.buffer_lines == 0 {
                break;
            }
            if self.recent.len() == self.buffer_lines {
                self.recent.pop_front();
            }
            self.recent.push_back(line.to_string());
        }
        Ok(())
    }

    /// Most recent lines, oldest first
    pub fn recent_lines(&self) -> Vec<String> {
        self.recent.iter().cloned().collect()
    }

    fn trim_if_needed(&self) -> io::Result<()> {
        let len = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        if len <= self.max_bytes {
            return Ok(());
        }

        let lines: Vec<String> = BufReader::new(File::open(&self.path)?)
            .lines()
            .collect::<io::Result<_>>()?;
        let start = lines.len().saturating_sub(self.keep_lines);

        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        for line in &lines[start..] {
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }
}

/// Cloneable handle that hands one writer per event to the fmt layer
#[derive(Debug, Clone)]
pub struct SharedRollingFile(Arc<Mutex<RollingFile>>);

impl SharedRollingFile {
    pub fn new(file: RollingFile) -> Self {
        Self(Arc::new(Mutex::new(file)))
    }

    pub fn recent_lines(&self) -> Vec<String> {
        match self.0.lock() {
            Ok(file) => file.recent_lines(),
            Err(poisoned) => poisoned.into_inner().recent_lines(),
        }
    }
}

/// Per-event writer handed out by [`SharedRollingFile`]
#[derive(Debug)]
pub struct RollingWriter {
    inner: Arc<Mutex<RollingFile>>,
}

impl Write for RollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;
        file.append(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for SharedRollingFile {
    type Writer = RollingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RollingWriter {
            inner: Arc::clone(&self.0),
        }
    }
}

/// Local wall-clock timestamps
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

fn to_tracing_level(level: log::LevelFilter) -> LevelFilter {
    match level {
        log::LevelFilter::Off => LevelFilter::OFF,
        log::LevelFilter::Error => LevelFilter::ERROR,
        log::LevelFilter::Warn => LevelFilter::WARN,
        log::LevelFilter::Info => LevelFilter::INFO,
        log::LevelFilter::Debug => LevelFilter::DEBUG,
        log::LevelFilter::Trace => LevelFilter::TRACE,
    }
}

/// Initialize the global logger with default options
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str) -> Result<PathBuf, LoggerError> {
    init_logger_with(log_dir, app_name, LoggerOptions::default())
}

/// Initialize the global logger
///
/// Returns the path of the log file. Can only succeed once per process.
pub fn init_logger_with(
    log_dir: impl AsRef<Path>,
    app_name: &str,
    options: LoggerOptions,
) -> Result<PathBuf, LoggerError> {
    if LOGGER.get().is_some() {
        return Err(LoggerError::AlreadyInitialized);
    }

    let log_dir = log_dir.as_ref();
    fs::create_dir_all(log_dir)?;
    let path = log_dir.join(format!("{}.log", app_name));

    let shared = SharedRollingFile::new(RollingFile::new(path.clone(), &options));

    tracing_subscriber::fmt()
        .with_writer(shared.clone())
        .with_timer(LocalTimer)
        .with_ansi(false)
        .with_max_level(to_tracing_level(options.level))
        .try_init()
        .map_err(|e| LoggerError::Subscriber(e.to_string()))?;

    LOGGER
        .set(shared)
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    tracing::info!(app = app_name, "logger initialized at {}", path.display());
    Ok(path)
}

/// Recent lines from the circular buffer, oldest first
pub fn recent_lines() -> Result<Vec<String>, LoggerError> {
    LOGGER
        .get()
        .map(SharedRollingFile::recent_lines)
        .ok_or(LoggerError::NotInitialized)
}

pub fn info(message: &str) -> Result<(), LoggerError> {
    LOGGER.get().ok_or(LoggerError::NotInitialized)?;
    tracing::info!("{}", message);
    Ok(())
}

pub fn warn(message: &str) -> Result<(), LoggerError> {
    LOGGER.get().ok_or(LoggerError::NotInitialized)?;
    tracing::warn!("{}", message);
    Ok(())
}

pub fn error(message: &str) -> Result<(), LoggerError> {
    LOGGER.get().ok_or(LoggerError::NotInitialized)?;
    tracing::error!("{}", message);
    Ok(())
}
