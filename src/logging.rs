use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const DEFAULT_FILTER: &str = "kraken_dca=info";

/// Append-mode log file shared between the file layer and the [`LogGuard`]
#[derive(Clone)]
pub struct LogFile(Arc<Mutex<BufWriter<File>>>);

impl LogFile {
    /// Open `path` for appending and start a new dated section
    pub fn open(path: &Path, date: NaiveDate) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);
        write!(writer, "\n\n{}\n", date.format("%d.%m.%Y"))?;
        writer.flush()?;
        Ok(Self(Arc::new(Mutex::new(writer))))
    }
}

impl Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?
            .flush()
    }
}

/// Flushes the log file when dropped. Keep it alive until the end of `main`.
pub struct LogGuard {
    file: Option<LogFile>,
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        if let Some(file) = self.file.as_mut() {
            if let Err(e) = file.flush() {
                eprintln!("Failed to flush log file: {}", e);
            }
        }
    }
}

/// Log to stdout and, if given, append to `log_file` as well
pub fn setup_logging(log_file: Option<&Path>) -> Result<LogGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file = log_file
        .map(|path| {
            LogFile::open(path, Local::now().date_naive())
                .with_context(|| format!("Failed to open log file {}", path.display()))
        })
        .transpose()?;

    let file_layer = file.clone().map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(move || file.clone())
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(LogGuard { file })
}
