use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Mutex, Once};

use chrono::Local;
use log::{LevelFilter, Record};

static INIT: Once = Once::new();
static LOG_FILE: Mutex<Option<File>> = Mutex::new(None);

/// Initializes file logging under the user's home directory.
///
/// The server owns stdout for protocol traffic, so log output always goes
/// to a dated file instead.
pub fn init() {
    INIT.call_once(|| {
        if let Err(e) = try_init() {
            eprintln!("Failed to initialize logging: {}", e);
        }
    });
}

fn try_init() -> io::Result<()> {
    let log_dir = log_dir().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "Failed to get log directory")
    })?;
    std::fs::create_dir_all(&log_dir)?;

    let log_path = log_dir.join(format!("balance-ls-{}.log", Local::now().format("%Y%m%d")));
    let file = File::create(&log_path)?;
    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = Some(file);
    }

    // debug builds log protocol traffic; release builds stay quiet
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    log::set_max_level(level);

    log::set_boxed_logger(Box::new(FileLogger))
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    Ok(())
}

fn log_dir() -> Option<PathBuf> {
    let mut dir = dirs::home_dir()?;
    dir.push(".balance-ls");
    dir.push("logs");
    Some(dir)
}

struct FileLogger;

impl log::Log for FileLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let message = format!(
            "[{}] {} [{}:{}] {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.target(),
            record.line().unwrap_or(0),
            record.args()
        );

        if let Ok(mut guard) = LOG_FILE.lock() {
            if let Some(file) = guard.as_mut() {
                if let Err(e) = file.write_all(message.as_bytes()) {
                    eprintln!("Failed to write to log file: {}", e);
                }
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut guard) = LOG_FILE.lock() {
            if let Some(file) = guard.as_mut() {
                if let Err(e) = file.flush() {
                    eprintln!("Failed to flush log file: {}", e);
                }
            }
        }
    }
}
