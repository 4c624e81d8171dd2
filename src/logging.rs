use chrono::Local;
use simplelog::*;
use std::fs::{self, OpenOptions};
use std::io::{Error, ErrorKind};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

static INIT: Once = Once::new();
static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// `~/.local/share/tickseq/logs`
pub fn log_dir() -> Result<PathBuf, Error> {
    let home = std::env::var("HOME")
        .map_err(|_| Error::new(ErrorKind::NotFound, "HOME environment variable not set"))?;

    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("tickseq")
        .join("logs"))
}

/// Installs a file logger writing to `tickseq-<date>.log`. Only the first call
/// installs anything; later calls report whether that succeeded.
pub fn init_logger(level: LevelFilter) -> Result<PathBuf, Error> {
    let log_dir = log_dir()?;
    fs::create_dir_all(&log_dir)?;

    let path = log_dir.join(format!("tickseq-{}.log", Local::now().format("%Y-%m-%d")));
    let log_file = OpenOptions::new().create(true).append(true).open(&path)?;

    INIT.call_once(|| {
        let config = ConfigBuilder::new()
            .set_target_level(LevelFilter::Error)
            .build();
        if CombinedLogger::init(vec![WriteLogger::new(level, config, log_file)]).is_ok() {
            LOGGER_INITIALIZED.store(true, Ordering::SeqCst);
        }
    });

    if LOGGER_INITIALIZED.load(Ordering::SeqCst) {
        Ok(path)
    } else {
        Err(Error::new(ErrorKind::Other, "Logger initialization failed"))
    }
}

/// Falls back to `env_logger` on stderr (honours `RUST_LOG`).
pub fn init_fallback_logger(level: LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}
