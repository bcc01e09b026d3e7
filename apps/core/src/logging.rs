use std::any::Any;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "questfind.log";
const MAX_LOG_BYTES: u64 = 1_000_000;
const MAX_ARCHIVES: usize = 5;
const ARCHIVE_PREFIX: &str = "questfind-";

static PANIC_HOOK_INSTALLED: OnceLock<()> = OnceLock::new();

pub fn logs_dir() -> PathBuf {
    crate::config::stable_app_data_dir().join("logs")
}

/// Routes `tracing` output to the rotated log file. `RUST_LOG` overrides
/// `default_level`. Calling twice keeps the first subscriber.
pub fn init(default_level: &str) -> Result<(), std::io::Error> {
    init_in(&logs_dir(), default_level)
}

pub fn init_in(log_dir: &Path, default_level: &str) -> Result<(), std::io::Error> {
    fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join(LOG_FILE_NAME);
    rotate_if_needed(&log_path, log_dir)?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();

    install_panic_hook();
    Ok(())
}

fn archive_name(stamp: u64) -> String {
    format!("{ARCHIVE_PREFIX}{stamp}.log")
}

fn is_archive(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(ARCHIVE_PREFIX) && name.ends_with(".log"))
}

fn rotate_if_needed(log_path: &Path, log_dir: &Path) -> Result<(), std::io::Error> {
    let size = match fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };
    if size < MAX_LOG_BYTES {
        return Ok(());
    }

    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs());
    fs::rename(log_path, log_dir.join(archive_name(stamp)))?;
    prune_old_archives(log_dir)
}

/// Deletes all but the newest [`MAX_ARCHIVES`] rotated files.
fn prune_old_archives(log_dir: &Path) -> Result<(), std::io::Error> {
    let mut archives: Vec<PathBuf> = fs::read_dir(log_dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| is_archive(path))
        .collect();
    archives.sort_unstable_by(|a, b| b.cmp(a));

    for stale in archives.iter().skip(MAX_ARCHIVES) {
        if let Err(error) = fs::remove_file(stale) {
            eprintln!("[questfind-core] failed to prune {}: {error}", stale.display());
        }
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    payload
        .downcast_ref::<String>()
        .cloned()
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map_or_else(|| "unknown".to_string(), ToString::to_string);
            tracing::error!(%location, message = %panic_message(info.payload()), "panic");
            previous(info);
        }));
    });
}
