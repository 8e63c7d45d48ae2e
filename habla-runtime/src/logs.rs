use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Context;
use chrono::{DateTime, Local, NaiveDate, TimeDelta};

const LOG_PREFIX: &str = "spanish_tutor_";

/// `spanish_tutor_YYYYMMDD.log` for the given day.
pub fn log_file_name(day: NaiveDate) -> String {
    format!("{LOG_PREFIX}{}.log", day.format("%Y%m%d"))
}

pub fn log_file_for_today(dir: &Path) -> PathBuf {
    dir.join(log_file_name(Local::now().date_naive()))
}

/// Open today's log file for appending, creating the directory if needed.
pub fn open_log_file(dir: &Path) -> anyhow::Result<fs::File> {
    crate::atomic::ensure_dir(dir)?;
    let path = log_file_for_today(dir);
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file: {}", path.display()))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogStats {
    pub files: usize,
    pub total_bytes: u64,
    pub newest: Option<PathBuf>,
}

/// Delete log files last modified more than `days` days ago. Returns how many were removed.
///
/// A cutoff earlier than any representable date removes nothing.
pub fn clear_old_logs(dir: &Path, days: u32) -> usize {
    let cutoff = TimeDelta::try_days(i64::from(days))
        .and_then(|age| Local::now().checked_sub_signed(age));
    match cutoff {
        Some(cutoff) => clear_logs_before(dir, cutoff.into()),
        None => {
            log::debug!("retention of {days} days predates the calendar; nothing to delete");
            0
        }
    }
}

pub fn clear_logs_before(dir: &Path, cutoff: SystemTime) -> usize {
    let mut removed = 0;
    for (path, meta) in log_files(dir) {
        let Ok(modified) = meta.modified() else {
            continue;
        };
        if modified >= cutoff {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                log::info!("deleted old log file: {}", path.display());
                removed += 1;
            }
            Err(e) => log::warn!("could not delete {}: {e}", path.display()),
        }
    }
    removed
}

pub fn log_stats(dir: &Path) -> LogStats {
    let mut stats = LogStats::default();
    let mut newest: Option<(SystemTime, PathBuf)> = None;

    for (path, meta) in log_files(dir) {
        stats.files += 1;
        stats.total_bytes += meta.len();
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        if newest.as_ref().is_none_or(|(t, _)| modified > *t) {
            newest = Some((modified, path));
        }
    }

    stats.newest = newest.map(|(_, p)| p);
    stats
}

pub fn format_modified(path: &Path) -> Option<String> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Local>::from(modified).format("%Y-%m-%d %H:%M").to_string())
}

fn log_files(dir: &Path) -> Vec<(PathBuf, fs::Metadata)> {
    let Ok(entries) = fs::read_dir(dir) else {
        return vec![];
    };

    entries
        .flatten()
        .filter(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            name.starts_with(LOG_PREFIX) && name.contains(".log")
        })
        .filter_map(|e| {
            let meta = e.metadata().ok()?;
            meta.is_file().then(|| (e.path(), meta))
        })
        .collect()
}
