use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;

pub fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(path).with_context(|| format!("failed to create dir: {}", path.display()))
}

/// Sibling temp path: `config.json` -> `config.json.tmp`.
pub fn temp_path_for(dst: &Path) -> PathBuf {
    let mut name = dst.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    dst.with_file_name(name)
}

/// Write `bytes` to the temp sibling of `dst` and flush it to disk. `dst` is not touched.
///
/// `mode` applies Unix permission bits before the file ever carries the final name.
pub fn stage_temp(dst: &Path, bytes: &[u8], mode: Option<u32>) -> anyhow::Result<PathBuf> {
    if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }

    let tmp = temp_path_for(dst);
    let res = (|| -> anyhow::Result<()> {
        let mut f =
            fs::File::create(&tmp).with_context(|| format!("failed to create: {}", tmp.display()))?;
        apply_mode(&tmp, mode)?;
        f.write_all(bytes)
            .with_context(|| format!("failed writing: {}", tmp.display()))?;
        f.sync_all().ok();
        Ok(())
    })();

    if let Err(e) = res {
        // Best-effort cleanup so we don't leave partial temp files around.
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(tmp)
}

/// Temp-file-then-rename. A crash before the rename leaves `dst` byte-identical.
pub fn write_atomic(dst: &Path, bytes: &[u8], mode: Option<u32>) -> anyhow::Result<()> {
    let tmp = stage_temp(dst, bytes, mode)?;
    replace_file(&tmp, dst)
}

#[cfg(not(windows))]
pub fn replace_file(tmp: &Path, dst: &Path) -> anyhow::Result<()> {
    if let Err(e) = fs::rename(tmp, dst) {
        let _ = fs::remove_file(tmp);
        return Err(anyhow::Error::new(e).context(format!(
            "failed rename {} -> {}",
            tmp.display(),
            dst.display()
        )));
    }
    Ok(())
}

#[cfg(windows)]
pub fn replace_file(tmp: &Path, dst: &Path) -> anyhow::Result<()> {
    // Replacing can fail while another process holds the destination open; keep a backup
    // so the previous file can be restored.
    let backup = dst.with_extension("bak");

    if dst.exists() {
        let _ = fs::remove_file(&backup);
        fs::rename(dst, &backup)
            .with_context(|| format!("failed rename {} -> {}", dst.display(), backup.display()))?;
    }

    if let Err(e) = fs::rename(tmp, dst) {
        if backup.exists() {
            let _ = fs::rename(&backup, dst);
        }
        let _ = fs::remove_file(tmp);
        return Err(anyhow::Error::new(e).context(format!(
            "failed rename {} -> {}",
            tmp.display(),
            dst.display()
        )));
    }

    let _ = fs::remove_file(&backup);
    Ok(())
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: Option<u32>) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    if let Some(mode) = mode {
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
            .with_context(|| format!("failed to set permissions: {}", path.display()))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: Option<u32>) -> anyhow::Result<()> {
    Ok(())
}
