//! Atomic directory replacement.
//!
//! Both persistence layers save the same way: write everything into a
//! sibling temp directory, then swap it into place, keeping the previous
//! directory as a backup until the swap has completed.
//!
//! 1. Wipe any stale temp directory and create a fresh one.
//! 2. Run the writer against the temp directory. On failure the temp
//!    directory is deleted and the target is untouched.
//! 3. Move the existing target (if any) to the backup path, clearing any
//!    stale backup first.
//! 4. Move temp to the target path.
//! 5. Delete the backup.
//!
//! A failure in step 3 leaves the target where it was, so the temp directory
//! is deleted and an ordinary I/O error is returned. If step 4 fails the temp
//! directory holds the only complete copy of the new data, so it is kept and
//! [`PersistError::SwapFailed`] names it. The backup is moved back into place
//! if possible.

use modeller_core::error::{PersistError, Result};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// The three sibling paths involved in one swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPaths {
    pub target: PathBuf,
    pub temp: PathBuf,
    pub backup: PathBuf,
}

impl SwapPaths {
    /// Derive `<target><temp_suffix>` and `<target><backup_suffix>` siblings.
    pub fn new(target: &Path, temp_suffix: &str, backup_suffix: &str) -> Result<Self> {
        Ok(Self {
            target: target.to_path_buf(),
            temp: sibling(target, temp_suffix)?,
            backup: sibling(target, backup_suffix)?,
        })
    }

    /// `<dir>_tmp` / `<dir>_bak`, used for a bare graph directory.
    pub fn for_graph_dir(target: &Path) -> Result<Self> {
        Self::new(target, "_tmp", "_bak")
    }

    /// `<root>.tmp` / `<root>.bak`, used for a save root.
    pub fn for_save_root(target: &Path) -> Result<Self> {
        Self::new(target, ".tmp", ".bak")
    }

    /// The target is gone but a backup survived an interrupted swap.
    pub fn has_orphaned_backup(&self) -> bool {
        !self.target.exists() && self.backup.is_dir()
    }
}

fn sibling(target: &Path, suffix: &str) -> Result<PathBuf> {
    let name = target
        .file_name()
        .ok_or_else(|| PersistError::InvalidTarget(target.to_path_buf()))?;
    let mut sibling_name = OsString::from(name);
    sibling_name.push(suffix);
    Ok(target.with_file_name(sibling_name))
}

/// Replace `paths.target` with a directory produced by `write`.
pub fn replace_dir<F>(paths: &SwapPaths, write: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    remove_dir_if_exists(&paths.temp).map_err(|e| PersistError::io(&paths.temp, e))?;
    if let Err(e) = fs::create_dir_all(&paths.temp) {
        discard(&paths.temp);
        return Err(PersistError::io(&paths.temp, e).into());
    }

    if let Err(err) = write(&paths.temp) {
        warn!(temp = %paths.temp.display(), "write failed, discarding temp directory: {}", err);
        discard(&paths.temp);
        return Err(err);
    }
    debug!(temp = %paths.temp.display(), "temp directory written");

    let had_original = paths.target.exists();
    if had_original {
        let moved_aside = remove_dir_if_exists(&paths.backup)
            .and_then(|_| fs::rename(&paths.target, &paths.backup));
        if let Err(source) = moved_aside {
            warn!(
                backup = %paths.backup.display(),
                "could not move {} aside, discarding temp directory: {}",
                paths.target.display(),
                source
            );
            discard(&paths.temp);
            return Err(PersistError::io(&paths.target, source).into());
        }
    }

    if let Err(source) = fs::rename(&paths.temp, &paths.target) {
        let original_intact = had_original && fs::rename(&paths.backup, &paths.target).is_ok();
        error!(
            temp = %paths.temp.display(),
            original_intact,
            "could not move temp directory into place: {}",
            source
        );
        return Err(PersistError::SwapFailed {
            temp: paths.temp.clone(),
            original_intact,
            source,
        }
        .into());
    }

    if had_original {
        if let Err(e) = fs::remove_dir_all(&paths.backup) {
            // The save itself succeeded; the stale backup is cleared next time.
            warn!(backup = %paths.backup.display(), "could not delete backup: {}", e);
        }
    }

    info!(root = %paths.target.display(), "directory replaced");
    Ok(())
}

/// Move an orphaned backup back to the target path.
///
/// Returns `false` when there is nothing to restore.
pub fn restore_backup(paths: &SwapPaths) -> Result<bool> {
    if !paths.has_orphaned_backup() {
        return Ok(false);
    }
    fs::rename(&paths.backup, &paths.target).map_err(|e| PersistError::io(&paths.backup, e))?;
    info!(
        root = %paths.target.display(),
        "restored backup {}",
        paths.backup.display()
    );
    Ok(true)
}

fn remove_dir_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn discard(path: &Path) {
    if let Err(e) = remove_dir_if_exists(path) {
        warn!(path = %path.display(), "could not delete temp directory: {}", e);
    }
}
