//! The script generated from a notebook.
//!
//! `GeneratedScript` is created from the notebook path alone, before the
//! converter runs, and deletes the script when dropped. Cleanup therefore
//! never depends on how far the run got. A path that is already taken is
//! refused, so the guard only ever deletes a file this run produced.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::errors::NotebookError;

/// Script path the converter writes for `notebook`: same directory, same stem.
pub fn script_path_for(notebook: &Path, ext: &str) -> PathBuf {
    notebook.with_extension(ext)
}

/// Directory the notebook lives in, `.` for a bare file name.
pub fn notebook_dir(notebook: &Path) -> PathBuf {
    match notebook.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Owning handle on a generated script; removes the file on drop.
#[derive(Debug)]
pub struct GeneratedScript {
    path: PathBuf,
}

impl GeneratedScript {
    /// Take ownership of the script path for `notebook`. Nothing is touched on disk.
    ///
    /// Fails with `ScriptPathOccupied` when something already exists at `path`.
    pub fn claim(notebook: &Path, path: PathBuf) -> Result<Self, NotebookError> {
        if fs::symlink_metadata(&path).is_ok() {
            return Err(NotebookError::ScriptPathOccupied {
                notebook: notebook.to_path_buf(),
                script: path,
            });
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Absolute path used to launch the script without a `PATH` lookup.
    pub fn absolute_path(&self) -> io::Result<PathBuf> {
        fs::canonicalize(&self.path)
    }

    /// Add execute permission for owner, group and others.
    #[cfg(unix)]
    pub fn make_executable(&self) -> Result<(), NotebookError> {
        use std::os::unix::fs::PermissionsExt;

        let permissions_error = |source| NotebookError::Permissions {
            script: self.path.clone(),
            source,
        };
        let mut perms = fs::metadata(&self.path).map_err(permissions_error)?.permissions();
        perms.set_mode(perms.mode() | 0o111);
        fs::set_permissions(&self.path, perms).map_err(permissions_error)
    }

    #[cfg(not(unix))]
    pub fn make_executable(&self) -> Result<(), NotebookError> {
        Ok(())
    }

    /// Delete the script now. A script that was never written is not an error.
    pub fn remove(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

impl Drop for GeneratedScript {
    fn drop(&mut self) {
        match self.remove() {
            Ok(()) => tracing::debug!(script = %self.path.display(), "generated script cleaned up"),
            Err(e) => tracing::warn!(script = %self.path.display(), error = %e, "failed to remove generated script"),
        }
    }
}
