//! Filesystem staging of the AppDir.

use pyappimage_core::VariableContext;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Library the freezing tool bundles but the host must provide.
pub const HOST_ZLIB: &str = "libz.so.1";

pub fn write_file(path: &Path, contents: &str) -> Result<(), StageError> {
    create_parent(path)?;
    std::fs::write(path, contents).map_err(|e| StageError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Copies one file, following symlinks, overwriting `to`.
pub fn copy_file(from: &Path, to: &Path) -> Result<(), StageError> {
    create_parent(to)?;
    std::fs::copy(from, to)
        .map(|_| ())
        .map_err(|e| StageError::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: e,
        })
}

/// Copies the icon to the AppDir root, keeping its file name.
///
/// Returns the file name, from which the desktop entry derives `Icon=`.
pub fn copy_icon(icon: &Path, appdir: &Path) -> Result<String, StageError> {
    let file_name = icon
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StageError::Missing(icon.to_path_buf()))?
        .to_owned();
    copy_file(icon, &appdir.join(&file_name))?;
    Ok(file_name)
}

/// `<appdir>/usr/share/<name>.appdata.xml`
pub fn appdata_path(appdir: &Path, name: &str) -> PathBuf {
    appdir
        .join("usr")
        .join("share")
        .join(format!("{name}.appdata.xml"))
}

pub fn copy_appdata(appdata: &Path, appdir: &Path, name: &str) -> Result<PathBuf, StageError> {
    let dest = appdata_path(appdir, name);
    copy_file(appdata, &dest)?;
    Ok(dest)
}

/// Copies each `source -> destination` pair after substituting both sides.
///
/// Relative paths are taken from `base`. The destination is always a
/// directory: a source directory is merged into it, a source file lands
/// inside it under its own name.
pub fn copy_extra_data(
    pairs: &[(String, String)],
    vars: &VariableContext,
    base: &Path,
) -> Result<(), StageError> {
    for (src, dest) in pairs {
        let src = base.join(vars.substitute(src));
        let dest = base.join(vars.substitute(dest));
        tracing::debug!(src = %src.display(), dest = %dest.display(), "copying extra data");

        create_dir(&dest)?;
        if src.is_dir() {
            copy_tree(&src, &dest)?;
        } else if src.exists() {
            let file_name = src
                .file_name()
                .ok_or_else(|| StageError::Missing(src.clone()))?;
            copy_file(&src, &dest.join(file_name))?;
        } else {
            return Err(StageError::Missing(src));
        }
    }
    Ok(())
}

/// Merges `src` into `dest`, recreating symlinks rather than following them.
fn copy_tree(src: &Path, dest: &Path) -> Result<(), StageError> {
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(|e| StageError::Walk {
            path: src.to_path_buf(),
            source: e,
        })?;
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(relative);
        let kind = entry.file_type();

        if kind.is_symlink() {
            link(entry.path(), &target)?;
        } else if kind.is_dir() {
            create_dir(&target)?;
        } else {
            copy_file(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn link(original: &Path, target: &Path) -> Result<(), StageError> {
    let pointee = std::fs::read_link(original).map_err(|e| StageError::Copy {
        from: original.to_path_buf(),
        to: target.to_path_buf(),
        source: e,
    })?;
    if target.symlink_metadata().is_ok() {
        remove(target)?;
    }
    create_parent(target)?;
    std::os::unix::fs::symlink(&pointee, target).map_err(|e| StageError::Copy {
        from: original.to_path_buf(),
        to: target.to_path_buf(),
        source: e,
    })
}

/// Writes the launcher and marks it executable.
pub fn write_launcher(path: &Path, contents: &str) -> Result<(), StageError> {
    write_file(path, contents)?;
    make_executable(path)
}

/// Copies a user-supplied launcher and marks it executable.
pub fn copy_launcher(from: &Path, to: &Path) -> Result<(), StageError> {
    copy_file(from, to)?;
    make_executable(to)
}

pub fn make_executable(path: &Path) -> Result<(), StageError> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).map_err(|e| {
        StageError::Permissions {
            path: path.to_path_buf(),
            source: e,
        }
    })
}

/// Removes the host zlib and every file matching one of `patterns` from the
/// frozen bundle. Returns what was removed.
pub fn prune_libs(bundle_dir: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, StageError> {
    let mut removed = Vec::new();

    let zlib = bundle_dir.join(HOST_ZLIB);
    if zlib.symlink_metadata().is_ok() {
        remove(&zlib)?;
        removed.push(zlib);
    }

    let root = glob::Pattern::escape(&bundle_dir.display().to_string());
    for pattern in patterns {
        let full = format!("{root}/{pattern}");
        let matches = glob::glob(&full).map_err(|e| StageError::Pattern {
            pattern: pattern.clone(),
            source: e,
        })?;
        for entry in matches {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable path while pruning");
                    continue;
                }
            };
            if path.is_dir() {
                continue;
            }
            tracing::info!(path = %path.display(), "unlinking ignored binary");
            remove(&path)?;
            removed.push(path);
        }
    }

    Ok(removed)
}

/// First directory matching `lib/python*/site-packages` under `prefix`.
pub fn site_packages(prefix: &Path) -> Result<Option<PathBuf>, StageError> {
    let pattern = "lib/python*/site-packages";
    let full = format!("{}/{pattern}", glob::Pattern::escape(&prefix.display().to_string()));
    let matches = glob::glob(&full).map_err(|e| StageError::Pattern {
        pattern: pattern.to_owned(),
        source: e,
    })?;
    for entry in matches {
        match entry {
            Ok(path) if path.is_dir() => return Ok(Some(path)),
            Ok(_) => {}
            Err(e) => tracing::debug!(error = %e, "skipping unreadable path"),
        }
    }
    Ok(None)
}

fn remove(path: &Path) -> Result<(), StageError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StageError::Remove {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn create_dir(path: &Path) -> Result<(), StageError> {
    std::fs::create_dir_all(path).map_err(|e| StageError::CreateDir {
        path: path.to_path_buf(),
        source: e,
    })
}

fn create_parent(path: &Path) -> Result<(), StageError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => create_dir(parent),
        _ => Ok(()),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("failed to create directory {path}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to copy {from} to {to}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to walk {path}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("failed to make {path} executable")]
    Permissions {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to remove {path}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid ignore-binaries pattern {pattern:?}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("{0} does not exist")]
    Missing(PathBuf),
}
