use crate::apprun::APPRUN_FILE;
use std::path::{Path, PathBuf};

/// Writes the desktop entry and launcher templates into `config_dir` for
/// hand editing.
///
/// After ejecting, `pyappimage build` copies these files into the AppDir
/// instead of generating them.
pub fn eject(
    config_dir: &Path,
    name: &str,
    desktop_entry: &str,
    apprun: &str,
) -> Result<Vec<PathBuf>, EjectError> {
    std::fs::create_dir_all(config_dir).map_err(|e| EjectError::CreateDir {
        path: config_dir.to_path_buf(),
        source: e,
    })?;

    let desktop_path = desktop_file_path(config_dir, name);
    let apprun_path = config_dir.join(APPRUN_FILE);
    for path in [&desktop_path, &apprun_path] {
        if path.exists() {
            return Err(EjectError::AlreadyEjected(path.clone()));
        }
    }

    write(&desktop_path, desktop_entry)?;
    write(&apprun_path, apprun)?;
    crate::stage::make_executable(&apprun_path)?;

    Ok(vec![desktop_path, apprun_path])
}

/// Whether either template has been ejected into `config_dir`.
pub fn is_ejected(config_dir: &Path, name: &str) -> bool {
    custom_desktop_file(config_dir, name).is_some() || custom_apprun(config_dir).is_some()
}

pub fn custom_desktop_file(config_dir: &Path, name: &str) -> Option<PathBuf> {
    Some(desktop_file_path(config_dir, name)).filter(|p| p.is_file())
}

pub fn custom_apprun(config_dir: &Path) -> Option<PathBuf> {
    Some(config_dir.join(APPRUN_FILE)).filter(|p| p.is_file())
}

fn desktop_file_path(config_dir: &Path, name: &str) -> PathBuf {
    config_dir.join(format!("{name}.desktop"))
}

fn write(path: &Path, contents: &str) -> Result<(), EjectError> {
    std::fs::write(path, contents).map_err(|e| EjectError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum EjectError {
    #[error("failed to create {path}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0} already exists; edit it directly or delete it to eject again")]
    AlreadyEjected(PathBuf),
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Stage(#[from] crate::stage::StageError),
}
