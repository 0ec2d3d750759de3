use std::path::{Path, PathBuf};

/// Name of the generated entrypoint shim inside the build directory.
pub const ENTRYPOINT_FILE: &str = "entrypoint.py";

/// The directories of one build.
///
/// All three are created on demand and never removed here; clearing a
/// previous build is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPaths {
    /// Scratch space: install prefix, entrypoint shim, logs.
    pub build_dir: PathBuf,
    /// The AppDir handed to the packing tool.
    pub dist_dir: PathBuf,
    /// PyInstaller work and spec directory.
    pub work_dir: PathBuf,
    name: String,
}

impl BuildPaths {
    /// `base` should be absolute; every derived path is joined onto it.
    pub fn new(base: &Path, name: &str) -> Self {
        let build_dir = base.join(format!("{name}.AppDir.BUILD"));
        let work_dir = build_dir.join("build");
        Self {
            dist_dir: base.join(format!("{name}.AppDir")),
            build_dir,
            work_dir,
            name: name.to_owned(),
        }
    }

    pub fn create_all(&self) -> crate::Result<()> {
        for dir in [&self.build_dir, &self.dist_dir, &self.work_dir] {
            std::fs::create_dir_all(dir).map_err(|e| crate::Error::CreateDir {
                path: dir.clone(),
                source: e,
            })?;
        }
        Ok(())
    }

    pub fn entrypoint(&self) -> PathBuf {
        self.build_dir.join(ENTRYPOINT_FILE)
    }

    /// The one-directory bundle produced by the freezing tool.
    pub fn bundle_dir(&self) -> PathBuf {
        self.dist_dir.join(&self.name)
    }

    pub fn frozen_binary(&self) -> PathBuf {
        self.bundle_dir().join(&self.name)
    }

    pub fn log_file(&self, name: &str) -> PathBuf {
        self.build_dir.join(name)
    }
}
