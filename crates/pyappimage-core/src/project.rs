use std::path::{Path, PathBuf};

/// Packaging descriptors recognised as a Python project, in priority order.
const DESCRIPTORS: &[(&str, DescriptorKind)] = &[
    ("setup.py", DescriptorKind::SetupPy),
    ("pyproject.toml", DescriptorKind::PyProject),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    SetupPy,
    PyProject,
}

/// The Python project being packaged.
#[derive(Debug, Clone)]
pub struct PythonProject {
    /// Absolute project root, handed to pip as the install target.
    pub project_dir: PathBuf,
    /// Absolute path of the packaging descriptor.
    pub descriptor: PathBuf,
    pub kind: DescriptorKind,
}

impl PythonProject {
    /// Locate the packaging descriptor in `dir`.
    ///
    /// # Errors
    ///
    /// - [`Error::ProjectDirResolve`](crate::Error::ProjectDirResolve) if `dir` cannot be canonicalized
    /// - [`Error::ProjectDescriptorNotFound`](crate::Error::ProjectDescriptorNotFound) if neither
    ///   `setup.py` nor `pyproject.toml` exists
    pub fn discover(dir: &Path) -> crate::Result<Self> {
        let project_dir = dir
            .canonicalize()
            .map_err(|e| crate::Error::ProjectDirResolve {
                path: dir.to_path_buf(),
                source: e,
            })?;

        let (descriptor, kind) = DESCRIPTORS
            .iter()
            .map(|(file, kind)| (project_dir.join(file), *kind))
            .find(|(path, _)| path.is_file())
            .ok_or_else(|| crate::Error::ProjectDescriptorNotFound {
                dir: project_dir.clone(),
            })?;

        tracing::debug!(descriptor = %descriptor.display(), "python project discovered");

        Ok(Self {
            project_dir,
            descriptor,
            kind,
        })
    }
}
