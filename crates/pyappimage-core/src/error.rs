use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("config at {path} must be a mapping of option names to values")]
    ConfigNotMapping { path: PathBuf },

    #[error(
        "could not find a pyappimage.json; searched: {}",
        format_paths(searched)
    )]
    ConfigNotFound { searched: Vec<PathBuf> },

    // ── Configuration values ──
    #[error("config has no `entrypoint`; set it to `module:function`")]
    MissingEntrypoint,

    #[error("invalid entrypoint {value:?}: expected `module:function`")]
    InvalidEntrypoint { value: String },

    #[error("config contains invalid data for `{key}`: {reason}")]
    InvalidConfiguration { key: String, reason: String },

    // ── Project and host ──
    #[error("failed to resolve project directory {path}")]
    ProjectDirResolve {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not find a setup.py or pyproject.toml in {dir}")]
    ProjectDescriptorNotFound { dir: PathBuf },

    #[error("could not find {name} on PATH; make sure {name} is installed and try again")]
    ExecutableNotFound { name: String, source: which::Error },

    #[error("failed to create directory {path}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            key: key.to_owned(),
            reason: reason.into(),
        }
    }
}

fn format_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        "(none)".to_owned()
    } else {
        paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
