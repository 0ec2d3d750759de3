//! Resolution and download of the packing tool.

use std::path::{Path, PathBuf};

pub const APPIMAGETOOL: &str = "appimagetool";
/// Release channel the packer is pinned to.
pub const CONTINUOUS_TAG: &str = "continuous";

const RELEASES_URL: &str = "https://github.com/AppImage/AppImageKit/releases/download";

/// Supplies an executable packing tool for a release tag.
#[allow(async_fn_in_trait)]
pub trait Provisioner: Send + Sync {
    async fn provision(&self, tool: &str, tag: &str) -> Result<PathBuf, ProvisionError>;
}

/// Downloads release builds into the user cache, once per tag.
///
/// An explicit override path short-circuits the download.
#[derive(Debug, Clone)]
pub struct ReleaseProvisioner {
    cache_dir: PathBuf,
    base_url: String,
    arch: String,
    override_path: Option<PathBuf>,
    http: reqwest::Client,
}

impl ReleaseProvisioner {
    /// Cache under `$XDG_CACHE_HOME/pyappimage/tools`.
    pub fn new() -> Result<Self, ProvisionError> {
        let cache_dir = dirs::cache_dir()
            .ok_or(ProvisionError::NoCacheDir)?
            .join("pyappimage")
            .join("tools");
        Ok(Self::with_cache_dir(cache_dir))
    }

    pub fn with_cache_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            base_url: RELEASES_URL.to_owned(),
            arch: std::env::consts::ARCH.to_owned(),
            override_path: None,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_override(mut self, path: Option<PathBuf>) -> Self {
        self.override_path = path;
        self
    }

    /// Where `tool` at `tag` lives once provisioned.
    pub fn cached_path(&self, tool: &str, tag: &str) -> PathBuf {
        match &self.override_path {
            Some(path) => path.clone(),
            None => self.cache_dir.join(tag).join(self.asset_name(tool)),
        }
    }

    pub fn download_url(&self, tool: &str, tag: &str) -> String {
        format!(
            "{base}/{tag}/{asset}",
            base = self.base_url.trim_end_matches('/'),
            asset = self.asset_name(tool)
        )
    }

    fn asset_name(&self, tool: &str) -> String {
        format!("{tool}-{arch}.AppImage", arch = self.arch)
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<(), ProvisionError> {
        tracing::info!(%url, "downloading packing tool");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ProvisionError::Download {
                url: url.to_owned(),
                source: e,
            })?;
        let bytes = response.bytes().await.map_err(|e| ProvisionError::Download {
            url: url.to_owned(),
            source: e,
        })?;

        let parent = dest.parent().unwrap_or(Path::new("."));
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ProvisionError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;

        // only a complete download is renamed into the cache
        let partial = dest.with_extension("part");
        tokio::fs::write(&partial, &bytes)
            .await
            .map_err(|e| ProvisionError::Io {
                path: partial.clone(),
                source: e,
            })?;
        make_executable(&partial).await?;
        tokio::fs::rename(&partial, dest)
            .await
            .map_err(|e| ProvisionError::Io {
                path: dest.to_path_buf(),
                source: e,
            })
    }
}

impl Provisioner for ReleaseProvisioner {
    async fn provision(&self, tool: &str, tag: &str) -> Result<PathBuf, ProvisionError> {
        let path = self.cached_path(tool, tag);

        if let Some(explicit) = &self.override_path {
            return if explicit.is_file() {
                tracing::debug!(path = %explicit.display(), "using configured packing tool");
                Ok(explicit.clone())
            } else {
                Err(ProvisionError::Missing(explicit.clone()))
            };
        }

        if path.is_file() {
            tracing::debug!(path = %path.display(), "packing tool already cached");
            return Ok(path);
        }

        self.download(&self.download_url(tool, tag), &path).await?;
        Ok(path)
    }
}

async fn make_executable(path: &Path) -> Result<(), ProvisionError> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|e| ProvisionError::Io {
            path: path.to_path_buf(),
            source: e,
        })
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("no user cache directory available to store the packing tool")]
    NoCacheDir,

    #[error("failed to download {url}")]
    Download { url: String, source: reqwest::Error },

    #[error("failed to write {path}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("configured packing tool {0} does not exist")]
    Missing(PathBuf),
}
