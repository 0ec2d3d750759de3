use crate::apprun::{APPRUN_FILE, AppRunGenerator};
use crate::desktop::{DesktopEntryGenerator, icon_stem};
use crate::entrypoint::{EntrypointGenerator, Provenance};
use crate::logs::{self, BuildLogRecord, DIST_LOG, LogError, PIP_LOG, PIP_REQ_LOG, PYINSTALLER_LOG};
use crate::stage::{self, StageError};
use pyappimage_core::{AppConfig, BuildConfig, BuildPaths, PythonProject, ToolSettings, VariableContext, params};
use pyappimage_tools::{
    APPIMAGETOOL, CONTINUOUS_TAG, FreezeRequest, PackRequest, PipTarget, ProvisionError,
    Provisioner, RealExecutor, ReleaseProvisioner, ToolClient, ToolError, ToolExecutor, ToolOutput,
};
use std::path::{Path, PathBuf};

/// Everything one build needs besides the host tools.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Directory holding `setup.py` or `pyproject.toml`; build directories
    /// and the artifact are created here.
    pub project_dir: PathBuf,
    pub config: BuildConfig,
    pub icon: PathBuf,
    pub appdata: Option<PathBuf>,
    /// Hand-written desktop entry, copied instead of generated.
    pub desktop_file: Option<PathBuf>,
    /// Hand-written launcher, copied instead of generated.
    pub apprun: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    Packed { artifact: PathBuf },
    /// The packing tool exited non-zero; details are in `log`.
    PackFailed { exit_code: i32, log: PathBuf },
}

/// Result of a pipeline run that reached the packing step.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub status: BuildStatus,
    /// Whether the frozen binary was found after freezing.
    pub freeze_succeeded: bool,
    pub paths: BuildPaths,
    /// Human-readable progress, in order.
    pub steps: Vec<String>,
}

impl BuildOutcome {
    pub fn artifact(&self) -> Option<&Path> {
        match &self.status {
            BuildStatus::Packed { artifact } => Some(artifact),
            BuildStatus::PackFailed { .. } => None,
        }
    }
}

/// `<name>-<machine>.AppImage`
pub fn artifact_name(name: &str) -> String {
    format!("{name}-{arch}.AppImage", arch = std::env::consts::ARCH)
}

/// Turns a Python project into an AppImage.
///
/// ```text
/// INIT → STAGE_DIRS → WRITE_ENTRYPOINT → INSTALL_PROJECT → INSTALL_EXTRA_DEPS
///      → FREEZE → VERIFY_FREEZE → STAGE_ASSETS → STAGE_EXTRA_DATA
///      → PROVISION_PACKER → WRITE_LAUNCHER → PRUNE_LIBS → PACK → VERIFY_PACK
/// ```
pub struct Pipeline<E: ToolExecutor = RealExecutor, P: Provisioner = ReleaseProvisioner> {
    client: ToolClient<E>,
    provisioner: P,
    settings: ToolSettings,
}

impl Pipeline<RealExecutor, ReleaseProvisioner> {
    pub fn new(settings: ToolSettings) -> Result<Self, BuildError> {
        let provisioner = ReleaseProvisioner::new()?.with_override(settings.appimagetool.clone());
        Ok(Self::with_parts(ToolClient::new(), provisioner, settings))
    }
}

impl<E: ToolExecutor, P: Provisioner> Pipeline<E, P> {
    pub fn with_parts(client: ToolClient<E>, provisioner: P, settings: ToolSettings) -> Self {
        Self {
            client,
            provisioner,
            settings,
        }
    }

    /// Run every step in order.
    ///
    /// # Errors
    ///
    /// Configuration problems are reported before any tool runs. A failed
    /// install is fatal. A missing frozen binary is only fatal with
    /// `halt-on-freeze-failure`. A failed pack is not an error; it is
    /// reported as [`BuildStatus::PackFailed`].
    pub async fn run(&self, request: &BuildRequest) -> Result<BuildOutcome, BuildError> {
        let mut steps = Vec::new();

        // ── Init ──
        let (app, pass_through) = request.config.split()?;
        let project = PythonProject::discover(&request.project_dir)?;
        let base = project.project_dir.as_path();
        let paths = BuildPaths::new(base, &app.name);
        let vars = VariableContext::for_build(&paths, base, &self.settings.appdir);
        let flags = params::translate(&pass_through, &vars)?;
        tracing::debug!(?flags, "translated PyInstaller options");
        steps.push(format!("Configuration loaded for {}", app.name));

        // ── Directories ──
        paths.create_all()?;
        steps.push(format!("Build directories created under {}", base.display()));

        // ── Entrypoint ──
        let python_runtime = self.client.python_version(&self.settings.python).await?;
        let provenance = Provenance::host(python_runtime);
        let shim = EntrypointGenerator::new(&app.entrypoint, &provenance).render();
        stage::write_file(&paths.entrypoint(), &shim)?;
        steps.push(format!("Entrypoint written for {}", app.entrypoint.call_statement()));

        // ── Install ──
        tracing::info!(project = %base.display(), "installing project");
        let out = self
            .client
            .install(&self.settings.pip, &paths.build_dir, PipTarget::Project(base))
            .await?;
        check_install(&out, &paths.log_file(PIP_LOG))?;
        let site_packages = find_site_packages(&paths.build_dir)?;
        steps.push("Project installed".to_owned());

        if !app.requirements.is_empty() {
            tracing::info!(requirements = ?app.requirements, "installing additional requirements");
            let out = self
                .client
                .install(
                    &self.settings.pip,
                    &paths.build_dir,
                    PipTarget::Requirements(&app.requirements),
                )
                .await?;
            check_install(&out, &paths.log_file(PIP_REQ_LOG))?;
            steps.push(format!("{} additional requirement(s) installed", app.requirements.len()));
        }

        // ── Freeze ──
        tracing::info!("freezing with PyInstaller");
        let entrypoint = paths.entrypoint();
        let request_freeze = FreezeRequest {
            entrypoint: &entrypoint,
            name: &app.name,
            flags: &flags,
            dist_dir: &paths.dist_dir,
            work_dir: &paths.work_dir,
            site_packages: &site_packages,
        };
        let out = self
            .client
            .freeze(&self.settings.pyinstaller, &request_freeze)
            .await?;
        let freeze_log = BuildLogRecord::new("PYINSTALLER LOGS:", &out)
            .write(&paths.log_file(PYINSTALLER_LOG))?;

        let binary = paths.frozen_binary();
        let freeze_succeeded = binary.is_file();
        if freeze_succeeded {
            steps.push("Frozen with PyInstaller".to_owned());
        } else {
            tracing::warn!(
                binary = %binary.display(),
                log = %freeze_log.display(),
                "PyInstaller did not produce the expected binary"
            );
            if app.halt_on_freeze_failure {
                return Err(BuildError::FreezeFailed {
                    binary,
                    log: freeze_log,
                });
            }
            steps.push(format!(
                "Warning: build failed; {} is missing, see {}",
                binary.display(),
                freeze_log.display()
            ));
        }

        // ── AppDir assets ──
        self.stage_assets(request, &app, &paths)?;
        steps.push("Icon and desktop entry staged".to_owned());

        stage::copy_extra_data(&app.data, &vars, base)?;
        if !app.data.is_empty() {
            steps.push(format!("{} extra data mapping(s) copied", app.data.len()));
        }

        // ── Packer ──
        let appimagetool = self.provisioner.provision(APPIMAGETOOL, CONTINUOUS_TAG).await?;
        steps.push(format!("Using {}", appimagetool.display()));

        let apprun = paths.dist_dir.join(APPRUN_FILE);
        match &request.apprun {
            Some(custom) => {
                stage::copy_launcher(custom, &apprun)?;
                steps.push(format!("Using ejected {APPRUN_FILE}"));
            }
            None => {
                let script = AppRunGenerator::new(&app.name, &app.environment).render();
                stage::write_launcher(&apprun, &script)?;
                steps.push(format!("{APPRUN_FILE} written"));
            }
        }

        let removed = stage::prune_libs(&paths.bundle_dir(), &app.ignore_binaries)?;
        if !removed.is_empty() {
            steps.push(format!("{} bundled librar(ies) removed", removed.len()));
        }

        // ── Pack ──
        let started_at = logs::timestamp();
        let artifact = base.join(artifact_name(&app.name));
        let pack = PackRequest {
            source_dir: &paths.dist_dir,
            output: &artifact,
            update_information: app.update_information.as_deref(),
            extract_and_run: !self.settings.has_fuse,
        };
        tracing::info!(output = %artifact.display(), "packing AppImage");
        let out = self.client.pack(&appimagetool, &pack).await?;
        let dist_log = BuildLogRecord::new("BUILD LOGS", &out)
            .started_at(&started_at)
            .write(&paths.log_file(DIST_LOG))?;

        let status = if out.success() {
            steps.push(format!("Packed: {}", artifact.display()));
            BuildStatus::Packed { artifact }
        } else {
            tracing::warn!(code = out.exit_code(), log = %dist_log.display(), "appimagetool failed");
            steps.push(format!(
                "Packing failed with exit code {}; see {}",
                out.exit_code(),
                dist_log.display()
            ));
            BuildStatus::PackFailed {
                exit_code: out.exit_code(),
                log: dist_log,
            }
        };

        Ok(BuildOutcome {
            status,
            freeze_succeeded,
            paths,
            steps,
        })
    }

    fn stage_assets(
        &self,
        request: &BuildRequest,
        app: &AppConfig,
        paths: &BuildPaths,
    ) -> Result<(), BuildError> {
        let icon = stage::copy_icon(&request.icon, &paths.dist_dir)?;

        if let Some(appdata) = &request.appdata {
            stage::copy_appdata(appdata, &paths.dist_dir, &app.name)?;
        }

        let desktop = paths.dist_dir.join(format!("{}.desktop", app.name));
        match &request.desktop_file {
            Some(custom) => stage::copy_file(custom, &desktop)?,
            None => {
                let entry = DesktopEntryGenerator::new(app, icon_stem(&icon)).render();
                stage::write_file(&desktop, &entry)?;
            }
        }
        Ok(())
    }
}

/// Logs a pip run and fails on non-zero exit.
fn check_install(out: &ToolOutput, log_path: &Path) -> Result<(), BuildError> {
    let log = BuildLogRecord::new("PIP LOGS: ", out).write(log_path)?;
    if out.success() {
        Ok(())
    } else {
        Err(BuildError::InstallFailed {
            exit_code: out.exit_code(),
            log,
        })
    }
}

fn find_site_packages(prefix: &Path) -> Result<PathBuf, BuildError> {
    stage::site_packages(prefix)?.ok_or_else(|| BuildError::SitePackagesNotFound(prefix.to_path_buf()))
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] pyappimage_core::Error),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    Stage(#[from] StageError),

    #[error(transparent)]
    Log(#[from] LogError),

    #[error("pip exited with {exit_code}; see {}", log.display())]
    InstallFailed { exit_code: i32, log: PathBuf },

    #[error("no lib/python*/site-packages under {0} after installing the project")]
    SitePackagesNotFound(PathBuf),

    #[error("PyInstaller did not produce {}; see {}", binary.display(), log.display())]
    FreezeFailed { binary: PathBuf, log: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn artifact_name_carries_arch() {
        let name = artifact_name("Demo");
        assert_eq!(name, format!("Demo-{}.AppImage", std::env::consts::ARCH));
    }

    #[test]
    fn site_packages_found_under_versioned_lib() {
        let tmp = TempDir::new().unwrap();
        let sp = tmp.path().join("lib/python3.12/site-packages");
        std::fs::create_dir_all(&sp).unwrap();
        assert_eq!(find_site_packages(tmp.path()).unwrap(), sp);
    }

    #[test]
    fn site_packages_missing_is_an_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("lib")).unwrap();
        let err = find_site_packages(tmp.path()).unwrap_err();
        assert!(matches!(err, BuildError::SitePackagesNotFound(_)));
    }

    #[test]
    fn install_failure_keeps_log() {
        let tmp = TempDir::new().unwrap();
        let out = ToolOutput {
            stdout: String::new(),
            stderr: "ERROR\n".to_owned(),
            code: Some(2),
        };
        let log = tmp.path().join(PIP_LOG);
        let err = check_install(&out, &log).unwrap_err();
        assert!(matches!(err, BuildError::InstallFailed { exit_code: 2, .. }));
        assert!(std::fs::read_to_string(&log).unwrap().contains("Build exited with 2"));
    }
}
