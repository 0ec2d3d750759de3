use crate::executor::{RealExecutor, ToolExecutor, ToolOutput};
use crate::tool::ToolError;
use pyappimage_core::{ToolCommand, ToolSettings};
use std::fmt;
use std::path::Path;

/// Fallback for hosts without FUSE: the packer extracts itself and runs.
pub const EXTRACT_AND_RUN_FLAG: &str = "--appimage-extract-and-run";

/// What pip should install.
#[derive(Debug, Clone, Copy)]
pub enum PipTarget<'a> {
    /// A local project directory holding `setup.py` or `pyproject.toml`.
    Project(&'a Path),
    /// Named requirements, installed over anything already present.
    Requirements(&'a [String]),
}

impl PipTarget<'_> {
    /// `install --prefix=<prefix> ...`
    pub fn install_args(&self, prefix: &Path) -> Vec<String> {
        let mut args = vec!["install".to_owned(), format!("--prefix={}", prefix.display())];
        match self {
            PipTarget::Project(dir) => args.push(dir.display().to_string()),
            PipTarget::Requirements(reqs) => {
                args.push("--ignore-installed".to_owned());
                args.extend(reqs.iter().cloned());
            }
        }
        args
    }
}

/// One PyInstaller run in one-directory mode.
#[derive(Debug, Clone)]
pub struct FreezeRequest<'a> {
    pub entrypoint: &'a Path,
    pub name: &'a str,
    /// Translated pass-through options.
    pub flags: &'a [String],
    pub dist_dir: &'a Path,
    pub work_dir: &'a Path,
    pub site_packages: &'a Path,
}

impl FreezeRequest<'_> {
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            self.entrypoint.display().to_string(),
            "--log-level=WARN".to_owned(),
            format!("--name={}", self.name),
            "--onedir".to_owned(),
        ];
        args.extend(self.flags.iter().cloned());
        args.extend([
            format!("--distpath={}", self.dist_dir.display()),
            format!("--specpath={}", self.work_dir.display()),
            format!("--workpath={}", self.work_dir.display()),
            format!("--paths={}", self.site_packages.display()),
            "--noconfirm".to_owned(),
            "--clean".to_owned(),
        ]);
        args
    }
}

/// One appimagetool run.
#[derive(Debug, Clone)]
pub struct PackRequest<'a> {
    pub source_dir: &'a Path,
    pub output: &'a Path,
    pub update_information: Option<&'a str>,
    pub extract_and_run: bool,
}

impl PackRequest<'_> {
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.extract_and_run {
            args.push(EXTRACT_AND_RUN_FLAG.to_owned());
        }
        if let Some(info) = self.update_information {
            args.push("-u".to_owned());
            args.push(info.to_owned());
        }
        args.push(self.source_dir.display().to_string());
        args.push(self.output.display().to_string());
        args
    }
}

/// External tool client, parameterized over the executor for testability.
pub struct ToolClient<E: ToolExecutor = RealExecutor> {
    executor: E,
}

impl ToolClient<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor,
        }
    }
}

impl Default for ToolClient<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ToolExecutor> ToolClient<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    // ── Python ──

    /// First line of `sys.version` of the given interpreter.
    pub async fn python_version(&self, python: &Path) -> Result<String, ToolError> {
        let program = python.display().to_string();
        let out = self
            .executor
            .run(
                &program,
                &args(["-c", "import sys; print(sys.version.splitlines()[0])"]),
            )
            .await?;
        let version = out.stdout.trim();
        if out.success() && !version.is_empty() {
            Ok(version.to_owned())
        } else {
            tracing::warn!(python = %program, code = ?out.code, "could not read python version");
            Ok("unknown".to_owned())
        }
    }

    // ── pip ──

    pub async fn install(
        &self,
        pip: &ToolCommand,
        prefix: &Path,
        target: PipTarget<'_>,
    ) -> Result<ToolOutput, ToolError> {
        self.executor
            .run(&pip.program, &pip.argv(target.install_args(prefix)))
            .await
    }

    // ── PyInstaller ──

    pub async fn freeze(
        &self,
        pyinstaller: &ToolCommand,
        request: &FreezeRequest<'_>,
    ) -> Result<ToolOutput, ToolError> {
        self.executor
            .run(&pyinstaller.program, &pyinstaller.argv(request.args()))
            .await
    }

    // ── appimagetool ──

    pub async fn pack(
        &self,
        appimagetool: &Path,
        request: &PackRequest<'_>,
    ) -> Result<ToolOutput, ToolError> {
        self.executor
            .run(&appimagetool.display().to_string(), &request.args())
            .await
    }

    // ── Doctor ──

    /// Run all diagnostic checks without early return.
    ///
    /// `appimagetool` is the path the provisioner would use, if known.
    pub async fn doctor(&self, settings: &ToolSettings, appimagetool: Option<&Path>) -> DoctorReport {
        let mut report = DoctorReport::default();

        report.python = match self.python_version(&settings.python).await {
            Ok(v) if v != "unknown" => CheckResult::ok(&format!("{v} ({})", settings.python.display())),
            Ok(_) => CheckResult::fail("interpreter did not report a version"),
            Err(e) => CheckResult::fail(&e.to_string()),
        };

        report.pip = self.version_check(&settings.pip).await;
        report.pyinstaller = self.version_check(&settings.pyinstaller).await;

        report.fuse = if settings.has_fuse {
            CheckResult::ok("available")
        } else {
            CheckResult::ok(&format!("not available; packing uses {EXTRACT_AND_RUN_FLAG}"))
        };

        report.appimagetool = match appimagetool {
            Some(path) if path.is_file() => CheckResult::ok(&path.display().to_string()),
            Some(path) => CheckResult::ok(&format!(
                "not downloaded yet; will be fetched to {}",
                path.display()
            )),
            None => CheckResult::fail("no cache directory to store appimagetool in"),
        };

        report
    }

    async fn version_check(&self, command: &ToolCommand) -> CheckResult {
        match self
            .executor
            .run(&command.program, &command.argv(args(["--version"])))
            .await
        {
            Ok(out) if out.success() => {
                let line = out.stdout.lines().next().unwrap_or_default().trim();
                CheckResult::ok(line)
            }
            Ok(out) => CheckResult::fail(&format!(
                "`{} {}` exited with {}",
                command.program,
                command.args.join(" "),
                out.exit_code()
            )),
            Err(e) => CheckResult::fail(&e.to_string()),
        }
    }
}

// ── Helper ──

fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}

// ── Doctor types ──

#[derive(Debug, Default)]
pub struct DoctorReport {
    pub python: CheckResult,
    pub pip: CheckResult,
    pub pyinstaller: CheckResult,
    pub fuse: CheckResult,
    pub appimagetool: CheckResult,
    pub config_file: CheckResult,
}

impl DoctorReport {
    pub fn all_passed(&self) -> bool {
        self.python.passed
            && self.pip.passed
            && self.pyinstaller.passed
            && self.fuse.passed
            && self.appimagetool.passed
            && self.config_file.passed
    }
}

impl fmt::Display for DoctorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = [
            ("python", &self.python),
            ("pip", &self.pip),
            ("PyInstaller", &self.pyinstaller),
            ("FUSE", &self.fuse),
            ("appimagetool", &self.appimagetool),
            ("config", &self.config_file),
        ];
        for (label, check) in rows {
            writeln!(f, "  [{}] {label:<13} {}", check.icon(), check.detail)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    pub fn ok(detail: &str) -> Self {
        Self {
            passed: true,
            detail: detail.to_owned(),
        }
    }

    pub fn fail(detail: &str) -> Self {
        Self {
            passed: false,
            detail: detail.to_owned(),
        }
    }

    pub fn icon(&self) -> &'static str {
        if self.passed { "OK" } else { "NG" }
    }
}
