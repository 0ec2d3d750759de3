use mockall::mock;
use pyappimage_build::logs::{DIST_LOG, PIP_LOG, PIP_REQ_LOG, PYINSTALLER_LOG};
use pyappimage_build::pipeline::artifact_name;
use pyappimage_build::{BuildError, BuildOutcome, BuildRequest, BuildStatus, Pipeline};
use pyappimage_core::{BuildConfig, ToolCommand, ToolSettings};
use pyappimage_tools::{
    EXTRACT_AND_RUN_FLAG, ProvisionError, Provisioner, ToolClient, ToolError, ToolExecutor,
    ToolOutput,
};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

mock! {
    Executor {}

    impl ToolExecutor for Executor {
        async fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput, ToolError>;
    }
}

mock! {
    Packer {}

    impl Provisioner for Packer {
        async fn provision(&self, tool: &str, tag: &str) -> Result<PathBuf, ProvisionError>;
    }
}

const PYTHON: &str = "/usr/bin/python3";
const APPIMAGETOOL: &str = "/opt/tools/appimagetool";

/// Stands in for python, pip, PyInstaller, and appimagetool, creating the
/// files each real tool would leave behind.
#[derive(Clone)]
struct FakeTools {
    install_code: i32,
    freeze_creates_binary: bool,
    pack_code: i32,
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl Default for FakeTools {
    fn default() -> Self {
        Self {
            install_code: 0,
            freeze_creates_binary: true,
            pack_code: 0,
            calls: Arc::default(),
        }
    }
}

impl FakeTools {
    fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput, ToolError> {
        let mut call = vec![program.to_owned()];
        call.extend(args.iter().cloned());
        self.calls.lock().unwrap().push(call);

        if program == APPIMAGETOOL {
            return Ok(self.pack(args));
        }
        match args.get(1).map(String::as_str) {
            _ if args.first().is_some_and(|a| a == "-c") => Ok(output(0, "3.12.1 (main) [GCC 13.2.0]\n")),
            Some("pip") => Ok(self.install(args)),
            Some("PyInstaller") => Ok(self.freeze(args)),
            other => panic!("unexpected tool call: {program} {other:?}"),
        }
    }

    fn install(&self, args: &[String]) -> ToolOutput {
        if self.install_code == 0 {
            let prefix = flag_value(args, "--prefix=");
            std::fs::create_dir_all(Path::new(&prefix).join("lib/python3.12/site-packages")).unwrap();
            output(0, "Successfully installed demo-1.0\n")
        } else {
            ToolOutput {
                stdout: String::new(),
                stderr: "ERROR: Could not install packages\n".to_owned(),
                code: Some(self.install_code),
            }
        }
    }

    fn freeze(&self, args: &[String]) -> ToolOutput {
        if self.freeze_creates_binary {
            let dist = PathBuf::from(flag_value(args, "--distpath="));
            let name = flag_value(args, "--name=");
            let bundle = dist.join(&name);
            std::fs::create_dir_all(&bundle).unwrap();
            for file in [name.as_str(), "libz.so.1", "libfoo.so.2", "libbar.so.3"] {
                std::fs::write(bundle.join(file), "").unwrap();
            }
        }
        output(0, "")
    }

    fn pack(&self, args: &[String]) -> ToolOutput {
        if self.pack_code == 0 {
            std::fs::write(args.last().unwrap(), "AppImage").unwrap();
            output(0, "Success\n")
        } else {
            ToolOutput {
                stdout: String::new(),
                stderr: "appimagetool: desktop file validation failed\n".to_owned(),
                code: Some(self.pack_code),
            }
        }
    }

    fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    fn calls_to(&self, tool: &str) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|c| c[0] == tool || c.get(2).is_some_and(|m| m == tool))
            .collect()
    }
}

fn output(code: i32, stdout: &str) -> ToolOutput {
    ToolOutput {
        stdout: stdout.to_owned(),
        stderr: String::new(),
        code: Some(code),
    }
}

fn flag_value(args: &[String], prefix: &str) -> String {
    args.iter()
        .find_map(|a| a.strip_prefix(prefix))
        .unwrap_or_else(|| panic!("{prefix} missing from {args:?}"))
        .to_owned()
}

fn settings(has_fuse: bool) -> ToolSettings {
    ToolSettings {
        python: PathBuf::from(PYTHON),
        pip: ToolCommand::python_module(Path::new(PYTHON), "pip"),
        pyinstaller: ToolCommand::python_module(Path::new(PYTHON), "PyInstaller"),
        appimagetool: None,
        appdir: String::new(),
        has_fuse,
    }
}

fn pipeline(fake: &FakeTools, has_fuse: bool) -> Pipeline<MockExecutor, MockPacker> {
    let mut executor = MockExecutor::new();
    let tools = fake.clone();
    executor
        .expect_run()
        .returning(move |program: &str, args: &[String]| tools.run(program, args));

    let mut packer = MockPacker::new();
    packer
        .expect_provision()
        .withf(|tool, tag| tool == "appimagetool" && tag == "continuous")
        .returning(|_, _| Ok(PathBuf::from(APPIMAGETOOL)));

    Pipeline::with_parts(ToolClient::with_executor(executor), packer, settings(has_fuse))
}

/// A project directory with `setup.py` and `Demo.png`.
fn project() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("setup.py"), "from setuptools import setup\nsetup()\n").unwrap();
    std::fs::write(tmp.path().join("Demo.png"), "png").unwrap();
    let dir = tmp.path().canonicalize().unwrap();
    (tmp, dir)
}

fn request(dir: &Path, config: serde_json::Value) -> BuildRequest {
    BuildRequest {
        project_dir: dir.to_path_buf(),
        config: BuildConfig::from_value(config),
        icon: dir.join("Demo.png"),
        appdata: None,
        desktop_file: None,
        apprun: None,
    }
}

fn minimal() -> serde_json::Value {
    serde_json::json!({
        "entrypoint": "pkg.mod:main",
        "name": "Demo",
        "updateinformation": null,
    })
}

async fn build(fake: &FakeTools, req: &BuildRequest) -> Result<BuildOutcome, BuildError> {
    pipeline(fake, true).run(req).await
}

// ── End to end ──

#[tokio::test]
async fn minimal_config_produces_appdir_and_artifact() {
    let (_tmp, dir) = project();
    let fake = FakeTools::default();

    let outcome = build(&fake, &request(&dir, minimal())).await.unwrap();

    let appdir = dir.join("Demo.AppDir");
    assert_eq!(outcome.paths.dist_dir, appdir);
    assert!(outcome.freeze_succeeded);
    assert!(appdir.join("Demo/Demo").is_file());
    assert!(appdir.join("Demo.png").is_file());
    assert!(appdir.join("Demo.desktop").is_file());
    let mode = std::fs::metadata(appdir.join("AppRun")).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);

    let artifact = dir.join(artifact_name("Demo"));
    assert_eq!(outcome.status, BuildStatus::Packed { artifact: artifact.clone() });
    assert!(artifact.is_file());

    let desktop = std::fs::read_to_string(appdir.join("Demo.desktop")).unwrap();
    assert!(desktop.contains("\nIcon=Demo\n"));
    assert!(desktop.contains("\nExec=Demo\n"));

    let entry = std::fs::read_to_string(dir.join("Demo.AppDir.BUILD/entrypoint.py")).unwrap();
    assert!(entry.contains("from pkg.mod import main; main()"));
    assert!(entry.contains("3.12.1 (main) [GCC 13.2.0]"));

    let pack = fake.calls_to(APPIMAGETOOL);
    assert_eq!(
        pack,
        [vec![
            APPIMAGETOOL.to_owned(),
            appdir.display().to_string(),
            artifact.display().to_string(),
        ]]
    );
}

#[tokio::test]
async fn tool_runs_follow_pipeline_order() {
    let (_tmp, dir) = project();
    let fake = FakeTools::default();
    let mut config = minimal();
    config["requirements"] = serde_json::json!(["requests"]);

    build(&fake, &request(&dir, config)).await.unwrap();

    let order: Vec<String> = fake
        .calls()
        .iter()
        .map(|c| match c.get(2).map(String::as_str) {
            _ if c[0] == APPIMAGETOOL => "pack".to_owned(),
            Some("pip") => "pip".to_owned(),
            Some("PyInstaller") => "freeze".to_owned(),
            _ => "python".to_owned(),
        })
        .collect();
    assert_eq!(order, ["python", "pip", "pip", "freeze", "pack"]);
}

#[tokio::test]
async fn missing_frozen_binary_still_packs_by_default() {
    let (_tmp, dir) = project();
    let fake = FakeTools {
        freeze_creates_binary: false,
        ..FakeTools::default()
    };

    let outcome = build(&fake, &request(&dir, minimal())).await.unwrap();

    assert!(!outcome.freeze_succeeded);
    assert!(outcome.steps.iter().any(|s| s.starts_with("Warning: build failed")));
    assert!(outcome.paths.dist_dir.join("AppRun").is_file());
    assert!(outcome.paths.build_dir.join(PYINSTALLER_LOG).is_file());
    assert_eq!(fake.calls_to(APPIMAGETOOL).len(), 1);
    assert!(matches!(outcome.status, BuildStatus::Packed { .. }));
}

#[tokio::test]
async fn missing_frozen_binary_halts_when_configured() {
    let (_tmp, dir) = project();
    let fake = FakeTools {
        freeze_creates_binary: false,
        ..FakeTools::default()
    };
    let mut config = minimal();
    config["halt-on-freeze-failure"] = serde_json::json!(true);

    let err = build(&fake, &request(&dir, config)).await.unwrap_err();

    assert!(matches!(err, BuildError::FreezeFailed { .. }), "got: {err}");
    assert!(fake.calls_to(APPIMAGETOOL).is_empty());
    assert!(!dir.join("Demo.AppDir/AppRun").exists());
}

#[tokio::test]
async fn pack_failure_is_an_outcome_not_an_error() {
    let (_tmp, dir) = project();
    let fake = FakeTools {
        pack_code: 1,
        ..FakeTools::default()
    };

    let outcome = build(&fake, &request(&dir, minimal())).await.unwrap();

    let log = dir.join("Demo.AppDir.BUILD").join(DIST_LOG);
    assert_eq!(
        outcome.status,
        BuildStatus::PackFailed {
            exit_code: 1,
            log: log.clone(),
        }
    );
    assert!(outcome.artifact().is_none());
    assert!(!dir.join(artifact_name("Demo")).exists());

    let text = std::fs::read_to_string(&log).unwrap();
    assert!(text.contains("Build started at "));
    assert!(text.contains("desktop file validation failed"));
    assert!(text.ends_with("Build exited with 1\n"));
}

#[tokio::test]
async fn failed_install_stops_before_freezing() {
    let (_tmp, dir) = project();
    let fake = FakeTools {
        install_code: 1,
        ..FakeTools::default()
    };

    let err = build(&fake, &request(&dir, minimal())).await.unwrap_err();

    match err {
        BuildError::InstallFailed { exit_code, log } => {
            assert_eq!(exit_code, 1);
            assert_eq!(log, dir.join("Demo.AppDir.BUILD").join(PIP_LOG));
            assert!(std::fs::read_to_string(log).unwrap().contains("Could not install packages"));
        }
        other => panic!("expected InstallFailed, got {other}"),
    }
    assert!(fake.calls_to("PyInstaller").is_empty());
}

#[tokio::test]
async fn configuration_errors_precede_any_tool_run() {
    let (_tmp, dir) = project();
    let mut executor = MockExecutor::new();
    executor.expect_run().never();
    let mut packer = MockPacker::new();
    packer.expect_provision().never();
    let pipeline = Pipeline::with_parts(ToolClient::with_executor(executor), packer, settings(true));

    let err = pipeline
        .run(&request(&dir, serde_json::json!({"name": "Demo", "windowed": null})))
        .await
        .unwrap_err();

    assert!(matches!(err, BuildError::Config(_)), "got: {err}");
    assert!(!dir.join("Demo.AppDir").exists());
}

#[tokio::test]
async fn missing_descriptor_is_a_configuration_error() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("Demo.png"), "png").unwrap();
    let mut executor = MockExecutor::new();
    executor.expect_run().never();
    let pipeline = Pipeline::with_parts(
        ToolClient::with_executor(executor),
        MockPacker::new(),
        settings(true),
    );

    let err = pipeline.run(&request(tmp.path(), minimal())).await.unwrap_err();
    assert!(err.to_string().contains("setup.py"), "got: {err}");
}

// ── Options reaching the tools ──

#[tokio::test]
async fn pass_through_options_reach_pyinstaller() {
    let (_tmp, dir) = project();
    let fake = FakeTools::default();
    let mut config = minimal();
    config["windowed"] = serde_json::json!(true);
    config["hidden-import"] = serde_json::json!(["yaml"]);
    config["add-data"] = serde_json::json!("$BUILD/extra:.");
    config["distpath"] = serde_json::json!("/elsewhere");

    build(&fake, &request(&dir, config)).await.unwrap();

    let freeze = &fake.calls_to("PyInstaller")[0];
    let build_dir = dir.join("Demo.AppDir.BUILD");
    assert!(freeze.contains(&"--windowed".to_owned()));
    assert!(freeze.contains(&"--hidden-import=yaml".to_owned()));
    assert!(freeze.contains(&format!("--add-data={}/extra:.", build_dir.display())));
    assert!(freeze.contains(&format!("--distpath={}", dir.join("Demo.AppDir").display())));
    assert!(!freeze.contains(&"--distpath=/elsewhere".to_owned()));
    assert!(freeze.contains(&format!(
        "--paths={}",
        build_dir.join("lib/python3.12/site-packages").display()
    )));
}

#[tokio::test]
async fn requirements_install_ignoring_installed() {
    let (_tmp, dir) = project();
    let fake = FakeTools::default();
    let mut config = minimal();
    config["requirements"] = serde_json::json!(["requests", "pyyaml>=6"]);

    build(&fake, &request(&dir, config)).await.unwrap();

    let installs = fake.calls_to("pip");
    assert_eq!(installs.len(), 2);
    assert!(installs[1].ends_with(&[
        "--ignore-installed".to_owned(),
        "requests".to_owned(),
        "pyyaml>=6".to_owned(),
    ]));
    assert!(dir.join("Demo.AppDir.BUILD").join(PIP_REQ_LOG).is_file());
}

#[tokio::test]
async fn no_fuse_and_update_information_shape_pack_args() {
    let (_tmp, dir) = project();
    let fake = FakeTools::default();
    let mut config = minimal();
    config["updateinformation"] = serde_json::json!("gh-releases-zsync|me|demo|latest|Demo-*.zsync");

    pipeline(&fake, false).run(&request(&dir, config)).await.unwrap();

    let pack = &fake.calls_to(APPIMAGETOOL)[0];
    assert_eq!(pack[1], EXTRACT_AND_RUN_FLAG);
    assert_eq!(pack[2], "-u");
    assert_eq!(pack[3], "gh-releases-zsync|me|demo|latest|Demo-*.zsync");
}

// ── AppDir contents ──

#[tokio::test]
async fn ignore_globs_prune_matching_libraries_only() {
    let (_tmp, dir) = project();
    let fake = FakeTools::default();
    let mut config = minimal();
    config["ignore-binaries"] = serde_json::json!(["*.so.2"]);

    let outcome = build(&fake, &request(&dir, config)).await.unwrap();

    let bundle = outcome.paths.dist_dir.join("Demo");
    assert!(!bundle.join("libfoo.so.2").exists());
    assert!(!bundle.join("libz.so.1").exists());
    assert!(bundle.join("libbar.so.3").is_file());
    assert!(bundle.join("Demo").is_file());
}

#[tokio::test]
async fn environment_and_extra_data_are_staged() {
    let (_tmp, dir) = project();
    std::fs::create_dir_all(dir.join("assets/icons")).unwrap();
    std::fs::write(dir.join("assets/icons/a.svg"), "<svg/>").unwrap();
    let fake = FakeTools::default();
    let mut config = minimal();
    config["data"] = serde_json::json!({"assets": "$APPIMAGE/usr/share/demo"});
    config["environment"] = serde_json::json!({"DEMO_HOME": "$APPDIR/usr/share/demo"});

    let outcome = build(&fake, &request(&dir, config)).await.unwrap();

    let appdir = &outcome.paths.dist_dir;
    assert!(appdir.join("usr/share/demo/icons/a.svg").is_file());
    let apprun = std::fs::read_to_string(appdir.join("AppRun")).unwrap();
    assert!(apprun.contains("export DEMO_HOME=\"$APPDIR/usr/share/demo\"\n"));
    assert!(apprun.trim_end().ends_with("exec \"${APPDIR}/Demo/Demo\" \"$@\""));
}

#[tokio::test]
async fn ejected_templates_and_appdata_are_copied() {
    let (_tmp, dir) = project();
    let custom = dir.join("pyappimage");
    std::fs::create_dir_all(&custom).unwrap();
    std::fs::write(custom.join("Demo.desktop"), "[Desktop Entry]\nName=Custom\n").unwrap();
    std::fs::write(custom.join("AppRun"), "#!/bin/sh\necho custom\n").unwrap();
    std::fs::write(dir.join("Demo.appdata.xml"), "<component/>").unwrap();
    let fake = FakeTools::default();

    let mut req = request(&dir, minimal());
    req.desktop_file = Some(custom.join("Demo.desktop"));
    req.apprun = Some(custom.join("AppRun"));
    req.appdata = Some(dir.join("Demo.appdata.xml"));
    let outcome = build(&fake, &req).await.unwrap();

    let appdir = &outcome.paths.dist_dir;
    assert_eq!(
        std::fs::read_to_string(appdir.join("Demo.desktop")).unwrap(),
        "[Desktop Entry]\nName=Custom\n"
    );
    assert_eq!(
        std::fs::read_to_string(appdir.join("AppRun")).unwrap(),
        "#!/bin/sh\necho custom\n"
    );
    let mode = std::fs::metadata(appdir.join("AppRun")).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);
    assert!(appdir.join("usr/share/Demo.appdata.xml").is_file());
}
