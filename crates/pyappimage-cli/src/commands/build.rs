use pyappimage_build::eject as eject_mod;
use pyappimage_build::{BuildRequest, BuildStatus, Pipeline};
use pyappimage_core::{BuildConfig, BuildPaths, PythonProject, ToolSettings};
use std::io::Write;
use std::path::{Path, PathBuf};

const DEFAULT_ICON: &str = include_str!("../../assets/pyappimage.svg");
const DEFAULT_ICON_FILE: &str = "pyappimage.svg";
const ICON_EXTENSIONS: &[&str] = &["png", "svg"];

/// Build the AppImage for the project in the current directory.
pub async fn build(force: bool) -> anyhow::Result<()> {
    let project_dir = PathBuf::from(".");

    // Configuration problems surface before anything touches the disk
    let located = BuildConfig::discover(&project_dir)?;
    // The pipeline derives its directories from the same split name
    let (app, _) = located.config.split()?;
    let name = app.name;
    println!("Using {}", located.path.display());

    let project = PythonProject::discover(&project_dir)?;
    let paths = BuildPaths::new(&project.project_dir, &name);

    for dir in [&paths.build_dir, &paths.dist_dir] {
        if !dir.exists() {
            continue;
        }
        if !force && !confirm(&format!("{} exists. Do you want to overwrite it? [y/N] ", dir.display()))? {
            println!("Aborted.");
            return Ok(());
        }
        std::fs::remove_dir_all(dir)?;
    }

    let icon = match find_icon(&located.dir, &name) {
        Some(icon) => icon,
        None => {
            println!(
                "Warning: No icon file was provided. The default Python icon will be used. \
                 To add an icon, place a {name}.svg or {name}.png in {}",
                located.dir.display()
            );
            write_default_icon(&paths.build_dir)?
        }
    };

    let appdata_path = located.dir.join(format!("{name}.appdata.xml"));
    let appdata = if appdata_path.is_file() {
        Some(appdata_path)
    } else {
        println!(
            "Warning: No AppData file provided. Please add {} for desktop integration and indexing.",
            appdata_path.display()
        );
        None
    };

    let template_dirs = [located.dir.clone(), project_dir.join(super::CONFIG_DIR)];
    let desktop_file = template_dirs
        .iter()
        .find_map(|dir| eject_mod::custom_desktop_file(dir, &name));
    let apprun = template_dirs.iter().find_map(|dir| eject_mod::custom_apprun(dir));

    let settings = ToolSettings::from_env()?;
    if !settings.has_fuse {
        println!("FUSE is not available; appimagetool will extract itself to run.");
    }
    let pipeline = Pipeline::new(settings)?;

    let request = BuildRequest {
        project_dir: project.project_dir.clone(),
        config: located.config,
        icon,
        appdata,
        desktop_file,
        apprun,
    };

    println!("Building {name}...");
    let outcome = pipeline.run(&request).await?;

    for step in &outcome.steps {
        println!("  {step}");
    }
    println!();

    match outcome.status {
        BuildStatus::Packed { artifact } => {
            println!("Built: {}", artifact.display());
            Ok(())
        }
        BuildStatus::PackFailed { exit_code, log } => {
            anyhow::bail!(
                "appimagetool exited with {exit_code}; see {} for details",
                log.display()
            )
        }
    }
}

/// `<dir>/<name>.png`, then `<dir>/<name>.svg`.
fn find_icon(dir: &Path, name: &str) -> Option<PathBuf> {
    ICON_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{name}.{ext}")))
        .find(|path| path.is_file())
}

fn write_default_icon(build_dir: &Path) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(build_dir)?;
    let path = build_dir.join(DEFAULT_ICON_FILE);
    std::fs::write(&path, DEFAULT_ICON)?;
    Ok(path)
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt}");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim(), "y" | "Y" | "yes" | "YES"))
}
