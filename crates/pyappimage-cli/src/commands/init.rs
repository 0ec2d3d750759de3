use pyappimage_core::config::CONFIG_FILES;
use serde::Serialize;
use std::path::Path;

/// Starter `pyappimage.json`. Keys not listed here are passed to PyInstaller.
#[derive(Debug, Serialize)]
struct StarterConfig {
    entrypoint: String,
    name: String,
    #[serde(rename = "generic-name")]
    generic_name: String,
    description: String,
    categories: Vec<String>,
    requirements: Vec<String>,
    #[serde(rename = "ignore-binaries")]
    ignore_binaries: Vec<String>,
    updateinformation: Option<String>,
}

impl StarterConfig {
    fn for_project(dir_name: &str) -> Self {
        let module = dir_name.replace(['-', ' ', '.'], "_").to_lowercase();
        Self {
            entrypoint: format!("{module}:main"),
            name: dir_name.to_owned(),
            generic_name: dir_name.to_owned(),
            description: "Python app generated using PyAppImage".to_owned(),
            categories: vec!["Utility".to_owned()],
            requirements: Vec::new(),
            ignore_binaries: Vec::new(),
            updateinformation: None,
        }
    }
}

/// Write a starter `pyappimage.json` into the current directory.
pub async fn init_project() -> anyhow::Result<()> {
    let config_path = Path::new(CONFIG_FILES[0]);
    if pyappimage_core::BuildConfig::discover(Path::new(".")).is_ok() {
        eprintln!("pyappimage config already exists, skipping");
        return Ok(());
    }

    let cwd = std::env::current_dir()?;
    let dir_name = cwd
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("app");

    let starter = StarterConfig::for_project(dir_name);
    let mut json = serde_json::to_string_pretty(&starter)?;
    json.push('\n');
    std::fs::write(config_path, json)?;
    println!("Created {}", config_path.display());

    println!();
    println!("Next steps:");
    println!();
    println!("  1. Point `entrypoint` at your `module:function`");
    println!("  2. Place {dir_name}.png or {dir_name}.svg next to it");
    println!("  3. Add PyInstaller options as extra keys, e.g. \"windowed\": true");
    println!("  4. Build:");
    println!("     pyappimage build");

    Ok(())
}
