use pyappimage_build::{AppRunGenerator, DesktopEntryGenerator};
use pyappimage_core::BuildConfig;
use std::path::Path;

pub async fn eject() -> anyhow::Result<()> {
    let located = BuildConfig::discover(Path::new("."))?;
    let (app, _) = located.config.split()?;

    // the build looks for <name>.png or <name>.svg, so the icon is named after the app
    let desktop_entry = DesktopEntryGenerator::new(&app, &app.name).render();
    let apprun = AppRunGenerator::new(&app.name, &app.environment).render();

    let config_dir = Path::new(super::CONFIG_DIR);
    if pyappimage_build::eject::is_ejected(config_dir, &app.name) {
        anyhow::bail!(
            "templates already ejected to {}/; edit them directly or delete them to eject again",
            config_dir.display()
        );
    }
    let written = pyappimage_build::eject::eject(config_dir, &app.name, &desktop_entry, &apprun)?;

    for path in &written {
        println!("Ejected {}", path.display());
    }
    println!("You can now edit them directly. pyappimage build will use these files.");
    Ok(())
}
