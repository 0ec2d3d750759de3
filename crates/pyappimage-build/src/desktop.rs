use pyappimage_core::AppConfig;

/// Generates the freedesktop `.desktop` entry placed at the AppDir root.
pub struct DesktopEntryGenerator<'a> {
    app: &'a AppConfig,
    icon: &'a str,
}

impl<'a> DesktopEntryGenerator<'a> {
    /// `icon` is the icon name without extension; see [`icon_stem`].
    pub fn new(app: &'a AppConfig, icon: &'a str) -> Self {
        Self { app, icon }
    }

    pub fn render(&self) -> String {
        let mut categories = self.app.categories.join(";");
        categories.push(';');

        format!(
            "[Desktop Entry]
Name={generic_name}
GenericName={bin}
Comment={comment}
Exec={bin}
Icon={icon}
Type=Application
Categories={categories}
StartupWMClass={bin}
",
            generic_name = self.app.generic_name,
            bin = self.app.name,
            comment = self.app.description,
            icon = self.icon,
            categories = categories,
        )
    }
}

/// Icon file name up to its first `.`: `Demo.png` → `Demo`.
pub fn icon_stem(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}
