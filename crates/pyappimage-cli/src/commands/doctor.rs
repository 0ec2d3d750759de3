use pyappimage_core::{BuildConfig, ToolSettings};
use pyappimage_tools::{APPIMAGETOOL, CONTINUOUS_TAG, CheckResult, ReleaseProvisioner, ToolClient};
use std::path::Path;

pub async fn doctor() -> anyhow::Result<()> {
    let settings = match ToolSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            println!();
            println!("  [NG] python        {e}");
            anyhow::bail!("python3 is required; see above for details");
        }
    };

    let appimagetool = match ReleaseProvisioner::new() {
        Ok(provisioner) => Some(
            provisioner
                .with_override(settings.appimagetool.clone())
                .cached_path(APPIMAGETOOL, CONTINUOUS_TAG),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "no cache directory for appimagetool");
            settings.appimagetool.clone()
        }
    };

    let client = ToolClient::new();
    let mut report = client.doctor(&settings, appimagetool.as_deref()).await;

    report.config_file = match BuildConfig::discover(Path::new(".")) {
        Ok(located) => CheckResult::ok(&format!("Found {}", located.path.display())),
        Err(e) => CheckResult::fail(&e.to_string()),
    };

    println!();
    println!("{report}");

    if !report.all_passed() {
        anyhow::bail!("some checks failed; see above for details");
    }

    Ok(())
}
