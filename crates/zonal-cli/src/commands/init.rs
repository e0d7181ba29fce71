use std::path::Path;

use zonal_core::ZonalSettings;

pub fn init(dir: &Path, store: &str) -> anyhow::Result<()> {
    let output = dir.join("zonal.toml");
    if output.exists() {
        anyhow::bail!("{} already exists", output.display());
    }
    let settings = ZonalSettings::scaffold(store);
    std::fs::write(&output, settings.to_toml_string()?)?;
    println!("✓ Generated {}", output.display());
    Ok(())
}
