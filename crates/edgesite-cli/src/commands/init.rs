use anyhow::bail;
use edgesite_core::SiteConfig;
use std::path::Path;

pub fn init(path: &str, domain: &str, sub_domain: &str) -> anyhow::Result<()> {
    let output = Path::new(path).join("site.toml");
    if output.exists() {
        bail!("{} already exists", output.display());
    }

    let config = SiteConfig::scaffold(domain, sub_domain);
    std::fs::create_dir_all(path)?;
    std::fs::write(&output, config.to_toml_string()?)?;

    println!("✓ Generated {}", output.display());
    println!("  Site: https://{sub_domain}.{domain}");
    println!("  Headers: {}", config.headers.len());
    Ok(())
}
