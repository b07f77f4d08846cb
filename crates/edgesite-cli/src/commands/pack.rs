use edgesite_pack::TransformKind;
use std::path::Path;

use super::{load_config, prepare};

pub fn pack(config: &str, out: &str, transform: TransformKind) -> anyhow::Result<()> {
    let site = load_config(config, &[])?;
    let prepared = prepare(&site, transform)?;

    match edgesite_pack::write_package(Path::new(out), &prepared.package, &prepared.tag) {
        Ok(result) => {
            println!("✓ Packaged {} ({} bytes)", prepared.package.name, result.size_bytes);
            println!("  Output: {}", result.output_path);
            println!("  Tag:    {}", prepared.tag);
            println!("  SHA256: {}", result.sha256);
            Ok(())
        }
        Err(e) => {
            eprintln!("Pack failed: {e}");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testutil::{SITE_TOML, write_site};

    #[test]
    fn test_pack_writes_function_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_site(dir.path(), SITE_TOML);
        let out = dir.path().join("dist");

        pack(&config, &out.display().to_string(), TransformKind::LambdaEdge).unwrap();

        let source = std::fs::read_to_string(out.join("index.js")).unwrap();
        assert!(source.contains(r#"headers["x-frame-options"]"#));
        assert!(out.join("manifest.json").is_file());
    }

    #[test]
    fn test_pack_rejects_bad_function_settings() {
        let dir = tempfile::tempdir().unwrap();
        let toml = format!("{SITE_TOML}\n[function]\nmemory_mb = 64\n");
        let config = write_site(dir.path(), &toml);

        let err = pack(&config, "unused", TransformKind::LambdaEdge).unwrap_err();
        assert!(err.to_string().contains("invalid memory size"));
    }
}
