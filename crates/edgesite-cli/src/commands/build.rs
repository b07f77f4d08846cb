use edgesite_pack::TransformKind;

use super::{load_config, prepare};

pub fn build(config: &str, format: &str, transform: TransformKind) -> anyhow::Result<()> {
    let site = load_config(config, &[])?;
    let prepared = prepare(&site, transform)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&prepared.built)?);
        }
        _ => {
            println!(
                "✓ Built {} function ({} headers)",
                prepared.built.transform,
                site.headers.len()
            );
            println!("  Fingerprint: {}", prepared.built.fingerprint);
            println!("  Version tag: {} ({})", prepared.tag, site.function.versioning.label());
            println!();
            print!("{}", prepared.built.source);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testutil::{SITE_TOML, write_site};

    #[test]
    fn test_build_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_site(dir.path(), SITE_TOML);

        build(&config, "text", TransformKind::LambdaEdge).unwrap();
        build(&config, "json", TransformKind::Rules).unwrap();
    }

    #[test]
    fn test_build_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml").display().to_string();
        let err = build(&missing, "text", TransformKind::LambdaEdge).unwrap_err();
        assert!(err.to_string().contains("failed to load"));
    }
}
