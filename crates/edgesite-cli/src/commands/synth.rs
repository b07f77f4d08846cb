use anyhow::Result;
use edgesite_core::ContextOverride;
use edgesite_pack::TransformKind;
use edgesite_stack::{AssetManifest, Template};
use tracing::warn;

use super::{load_config, prepare, resolve_assets};

pub fn synth(config: &str, context: &[ContextOverride], out: Option<&str>) -> Result<()> {
    let template = synthesize(config, context)?;
    let json = template.to_json_pretty()?;

    match out {
        Some(path) => {
            std::fs::write(path, json)?;
            println!("✓ Wrote {} resources to {path}", template.resources.len());
        }
        None => println!("{json}"),
    }
    Ok(())
}

pub(crate) fn synthesize(config: &str, context: &[ContextOverride]) -> Result<Template> {
    let site_config = load_config(config, context)?;
    let site = site_config.validate()?;
    let prepared = prepare(&site_config, TransformKind::LambdaEdge)?;

    let assets_dir = resolve_assets(config, &site.assets);
    let manifest = if assets_dir.is_dir() {
        Some(AssetManifest::scan(&assets_dir)?)
    } else {
        warn!(assets = %assets_dir.display(), "asset directory missing; template carries no asset digest");
        None
    };

    Ok(edgesite_stack::synthesize(
        &site,
        &prepared.package,
        &prepared.tag,
        manifest.as_ref(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testutil::{SITE_TOML, write_site};

    fn ctx(pairs: &[&str]) -> Vec<ContextOverride> {
        pairs.iter().map(|p| ContextOverride::parse(p).unwrap()).collect()
    }

    #[test]
    fn test_synth_requires_account() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_site(dir.path(), SITE_TOML);

        let err = synthesize(&config, &[]).unwrap_err();
        assert!(err.to_string().contains("account not set"));
    }

    #[test]
    fn test_synth_with_context_includes_asset_digest() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_site(dir.path(), SITE_TOML);

        let template = synthesize(&config, &ctx(&["account=123456789012"])).unwrap();
        let deploy = &template.resource("DeployWithInvalidation").unwrap().properties;
        assert_eq!(deploy["sources"][0]["files"], 1);
        assert!(template.resource("Redirect").is_some());
        assert!(template.dangling_references().is_empty());
    }

    #[test]
    fn test_synth_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_site(dir.path(), SITE_TOML);
        let out = dir.path().join("template.json");

        synth(
            &config,
            &ctx(&["account=1", "subDomain=blog"]),
            Some(&out.display().to_string()),
        )
        .unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written["outputs"]["Site"]["value"], "https://blog.example.com");
        assert!(written["resources"].get("Redirect").is_none());
    }
}
