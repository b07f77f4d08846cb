use anyhow::{Context, Result};
use edgesite_core::{ContextOverride, FunctionPackage, SiteConfig};
use edgesite_pack::{BuiltFunction, FunctionBuilder, PackageExt, TransformKind};
use std::path::{Path, PathBuf};

pub mod build;
pub mod deploy;
pub mod init;
pub mod pack;
pub mod status;
pub mod synth;

pub const DEFAULT_STATE_PATH: &str = ".edgesite/state.redb";

/// Load `site.toml` and apply command-line context on top of it.
pub(crate) fn load_config(path: &str, context: &[ContextOverride]) -> Result<SiteConfig> {
    let mut config = SiteConfig::from_file(Path::new(path))
        .with_context(|| format!("failed to load {path}"))?;
    config.apply_context(context);
    Ok(config)
}

/// Generated function, its package and the tag it publishes under.
pub(crate) struct Prepared {
    pub built: BuiltFunction,
    pub package: FunctionPackage,
    pub tag: String,
}

pub(crate) fn prepare(config: &SiteConfig, transform: TransformKind) -> Result<Prepared> {
    config.validate_function()?;
    let built = FunctionBuilder::for_kind(transform).build(&config.headers);
    let package = edgesite_pack::package(&config.function, &built);
    let tag = package.version_tag(config.function.versioning, &built.fingerprint);
    Ok(Prepared {
        built,
        package,
        tag,
    })
}

/// Asset paths in site.toml are relative to the file itself.
pub(crate) fn resolve_assets(config_path: &str, assets: &str) -> PathBuf {
    let assets = Path::new(assets);
    if assets.is_absolute() {
        return assets.to_path_buf();
    }
    Path::new(config_path)
        .parent()
        .unwrap_or(Path::new("."))
        .join(assets)
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::fs;
    use std::path::Path;

    pub const SITE_TOML: &str = r#"
[site]
domain_name = "example.com"
sub_domain = "www"
assets = "build"

[[headers]]
key = "X-Frame-Options"
value = "DENY"
"#;

    /// Write a site.toml (and a small build dir) into `dir`; returns the config path.
    pub fn write_site(dir: &Path, toml: &str) -> String {
        let config = dir.join("site.toml");
        fs::write(&config, toml).unwrap();
        fs::create_dir_all(dir.join("build")).unwrap();
        fs::write(dir.join("build/index.html"), "<html></html>").unwrap();
        config.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_assets_relative_to_config() {
        assert_eq!(
            resolve_assets("site/site.toml", "build"),
            Path::new("site").join("build")
        );
        assert_eq!(resolve_assets("site.toml", "/srv/www"), PathBuf::from("/srv/www"));
    }

    #[test]
    fn test_prepare_uses_configured_versioning() {
        let mut config = SiteConfig::scaffold("example.com", "www");
        let explicit = prepare(&config, TransformKind::LambdaEdge).unwrap();
        assert_eq!(explicit.tag, explicit.built.fingerprint);

        config.function.versioning = edgesite_core::VersioningStrategy::Delegated;
        let delegated = prepare(&config, TransformKind::LambdaEdge).unwrap();
        assert_eq!(delegated.tag.len(), 64);
        assert_eq!(delegated.built, explicit.built);
    }
}
