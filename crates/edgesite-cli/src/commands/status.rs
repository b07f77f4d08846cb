use anyhow::{Result, bail};
use edgesite_state::{EdgeBinding, FunctionVersion, StateStore};
use serde_json::json;
use std::path::Path;

pub fn status(state: &str, format: &str) -> Result<()> {
    let path = Path::new(state);
    if !path.exists() {
        bail!("no state at {state}; run `edgesite deploy` first");
    }
    let store = StateStore::open(path)?;
    let report = collect(&store)?;

    match format {
        "json" => {
            let entries: Vec<_> = report
                .iter()
                .map(|(binding, versions)| json!({ "binding": binding, "versions": versions }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        _ => {
            if report.is_empty() {
                println!("No edge bindings.");
            }
            for (binding, versions) in &report {
                println!("{} {}", binding.distribution, binding.event);
                println!("  Bound: {} (tag {})", binding.version, binding.version.tag);
                if let Some(previous) = &binding.previous {
                    println!("  Previous: {previous}");
                }
                for v in versions {
                    let marker = if v.number == binding.version.number { "*" } else { " " };
                    let short_sha = &v.sha256[..12.min(v.sha256.len())];
                    println!("  {marker} {}:{}  {}  {short_sha}", v.function, v.number, v.tag);
                }
            }
        }
    }
    Ok(())
}

fn collect(store: &StateStore) -> Result<Vec<(EdgeBinding, Vec<FunctionVersion>)>> {
    let mut report = Vec::new();
    for binding in store.list_bindings()? {
        let versions = store.list_versions(&binding.version.function)?;
        report.push((binding, versions));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::deploy;
    use crate::commands::testutil::{SITE_TOML, write_site};
    use edgesite_core::ContextOverride;

    #[test]
    fn test_status_after_deploy() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_site(dir.path(), SITE_TOML);
        let state = dir.path().join("state.redb").display().to_string();
        let context = [ContextOverride::parse("account=1").unwrap()];
        deploy::run(&config, &context, &state).unwrap();

        let store = StateStore::open(Path::new(&state)).unwrap();
        let report = collect(&store).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].0.distribution, "www.example.com");
        assert_eq!(report[0].1.len(), 1);
        drop(store);

        status(&state, "text").unwrap();
        status(&state, "json").unwrap();
    }

    #[test]
    fn test_status_without_state() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("none.redb").display().to_string();
        assert!(status(&missing, "text").is_err());
    }
}
