use anyhow::{Context, Result};
use edgesite_core::{ContextOverride, EdgeEvent};
use edgesite_pack::TransformKind;
use edgesite_rollout::{LocalHost, Rollout, RolloutOutcome};
use edgesite_state::StateStore;
use std::path::Path;

use super::{load_config, prepare};

pub fn deploy(config: &str, context: &[ContextOverride], state: &str) -> Result<()> {
    let (site_domain, outcome) = run(config, context, state)?;

    if outcome.rebound {
        println!("✓ Deployed {} to {site_domain}", outcome.version);
        match &outcome.previous {
            Some(previous) => println!("  Previous: {previous} (still published)"),
            None => println!("  Previous: none"),
        }
    } else {
        println!("✓ {site_domain} already runs {}; nothing to do", outcome.version);
    }
    println!("  Tag: {}", outcome.version.tag);
    println!("  New version: {}", if outcome.created { "yes" } else { "no" });
    Ok(())
}

pub(crate) fn run(
    config: &str,
    context: &[ContextOverride],
    state: &str,
) -> Result<(String, RolloutOutcome)> {
    let site_config = load_config(config, context)?;
    let site = site_config.validate()?;
    let prepared = prepare(&site_config, TransformKind::LambdaEdge)?;

    let state_path = Path::new(state);
    if let Some(parent) = state_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let store = StateStore::open(state_path)?;
    let host = LocalHost::new(store);

    let site_domain = site.site_domain();
    let mut rollout = Rollout::new(
        &site_domain,
        EdgeEvent::ViewerResponse,
        prepared.package,
        &prepared.tag,
    );
    let outcome = rollout.execute(&host)?;
    Ok((site_domain, outcome))
}
