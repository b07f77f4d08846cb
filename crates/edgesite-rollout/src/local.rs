//! [`FunctionHost`] backed by the local state ledger.

use edgesite_core::{EdgeEvent, FunctionPackage, VersionRef};
use edgesite_state::{EdgeBinding, StateStore, epoch_secs};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::host::{FunctionHost, HostError, PublishOutcome};

#[derive(Clone)]
pub struct LocalHost {
    store: StateStore,
}

impl LocalHost {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }
}

impl FunctionHost for LocalHost {
    fn publish(&self, package: &FunctionPackage, tag: &str) -> Result<PublishOutcome, HostError> {
        if tag.is_empty() {
            return Err(HostError::Rejected(format!(
                "empty version tag for {}",
                package.name
            )));
        }
        let sha256 = hex::encode(Sha256::digest(package.source.as_bytes()));
        let (version, created) =
            self.store
                .publish_version(&package.name, tag, &sha256, &package.source)?;
        Ok(PublishOutcome {
            version: version.version_ref(),
            created,
        })
    }

    fn binding(
        &self,
        distribution: &str,
        event: EdgeEvent,
    ) -> Result<Option<VersionRef>, HostError> {
        Ok(self
            .store
            .get_binding(distribution, event)?
            .map(|binding| binding.version))
    }

    fn bind(
        &self,
        distribution: &str,
        event: EdgeEvent,
        version: &VersionRef,
    ) -> Result<(), HostError> {
        let previous = match self.store.get_binding(distribution, event)? {
            Some(current) if &current.version == version => current.previous,
            Some(current) => Some(current.version),
            None => None,
        };

        // Only versions this host published can be bound.
        if self.store.get_version(&version.function, &version.tag)?.is_none() {
            return Err(HostError::Rejected(format!("unknown version {version}")));
        }

        self.store.put_binding(&EdgeBinding {
            distribution: distribution.to_string(),
            event,
            version: version.clone(),
            previous,
            updated_at: epoch_secs(),
        })?;
        debug!(%distribution, %event, %version, "edge hook bound");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(source: &str) -> FunctionPackage {
        FunctionPackage {
            name: "headers".to_string(),
            runtime: "nodejs14.x".to_string(),
            handler: "index.handler".to_string(),
            memory_mb: 128,
            file_name: "index.js".to_string(),
            source: source.to_string(),
        }
    }

    fn host() -> LocalHost {
        LocalHost::new(StateStore::open_in_memory().unwrap())
    }

    #[test]
    fn publish_is_idempotent_per_tag() {
        let host = host();
        let first = host.publish(&package("a"), "1").unwrap();
        let again = host.publish(&package("a"), "1").unwrap();
        assert!(first.created);
        assert!(!again.created);
        assert_eq!(first.version, again.version);
    }

    #[test]
    fn publish_refuses_new_source_under_taken_tag() {
        let host = host();
        host.publish(&package("x: Aa"), "1").unwrap();

        let err = host.publish(&package("x: BB"), "1").unwrap_err();
        assert!(matches!(
            err,
            HostError::State(edgesite_state::StateError::TagConflict { .. })
        ));
    }

    #[test]
    fn publish_rejects_empty_tag() {
        let err = host().publish(&package("a"), "").unwrap_err();
        assert!(matches!(err, HostError::Rejected(_)));
    }

    #[test]
    fn bind_records_previous_version() {
        let host = host();
        let v1 = host.publish(&package("a"), "1").unwrap().version;
        let v2 = host.publish(&package("b"), "2").unwrap().version;

        host.bind("site", EdgeEvent::ViewerResponse, &v1).unwrap();
        host.bind("site", EdgeEvent::ViewerResponse, &v2).unwrap();

        let binding = host
            .store()
            .get_binding("site", EdgeEvent::ViewerResponse)
            .unwrap()
            .unwrap();
        assert_eq!(binding.version, v2);
        assert_eq!(binding.previous, Some(v1));
    }

    #[test]
    fn bind_rejects_unpublished_version() {
        let host = host();
        let ghost = VersionRef {
            function: "headers".to_string(),
            number: 7,
            tag: "nope".to_string(),
        };
        let err = host
            .bind("site", EdgeEvent::ViewerResponse, &ghost)
            .unwrap_err();
        assert!(matches!(err, HostError::Rejected(_)));
        assert!(host
            .binding("site", EdgeEvent::ViewerResponse)
            .unwrap()
            .is_none());
    }
}
