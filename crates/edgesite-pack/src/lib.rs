//! edgesite pack: generate, fingerprint and package the response-header
//! edge function.
//!
//! [`build`] turns the configured headers into function source plus a
//! fingerprint. [`package`] attaches runtime settings, and [`write_package`]
//! lays the result out on disk for inspection or upload.

use anyhow::{Context, Result};
use edgesite_core::{FunctionConfig, FunctionPackage, HeaderSet, VersioningStrategy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

mod fingerprint;
pub mod transform;

pub use fingerprint::{checksum, content_digest};
pub use transform::{
    HeaderRuleDocument, LambdaEdgeTemplate, ResponseHeaderTransform, TransformKind,
};

/// Generated function source and its fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuiltFunction {
    pub transform: &'static str,
    pub file_name: &'static str,
    pub handler: &'static str,
    pub source: String,
    /// [`checksum`] of `source`.
    pub fingerprint: String,
}

pub struct FunctionBuilder<T> {
    transform: T,
}

impl<T: ResponseHeaderTransform> FunctionBuilder<T> {
    pub fn new(transform: T) -> Self {
        Self { transform }
    }

    pub fn build(&self, headers: &HeaderSet) -> BuiltFunction {
        let source = self.transform.render(headers);
        let fingerprint = checksum(&source);
        debug!(
            transform = self.transform.name(),
            headers = headers.len(),
            %fingerprint,
            "built response-header function"
        );
        BuiltFunction {
            transform: self.transform.name(),
            file_name: self.transform.file_name(),
            handler: self.transform.handler(),
            source,
            fingerprint,
        }
    }
}

impl FunctionBuilder<Box<dyn ResponseHeaderTransform>> {
    pub fn for_kind(kind: TransformKind) -> Self {
        Self::new(kind.transform())
    }
}

impl<T: ResponseHeaderTransform + ?Sized> ResponseHeaderTransform for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn file_name(&self) -> &'static str {
        (**self).file_name()
    }

    fn handler(&self) -> &'static str {
        (**self).handler()
    }

    fn render(&self, headers: &HeaderSet) -> String {
        (**self).render(headers)
    }
}

/// Build the Lambda@Edge handler for `headers`.
pub fn build(headers: &HeaderSet) -> BuiltFunction {
    FunctionBuilder::new(LambdaEdgeTemplate).build(headers)
}

/// Combine generated source with the configured runtime settings.
pub fn package(function: &FunctionConfig, built: &BuiltFunction) -> FunctionPackage {
    FunctionPackage {
        name: function.name.clone(),
        runtime: function.runtime.clone(),
        handler: built.handler.to_string(),
        memory_mb: function.memory_mb,
        file_name: built.file_name.to_string(),
        source: built.source.clone(),
    }
}

pub trait PackageExt {
    /// Identity token a version of this package is published under.
    fn version_tag(&self, strategy: VersioningStrategy, fingerprint: &str) -> String;
}

impl PackageExt for FunctionPackage {
    fn version_tag(&self, strategy: VersioningStrategy, fingerprint: &str) -> String {
        match strategy {
            VersioningStrategy::Explicit => fingerprint.to_string(),
            VersioningStrategy::Delegated => content_digest(self),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PackManifest {
    pub name: String,
    pub runtime: String,
    pub handler: String,
    pub memory_mb: u32,
    pub file_name: String,
    pub tag: String,
    pub sha256: String,
}

#[derive(Debug)]
pub struct PackResult {
    pub output_path: String,
    pub size_bytes: u64,
    pub sha256: String,
}

/// Write the package source and a `manifest.json` into `dir`.
pub fn write_package(dir: &Path, package: &FunctionPackage, tag: &str) -> Result<PackResult> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let output_path = dir.join(&package.file_name);
    fs::write(&output_path, &package.source)
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    let sha256 = fingerprint::sha256_hex(package.source.as_bytes());
    let manifest = PackManifest {
        name: package.name.clone(),
        runtime: package.runtime.clone(),
        handler: package.handler.clone(),
        memory_mb: package.memory_mb,
        file_name: package.file_name.clone(),
        tag: tag.to_string(),
        sha256: sha256.clone(),
    };
    let manifest_path = dir.join("manifest.json");
    fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
        .with_context(|| format!("failed to write {}", manifest_path.display()))?;

    let size_bytes = fs::metadata(&output_path)?.len();
    info!(
        path = %output_path.display(),
        size_bytes,
        %tag,
        "packaged {}", package.name
    );

    Ok(PackResult {
        output_path: output_path.display().to_string(),
        size_bytes,
        sha256,
    })
}
