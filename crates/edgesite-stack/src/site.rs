//! Static site behind a CDN with the header function on viewer responses.

use edgesite_core::{EdgeEvent, FunctionPackage, Site};
use serde_json::{Value, json};
use tracing::debug;

use crate::assets::AssetManifest;
use crate::redirect::add_apex_redirect;
use crate::template::{Resource, Template, attribute, reference};

pub mod kind {
    pub const FUNCTION: &str = "edge::Function";
    pub const FUNCTION_VERSION: &str = "edge::FunctionVersion";
    pub const BUCKET: &str = "storage::Bucket";
    pub const CERTIFICATE: &str = "tls::Certificate";
    pub const DISTRIBUTION: &str = "cdn::Distribution";
    pub const ALIAS_RECORD: &str = "dns::AliasRecord";
    pub const HTTPS_REDIRECT: &str = "dns::HttpsRedirect";
    pub const BUCKET_DEPLOYMENT: &str = "storage::BucketDeployment";
}

pub const HEADERS_FUNCTION: &str = "HeadersFunction";
pub const SITE_BUCKET: &str = "SiteBucket";
pub const SITE_CERTIFICATE: &str = "SiteCertificate";
pub const SITE_DISTRIBUTION: &str = "SiteDistribution";
pub const SITE_ALIAS_RECORD: &str = "SiteAliasRecord";
pub const DEPLOY_WITH_INVALIDATION: &str = "DeployWithInvalidation";

const INDEX_DOCUMENT: &str = "index.html";
const ERROR_CACHING_MIN_TTL_SECS: u64 = 86_400;

/// Logical id of the function version resource for `tag`.
///
/// The id moves with the tag so that changed headers always produce a new
/// version resource instead of an in-place update.
pub fn version_logical_id(tag: &str) -> String {
    let suffix: String = tag
        .chars()
        .filter_map(|c| match c {
            '-' => Some('M'),
            c if c.is_ascii_alphanumeric() => Some(c),
            _ => None,
        })
        .take(16)
        .collect();
    format!("HeadersFunctionVersion{suffix}")
}

/// Build the full resource graph for `site`.
pub fn synthesize(
    site: &Site,
    package: &FunctionPackage,
    tag: &str,
    assets: Option<&AssetManifest>,
) -> Template {
    let site_domain = site.site_domain();
    let version_id = version_logical_id(tag);
    let mut template = Template::default();

    template.add_resource(
        HEADERS_FUNCTION,
        Resource::new(
            kind::FUNCTION,
            json!({
                "name": package.name,
                "runtime": package.runtime,
                "handler": package.handler,
                "memory_mb": package.memory_mb,
                "region": site.region,
                "code": {
                    "file_name": package.file_name,
                    "inline": package.source,
                },
            }),
        ),
    );
    template.add_resource(
        &version_id,
        Resource::new(
            kind::FUNCTION_VERSION,
            json!({
                "function": reference(HEADERS_FUNCTION),
                "tag": tag,
            }),
        ),
    );

    template.add_resource(
        SITE_BUCKET,
        Resource::new(
            kind::BUCKET,
            json!({
                "bucket_name": site_domain,
                "website": {
                    "index_document": INDEX_DOCUMENT,
                    "error_document": INDEX_DOCUMENT,
                },
                "public_read": true,
                "removal_policy": "retain",
            }),
        ),
    );

    template.add_resource(
        SITE_CERTIFICATE,
        Resource::new(
            kind::CERTIFICATE,
            json!({
                "domain_name": site_domain,
                "validation": "dns",
                "hosted_zone": site.domain_name,
            }),
        ),
    );

    template.add_resource(
        SITE_DISTRIBUTION,
        Resource::new(
            kind::DISTRIBUTION,
            json!({
                "aliases": [site_domain],
                "viewer_certificate": {
                    "certificate": attribute(SITE_CERTIFICATE, "arn"),
                    "ssl_support_method": "sni-only",
                    "minimum_protocol_version": "TLSv1.2_2019",
                },
                "error_responses": [error_response(403), error_response(404)],
                "origins": [{
                    "bucket": reference(SITE_BUCKET),
                    "default_behavior": {
                        "function_associations": [{
                            "event_type": EdgeEvent::ViewerResponse.as_str(),
                            "function_version": reference(&version_id),
                        }],
                    },
                }],
            }),
        ),
    );

    template.add_resource(
        SITE_ALIAS_RECORD,
        Resource::new(
            kind::ALIAS_RECORD,
            json!({
                "record_name": site_domain,
                "record_type": "A",
                "hosted_zone": site.domain_name,
                "target": reference(SITE_DISTRIBUTION),
            }),
        ),
    );

    add_apex_redirect(&mut template, site);

    let mut source = json!({ "path": site.assets });
    if let Some(manifest) = assets {
        source["digest"] = json!(manifest.digest);
        source["files"] = json!(manifest.files.len());
        source["size_bytes"] = json!(manifest.total_bytes());
    }
    template.add_resource(
        DEPLOY_WITH_INVALIDATION,
        Resource::new(
            kind::BUCKET_DEPLOYMENT,
            json!({
                "sources": [source],
                "destination_bucket": reference(SITE_BUCKET),
                "distribution": reference(SITE_DISTRIBUTION),
                "distribution_paths": ["/*"],
            }),
        ),
    );

    template.add_output("Site", json!(site.site_url()));
    template.add_output("Bucket", json!(site_domain));
    template.add_output("Certificate", attribute(SITE_CERTIFICATE, "arn"));
    template.add_output("DistributionId", attribute(SITE_DISTRIBUTION, "id"));
    template.add_output("HeadersFunctionVersion", attribute(&version_id, "arn"));

    debug!(
        site = %site_domain,
        resources = template.resources.len(),
        %version_id,
        "template synthesized"
    );
    template
}

/// Both 403 and 404 answer 403 with the index page, cached for a day.
fn error_response(code: u16) -> Value {
    json!({
        "error_code": code,
        "response_code": 403,
        "response_page_path": format!("/{INDEX_DOCUMENT}"),
        "error_caching_min_ttl": ERROR_CACHING_MIN_TTL_SECS,
    })
}
