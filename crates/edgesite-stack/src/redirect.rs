//! Apex-to-site HTTPS redirect.

use edgesite_core::Site;
use serde_json::json;

use crate::site::kind;
use crate::template::{Resource, Template, attribute};

pub const REDIRECT: &str = "Redirect";
pub const REDIRECT_CERTIFICATE: &str = "RedirectCertificate";

/// Redirect `https://{domain_name}` to the site domain. Only `www` sites
/// get one.
pub(crate) fn add_apex_redirect(template: &mut Template, site: &Site) {
    if !site.redirects_apex() {
        return;
    }

    template.add_resource(
        REDIRECT_CERTIFICATE,
        Resource::new(
            kind::CERTIFICATE,
            json!({
                "domain_name": site.domain_name,
                "validation": "dns",
                "hosted_zone": site.domain_name,
            }),
        ),
    );
    template.add_resource(
        REDIRECT,
        Resource::new(
            kind::HTTPS_REDIRECT,
            json!({
                "record_names": [site.domain_name],
                "target_domain": site.site_domain(),
                "hosted_zone": site.domain_name,
                "certificate": attribute(REDIRECT_CERTIFICATE, "arn"),
            }),
        ),
    );
}
