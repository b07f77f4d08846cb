//! edgesite stack: provider-neutral resource graph for a static site
//! served through a CDN, with the generated header function bound to
//! viewer responses.

pub mod assets;
pub mod redirect;
pub mod site;
pub mod template;

pub use assets::{AssetFile, AssetManifest};
pub use site::{synthesize, version_logical_id};
pub use template::{Output, Resource, Template};
