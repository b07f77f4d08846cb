pub mod config;
pub mod context;
pub mod header;
pub mod types;

pub use config::{ConfigError, FunctionConfig, Site, SiteConfig};
pub use context::{ContextKey, ContextOverride};
pub use header::{HeaderError, HeaderRule, HeaderSet};
pub use types::*;
