//! site.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::context::{ContextKey, ContextOverride};
use crate::header::HeaderSet;
use crate::types::VersioningStrategy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("account not set. Use -c account=<your AWS account number>")]
    MissingAccount,

    #[error("domainName not set. Use -c domainName=yoursite.com")]
    MissingDomainName,

    #[error("subDomain not set. Use -c subDomain=www")]
    MissingSubDomain,

    #[error("unknown context key {0:?}. Supported: domainName, subDomain, account, assets, region")]
    UnknownContextKey(String),

    #[error("invalid context pair {0:?}: expected key=value")]
    InvalidContextPair(String),

    #[error("invalid function name {0:?}: use 1-64 ASCII letters, digits, '-' or '_'")]
    InvalidFunctionName(String),

    #[error("invalid memory size {0} MB: must be between 128 and 10240")]
    InvalidMemory(u32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub site: SiteSection,
    #[serde(default)]
    pub function: FunctionConfig,
    #[serde(default)]
    pub headers: HeaderSet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_domain: Option<String>,
    #[serde(default = "default_assets")]
    pub assets: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
}

/// Settings for the generated response-header function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionConfig {
    pub name: String,
    pub runtime: String,
    pub memory_mb: u32,
    pub versioning: VersioningStrategy,
}

impl Default for FunctionConfig {
    fn default() -> Self {
        Self {
            name: "headers".to_string(),
            runtime: "nodejs14.x".to_string(),
            memory_mb: 128,
            versioning: VersioningStrategy::Explicit,
        }
    }
}

fn default_assets() -> String {
    "./build".to_string()
}

// Edge functions must be created in us-east-1.
fn default_region() -> String {
    "us-east-1".to_string()
}

/// A site definition with every required setting present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub domain_name: String,
    pub sub_domain: String,
    pub account: String,
    pub region: String,
    pub assets: String,
}

impl Site {
    /// `{sub_domain}.{domain_name}`
    pub fn site_domain(&self) -> String {
        format!("{}.{}", self.sub_domain, self.domain_name)
    }

    pub fn site_url(&self) -> String {
        format!("https://{}", self.site_domain())
    }

    /// A `www` site also serves the bare apex domain as an HTTPS redirect.
    pub fn redirects_apex(&self) -> bool {
        self.sub_domain == "www"
    }
}

impl SiteConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SiteConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Scaffold a site.toml carrying the default security headers.
    pub fn scaffold(domain_name: &str, sub_domain: &str) -> Self {
        SiteConfig {
            site: SiteSection {
                domain_name: Some(domain_name.to_string()),
                sub_domain: Some(sub_domain.to_string()),
                assets: default_assets(),
                account: None,
                region: default_region(),
            },
            function: FunctionConfig::default(),
            headers: HeaderSet::security_defaults(),
        }
    }

    pub fn apply_context(&mut self, overrides: &[ContextOverride]) {
        for o in overrides {
            let value = o.value.clone();
            match o.key {
                ContextKey::DomainName => self.site.domain_name = Some(value),
                ContextKey::SubDomain => self.site.sub_domain = Some(value),
                ContextKey::Account => self.site.account = Some(value),
                ContextKey::Assets => self.site.assets = value,
                ContextKey::Region => self.site.region = value,
            }
        }
    }

    /// Check the function settings on their own; needed before anything is generated.
    pub fn validate_function(&self) -> Result<(), ConfigError> {
        let FunctionConfig { name, memory_mb, .. } = &self.function;
        let name_ok = !name.is_empty()
            && name.len() <= 64
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !name_ok {
            return Err(ConfigError::InvalidFunctionName(name.clone()));
        }
        if !(128..=10240).contains(memory_mb) {
            return Err(ConfigError::InvalidMemory(*memory_mb));
        }
        Ok(())
    }

    /// Resolve the full site definition, reporting the first missing setting.
    pub fn validate(&self) -> Result<Site, ConfigError> {
        let account = non_empty(&self.site.account).ok_or(ConfigError::MissingAccount)?;
        let domain_name =
            non_empty(&self.site.domain_name).ok_or(ConfigError::MissingDomainName)?;
        let sub_domain = non_empty(&self.site.sub_domain).ok_or(ConfigError::MissingSubDomain)?;
        self.validate_function()?;

        Ok(Site {
            domain_name,
            sub_domain,
            account,
            region: self.site.region.clone(),
            assets: self.site.assets.clone(),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
}
