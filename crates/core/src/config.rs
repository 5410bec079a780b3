use serde::Deserialize;

use crate::types::Platform;

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `WEBPRO__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Skip every live call and serve synthetic data.
    #[serde(default)]
    pub use_mock_data: bool,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub mock: MockConfig,
    #[serde(default)]
    pub branding: BrandingConfig,
    #[serde(default)]
    pub resources: ResourceConfig,
}

/// Backend proxy the adapters talk to.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub fallback_url: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub bearer_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MockConfig {
    #[serde(default = "default_simulate_latency")]
    pub simulate_latency: bool,
    /// Fixed seed for reproducible synthetic data.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrandingConfig {
    #[serde(default = "default_company_name")]
    pub company_name: String,
    #[serde(default = "default_primary_color")]
    pub primary_color: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default = "default_footer_text")]
    pub footer_text: String,
}

/// Per-platform resource identifiers (location, site, organization, ...).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub gmb_location_id: Option<String>,
    #[serde(default)]
    pub search_console_site_url: Option<String>,
    #[serde(default)]
    pub linkedin_organization_id: Option<String>,
    #[serde(default)]
    pub x_account_id: Option<String>,
    #[serde(default)]
    pub shopify_store_id: Option<String>,
    #[serde(default)]
    pub hubspot_portal_id: Option<String>,
}

impl ResourceConfig {
    pub fn resource_for(&self, platform: Platform) -> Option<&str> {
        match platform {
            Platform::Gmb => self.gmb_location_id.as_deref(),
            Platform::SearchConsole => self.search_console_site_url.as_deref(),
            Platform::LinkedIn => self.linkedin_organization_id.as_deref(),
            Platform::X => self.x_account_id.as_deref(),
            Platform::Shopify => self.shopify_store_id.as_deref(),
            Platform::HubSpot => self.hubspot_portal_id.as_deref(),
        }
    }

    /// Platforms with a configured resource id.
    pub fn configured(&self) -> Vec<(Platform, String)> {
        Platform::ALL
            .iter()
            .filter_map(|p| self.resource_for(*p).map(|id| (*p, id.to_string())))
            .collect()
    }
}

// Default functions
fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}
fn default_timeout_ms() -> u64 {
    15_000
}
fn default_simulate_latency() -> bool {
    true
}
fn default_company_name() -> String {
    "WebProMetrics".to_string()
}
fn default_primary_color() -> String {
    "#3b82f6".to_string()
}
fn default_footer_text() -> String {
    "Powered by WebProMetrics".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            fallback_url: None,
            timeout_ms: default_timeout_ms(),
            bearer_token: None,
        }
    }
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            simulate_latency: default_simulate_latency(),
            seed: None,
        }
    }
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            company_name: default_company_name(),
            primary_color: default_primary_color(),
            logo_url: None,
            footer_text: default_footer_text(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            use_mock_data: false,
            api: ApiConfig::default(),
            mock: MockConfig::default(),
            branding: BrandingConfig::default(),
            resources: ResourceConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional config file and environment
    /// variables. Environment values win over the file.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        let config = builder
            .add_source(
                config::Environment::with_prefix("WEBPRO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        config.try_deserialize()
    }
}
