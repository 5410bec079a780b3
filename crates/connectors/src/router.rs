//! Connector router: owns one adapter per platform and dispatches fetches.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};
use webpro_core::{AppConfig, DateRange, Platform, PlatformData, RandomSource, WebProResult};

use crate::adapter::{AdapterContext, PlatformAdapter};
use crate::gmb::{GmbAccount, GmbAdapter, GmbLocation};
use crate::hubspot::HubSpotAdapter;
use crate::linkedin::{LinkedInAdapter, LinkedInOrganization};
use crate::search_console::{SearchConsoleAdapter, SearchConsoleSite};
use crate::shopify::ShopifyAdapter;
use crate::transport::ProxyTransport;
use crate::x::XAdapter;

/// Linkable resources discovered through the proxy.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceDirectory {
    pub gmb_accounts: Vec<GmbAccount>,
    pub gmb_locations: Vec<GmbLocation>,
    pub search_console_sites: Vec<SearchConsoleSite>,
    pub linkedin_organizations: Vec<LinkedInOrganization>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_user: Option<serde_json::Value>,
}

/// All six adapters over one shared transport and mock generator.
pub struct ConnectorRouter {
    gmb: Arc<GmbAdapter>,
    search_console: Arc<SearchConsoleAdapter>,
    linkedin: Arc<LinkedInAdapter>,
    x: Arc<XAdapter>,
    shopify: Arc<ShopifyAdapter>,
    hubspot: Arc<HubSpotAdapter>,
}

impl ConnectorRouter {
    pub fn from_config(
        config: &AppConfig,
        transport: Arc<dyn ProxyTransport>,
        rng: Arc<RandomSource>,
    ) -> Self {
        let ctx = AdapterContext::new(config, transport, rng);
        info!(
            use_mock_data = config.use_mock_data,
            base_url = %config.api.base_url,
            "connector router initialized"
        );
        Self {
            gmb: Arc::new(GmbAdapter::new(ctx.clone())),
            search_console: Arc::new(SearchConsoleAdapter::new(ctx.clone())),
            linkedin: Arc::new(LinkedInAdapter::new(ctx.clone())),
            x: Arc::new(XAdapter::new(ctx.clone())),
            shopify: Arc::new(ShopifyAdapter::new(ctx.clone())),
            hubspot: Arc::new(HubSpotAdapter::new(ctx)),
        }
    }

    pub fn adapter(&self, platform: Platform) -> Arc<dyn PlatformAdapter> {
        match platform {
            Platform::Gmb => self.gmb.clone(),
            Platform::SearchConsole => self.search_console.clone(),
            Platform::LinkedIn => self.linkedin.clone(),
            Platform::X => self.x.clone(),
            Platform::Shopify => self.shopify.clone(),
            Platform::HubSpot => self.hubspot.clone(),
        }
    }

    pub async fn gmb_accounts(&self) -> Vec<GmbAccount> {
        self.gmb.list_accounts().await
    }

    pub async fn gmb_locations(&self, account_id: &str) -> Vec<GmbLocation> {
        self.gmb.list_locations(account_id).await
    }

    pub async fn search_console_sites(&self) -> WebProResult<Vec<SearchConsoleSite>> {
        self.search_console.list_sites().await
    }

    pub async fn linkedin_organizations(&self) -> WebProResult<Vec<LinkedInOrganization>> {
        self.linkedin.list_organizations().await
    }

    pub async fn x_user(&self) -> WebProResult<serde_json::Value> {
        self.x.get_user().await
    }

    pub async fn fetch(&self, platform: Platform, resource_id: &str, range: DateRange) -> PlatformData {
        self.adapter(platform).fetch_data(resource_id, range).await
    }

    /// Fetch several platforms concurrently. Every requested platform gets an
    /// entry; a task that panics leaves `None`.
    pub async fn fetch_all(
        &self,
        requests: &[(Platform, String)],
        range: DateRange,
    ) -> BTreeMap<String, Option<PlatformData>> {
        let mut results: BTreeMap<String, Option<PlatformData>> = requests
            .iter()
            .map(|(platform, _)| (platform.id().to_string(), None))
            .collect();

        let mut tasks = JoinSet::new();
        for (platform, resource_id) in requests {
            let adapter = self.adapter(*platform);
            let resource_id = resource_id.clone();
            tasks.spawn(async move { adapter.fetch_data(&resource_id, range).await });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(data) => {
                    results.insert(data.id.clone(), Some(data));
                }
                Err(e) => warn!(error = %e, "platform fetch task failed"),
            }
        }
        results
    }

    /// Accounts, locations, sites, organizations and the X profile the
    /// linked identities can see. Listing failures leave that section empty.
    pub async fn discover_resources(&self) -> ResourceDirectory {
        let gmb_accounts = self.gmb_accounts().await;
        let mut gmb_locations = Vec::new();
        for account in &gmb_accounts {
            gmb_locations.extend(self.gmb_locations(&account.name).await);
        }
        let search_console_sites = self.search_console_sites().await.unwrap_or_else(|e| {
            warn!(error = %e, "listing Search Console sites failed");
            Vec::new()
        });
        let linkedin_organizations = self.linkedin_organizations().await.unwrap_or_else(|e| {
            warn!(error = %e, "listing LinkedIn organizations failed");
            Vec::new()
        });
        let x_user = match self.x_user().await {
            Ok(user) if user.as_object().is_some_and(|o| !o.is_empty()) => Some(user),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "fetching X profile failed");
                None
            }
        };
        ResourceDirectory {
            gmb_accounts,
            gmb_locations,
            search_console_sites,
            linkedin_organizations,
            x_user,
        }
    }

    /// Link check for every platform, keyed by platform id.
    pub async fn link_status(&self) -> BTreeMap<String, bool> {
        let mut status = BTreeMap::new();
        for platform in Platform::ALL {
            let linked = self.adapter(platform).is_linked().await;
            status.insert(platform.id().to_string(), linked);
        }
        status
    }
}
