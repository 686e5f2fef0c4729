pub mod cloudflare;
mod provider;

pub use cloudflare::CloudflareProvider;
pub use provider::{Credentials, DnsProvider, EditStatus};

use std::sync::Arc;

use crate::config::ProviderConfig;
use crate::error::{Error, Result};

pub fn create_provider(
    name: &str,
    credentials: Credentials,
    config: &ProviderConfig,
) -> Result<Arc<dyn DnsProvider>> {
    match name.to_lowercase().as_str() {
        "cloudflare" => Ok(Arc::new(CloudflareProvider::new(
            credentials,
            &config.endpoint,
            config.ttl,
        )?)),
        _ => Err(Error::configuration(format!("Unknown DNS provider: {}", name))),
    }
}
