mod external;

pub use external::{IpResolver, DEFAULT_IP_SERVICES, REQUEST_TIMEOUT};

use std::time::Duration;

use crate::config::IpConfig;
use crate::error::Result;

pub fn create_resolver(config: &IpConfig) -> Result<IpResolver> {
    IpResolver::new(
        config.services.clone(),
        Duration::from_secs(config.timeout_seconds),
    )
}
