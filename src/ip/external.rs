use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_IP_SERVICES: &[&str] = &[
    "https://api.ipify.org",
    "https://ifconfig.me/ip",
    "https://icanhazip.com",
    "https://ipinfo.io/ip",
    "https://checkip.amazonaws.com",
];

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Asks a prioritized list of IP echo services for our public address.
pub struct IpResolver {
    client: Client,
    services: Vec<String>,
}

impl IpResolver {
    pub fn new(services: Vec<String>, timeout: Duration) -> Result<Self> {
        if services.is_empty() {
            return Err(Error::configuration("no IP lookup services configured"));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, services })
    }

    pub fn services(&self) -> &[String] {
        &self.services
    }

    /// First service answering with a 2xx wins. The body is returned as-is
    /// minus trailing whitespace; it is not checked to be a valid address.
    pub async fn resolve(&self) -> Result<String> {
        for service in &self.services {
            match fetch_ip(&self.client, service).await {
                Ok(ip) => {
                    debug!("Resolved public IP {} via {}", ip, service);
                    return Ok(ip);
                }
                Err(e) => {
                    debug!("Failed to get IP from {}: {}", service, e);
                }
            }
        }

        Err(Error::Lookup {
            attempted: self.services.len(),
        })
    }
}

async fn fetch_ip(client: &Client, url: &str) -> std::result::Result<String, reqwest::Error> {
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    Ok(body.trim_end().to_string())
}
