use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::ZoneConfig;
use crate::dns::{DnsProvider, EditStatus};
use crate::error::{Error, Result};
use crate::ip::IpResolver;
use crate::registry::{self, Domain, Zone};

/// What happened to a single domain during a reconciling pass.
#[derive(Debug)]
pub enum DomainResult {
    Ok,
    /// The provider refused the edit
    SoftFailure { message: String },
    /// The edit request could not be evaluated at all
    HardFailure { cause: Error },
}

impl DomainResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, DomainResult::Ok)
    }
}

#[derive(Debug)]
pub struct DomainFailure {
    pub zone: String,
    pub domain: String,
    pub result: DomainResult,
}

#[derive(Debug)]
pub enum UpdateOutcome {
    /// The address matched the last applied one; nothing was sent
    Unchanged { ip: String },
    Applied { ip: String, domains: usize },
    Failed {
        ip: String,
        failures: Vec<DomainFailure>,
    },
}

impl UpdateOutcome {
    pub fn all_succeeded(&self) -> bool {
        !matches!(self, UpdateOutcome::Failed { .. })
    }

    pub fn ip(&self) -> &str {
        match self {
            UpdateOutcome::Unchanged { ip }
            | UpdateOutcome::Applied { ip, .. }
            | UpdateOutcome::Failed { ip, .. } => ip,
        }
    }
}

/// Keeps the configured A records pointed at the current public address.
///
/// The last applied address lives only in this value. It is set after a pass
/// in which every domain was updated and cleared after any failure, so the
/// next `update` sweeps every domain again.
pub struct Updater {
    provider: Arc<dyn DnsProvider>,
    resolver: IpResolver,
    zones: Vec<Zone>,
    last_applied_ip: Option<String>,
}

impl Updater {
    pub fn new(provider: Arc<dyn DnsProvider>, resolver: IpResolver, zones: Vec<Zone>) -> Self {
        Self {
            provider,
            resolver,
            zones,
            last_applied_ip: None,
        }
    }

    /// Look up record ids for every configured domain, then build the updater.
    pub async fn initialize(
        provider: Arc<dyn DnsProvider>,
        resolver: IpResolver,
        configs: &[ZoneConfig],
    ) -> Result<Self> {
        let zones = registry::build(provider.as_ref(), configs).await?;
        info!(
            "Registry ready: {} zones, {} domains",
            zones.len(),
            zones.iter().map(|z| z.domains().len()).sum::<usize>()
        );
        Ok(Self::new(provider, resolver, zones))
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn last_applied_ip(&self) -> Option<&str> {
        self.last_applied_ip.as_deref()
    }

    pub async fn update(&mut self) -> Result<UpdateOutcome> {
        let ip = self.resolver.resolve().await?;

        if self.last_applied_ip.as_deref() == Some(ip.as_str()) {
            debug!("IP unchanged at {}, nothing to do", ip);
            return Ok(UpdateOutcome::Unchanged { ip });
        }

        info!(
            "IP changed from {} to {}, updating records",
            self.last_applied_ip.as_deref().unwrap_or("<unknown>"),
            ip
        );

        let mut failures = Vec::new();
        let mut applied = 0;

        for zone in &self.zones {
            for domain in zone.domains() {
                let result = self.apply(zone, domain, &ip).await;
                if result.is_ok() {
                    applied += 1;
                } else {
                    failures.push(DomainFailure {
                        zone: zone.name().to_string(),
                        domain: domain.name().to_string(),
                        result,
                    });
                }
            }
        }

        if failures.is_empty() {
            self.last_applied_ip = Some(ip.clone());
            Ok(UpdateOutcome::Applied {
                ip,
                domains: applied,
            })
        } else {
            warn!(
                "{} of {} domains failed, will retry all on next run",
                failures.len(),
                failures.len() + applied
            );
            self.last_applied_ip = None;
            Ok(UpdateOutcome::Failed { ip, failures })
        }
    }

    async fn apply(&self, zone: &Zone, domain: &Domain, ip: &str) -> DomainResult {
        match self
            .provider
            .edit_record(zone.name(), domain.name(), domain.record_id(), ip)
            .await
        {
            Ok(EditStatus::Applied) => {
                info!("Updated {} to {}", domain.name(), ip);
                DomainResult::Ok
            }
            Ok(EditStatus::Rejected { message }) => {
                warn!("Provider rejected update of {}: {}", domain.name(), message);
                DomainResult::SoftFailure { message }
            }
            Err(cause) => {
                error!("Failed to update {}: {}", domain.name(), cause);
                DomainResult::HardFailure { cause }
            }
        }
    }
}
