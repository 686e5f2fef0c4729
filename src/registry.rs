use tracing::debug;

use crate::config::ZoneConfig;
use crate::dns::DnsProvider;
use crate::error::{Error, Result};

/// An A record we keep pointed at the current address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    name: String,
    record_id: String,
}

impl Domain {
    pub fn new(name: impl Into<String>, record_id: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let record_id = record_id.into();
        if record_id.is_empty() {
            return Err(Error::configuration(format!(
                "{} has an empty record id",
                name
            )));
        }
        Ok(Self { name, record_id })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    name: String,
    domains: Vec<Domain>,
}

impl Zone {
    pub fn new(name: impl Into<String>, domains: Vec<Domain>) -> Self {
        Self {
            name: name.into(),
            domains,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }
}

/// `label.zone`, or the zone itself for the apex.
pub fn qualify(label: Option<&str>, zone: &str) -> String {
    match label {
        Some(label) => format!("{}.{}", label, zone),
        None => zone.to_string(),
    }
}

/// Resolve every configured domain to its provider record id.
///
/// Any provider failure, or a domain that is not an existing A record, aborts
/// the whole build: records are never created.
pub async fn build(provider: &dyn DnsProvider, configs: &[ZoneConfig]) -> Result<Vec<Zone>> {
    let mut zones = Vec::with_capacity(configs.len());

    for config in configs {
        let records = provider.list_records(&config.name).await?;

        let mut domains = Vec::with_capacity(config.domains.len());
        for label in config.labels() {
            let name = qualify(label, &config.name);
            let record_id = records.get(&name).ok_or_else(|| {
                Error::configuration(format!(
                    "{} has no A record in zone {} at {}",
                    name,
                    config.name,
                    provider.provider_name()
                ))
            })?;
            debug!("{} -> record {}", name, record_id);
            domains.push(Domain::new(name, record_id.as_str())?);
        }

        zones.push(Zone::new(config.name.clone(), domains));
    }

    Ok(zones)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::EditStatus;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct StaticRecords(HashMap<String, HashMap<String, String>>);

    #[async_trait]
    impl DnsProvider for StaticRecords {
        async fn list_records(&self, zone: &str) -> Result<HashMap<String, String>> {
            self.0
                .get(zone)
                .cloned()
                .ok_or_else(|| Error::api(format!("unknown zone {}", zone)))
        }

        async fn edit_record(&self, _: &str, _: &str, _: &str, _: &str) -> Result<EditStatus> {
            unreachable!("registry never edits")
        }

        fn provider_name(&self) -> &'static str {
            "static"
        }
    }

    fn provider() -> StaticRecords {
        let mut records = HashMap::new();
        records.insert("example.com".to_string(), "id-apex".to_string());
        records.insert("www.example.com".to_string(), "id-www".to_string());
        records.insert("empty.example.com".to_string(), String::new());

        let mut zones = HashMap::new();
        zones.insert("example.com".to_string(), records);
        StaticRecords(zones)
    }

    #[test]
    fn test_qualify() {
        assert_eq!(qualify(None, "example.com"), "example.com");
        assert_eq!(qualify(Some("www"), "example.com"), "www.example.com");
    }

    #[tokio::test]
    async fn test_build_resolves_ids_in_order() {
        let zones = build(&provider(), &[ZoneConfig::new("example.com", &["www", "@"])])
            .await
            .unwrap();

        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].name(), "example.com");
        assert_eq!(
            zones[0].domains(),
            &[
                Domain::new("www.example.com", "id-www").unwrap(),
                Domain::new("example.com", "id-apex").unwrap(),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_record_is_fatal() {
        let err = build(&provider(), &[ZoneConfig::new("example.com", &["@", "mail"])])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(ref m) if m.contains("mail.example.com")));
    }

    #[tokio::test]
    async fn test_empty_record_id_is_fatal() {
        let err = build(&provider(), &[ZoneConfig::new("example.com", &["empty"])])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[tokio::test]
    async fn test_provider_error_is_fatal() {
        let err = build(&provider(), &[ZoneConfig::new("example.org", &["@"])])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ProviderApi(_)));
    }
}
