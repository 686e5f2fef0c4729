use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: String,
    pub token: String,
}

/// Result of an edit call that reached the provider and got a readable answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditStatus {
    Applied,
    /// The provider evaluated the request and refused it
    Rejected { message: String },
}

#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Load every A record of a zone, keyed by fully-qualified name.
    async fn list_records(&self, zone: &str) -> Result<HashMap<String, String>>;

    /// Point one A record at `ip`. API-level refusals come back as
    /// `EditStatus::Rejected`, only transport failures are errors.
    async fn edit_record(
        &self,
        zone: &str,
        name: &str,
        record_id: &str,
        ip: &str,
    ) -> Result<EditStatus>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}
