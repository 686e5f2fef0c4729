mod settings;

pub use settings::{DaemonConfig, IpConfig, ProviderConfig, Settings, ZoneConfig};
