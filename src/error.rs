use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Every IP echo service failed
    #[error("IP lookup failed: none of {attempted} services answered")]
    Lookup { attempted: usize },

    /// Configured domain or zone cannot be used as-is
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The provider request could not be evaluated (connection, timeout, non-2xx, bad body)
    #[error("Provider transport error: {0}")]
    ProviderTransport(String),

    /// The provider answered but reported a logical error
    #[error("Provider API error: {0}")]
    ProviderApi(String),
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::ProviderTransport(msg.into())
    }

    pub fn api(msg: impl Into<String>) -> Self {
        Self::ProviderApi(msg.into())
    }
}
