use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::dns::Credentials;

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    providers: HashMap<String, ProviderCredentials>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProviderCredentials {
    user: String,
    token: String,
}

/// Credentials live next to the config file.
pub fn credentials_path(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|dir| dir.join("credentials.toml"))
        .unwrap_or_else(|| PathBuf::from("credentials.toml"))
}

fn load_credentials_file(path: &Path) -> Result<CredentialsFile> {
    if !path.exists() {
        return Ok(CredentialsFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read credentials file: {}", path.display()))?;

    toml::from_str(&content)
        .with_context(|| format!("Failed to parse credentials file: {}", path.display()))
}

fn save_credentials_file(path: &Path, creds: &CredentialsFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let content = toml::to_string_pretty(creds).context("Failed to serialize credentials")?;

    fs::write(path, &content)
        .with_context(|| format!("Failed to write credentials file: {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(path, perms)
            .with_context(|| format!("Failed to set permissions on: {}", path.display()))?;
    }

    Ok(())
}

pub fn store_credentials(path: &Path, provider: &str, user: &str, token: &str) -> Result<()> {
    let mut creds_file = load_credentials_file(path)?;

    creds_file.providers.insert(
        provider.to_string(),
        ProviderCredentials {
            user: user.to_string(),
            token: token.to_string(),
        },
    );

    save_credentials_file(path, &creds_file)
}

pub fn get_credentials(path: &Path, provider: &str) -> Result<Credentials> {
    let creds_file = load_credentials_file(path)?;

    let provider_creds = creds_file.providers.get(provider).ok_or_else(|| {
        anyhow!(
            "Credentials not found for provider: {}. Use 'zoneddns set-key' to store credentials.",
            provider
        )
    })?;

    Ok(Credentials {
        user: provider_creds.user.clone(),
        token: provider_creds.token.clone(),
    })
}

pub fn delete_credentials(path: &Path, provider: &str) -> Result<()> {
    let mut creds_file = load_credentials_file(path)?;

    if creds_file.providers.remove(provider).is_none() {
        return Err(anyhow!("No credentials found for provider: {}", provider));
    }

    save_credentials_file(path, &creds_file)
}
