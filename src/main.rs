use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use zoneddns::{
    config::Settings,
    daemon,
    dns::{create_provider, DnsProvider},
    ip, registry, secrets,
    updater::Updater,
};

const PROVIDER: &str = "cloudflare";

#[derive(Parser)]
#[command(name = "zoneddns")]
#[command(about = "Dynamic DNS updater - keeps Cloudflare A records pointed at the current public IP")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daemon to monitor IP changes and update DNS
    Daemon,

    /// Run a single update pass
    Update,

    /// Show the current public IP and the A records of each zone
    Check,

    /// Store API credentials
    SetKey,

    /// Delete stored API credentials
    DeleteKey,

    /// Show configuration file location and contents
    Config,
}

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Settings::config_path);
    let credentials_path = secrets::credentials_path(&config_path);

    // Load config for commands that need it
    let settings = Settings::load_from(&config_path).ok();

    let log_level = if cli.verbose {
        "debug"
    } else {
        settings
            .as_ref()
            .map(|s| s.daemon.log_level.as_str())
            .unwrap_or("info")
    };
    init_logging(log_level);

    match cli.command {
        Commands::Daemon => {
            let settings = require(settings, &config_path)?;
            info!("Starting zoneddns daemon");
            let updater = build_updater(&settings, &credentials_path).await?;
            daemon::run(
                updater,
                Duration::from_secs(settings.daemon.interval_seconds),
            )
            .await?;
        }

        Commands::Update => {
            let settings = require(settings, &config_path)?;
            let mut updater = build_updater(&settings, &credentials_path).await?;
            let outcome = updater.update().await?;
            daemon::report(&outcome);
            if !outcome.all_succeeded() {
                bail!("Some domains could not be updated to {}", outcome.ip());
            }
            println!("DNS records point at {}", outcome.ip());
        }

        Commands::Check => {
            let settings = require(settings, &config_path)?;
            check_status(&settings, &credentials_path).await?;
        }

        Commands::SetKey => {
            use std::io::{self, Write};

            print!("User (email): ");
            io::stdout().flush()?;
            let mut user = String::new();
            io::stdin().read_line(&mut user)?;
            let user = user.trim();

            let token = rpassword::prompt_password("API Token: ")?;

            secrets::store_credentials(&credentials_path, PROVIDER, user, token.trim())?;
            println!("Credentials stored in {}", credentials_path.display());
        }

        Commands::DeleteKey => {
            secrets::delete_credentials(&credentials_path, PROVIDER)?;
            println!("Credentials deleted from {}", credentials_path.display());
        }

        Commands::Config => {
            show_config(&config_path, &settings)?;
        }
    }

    Ok(())
}

fn require(settings: Option<Settings>, config_path: &Path) -> Result<Settings> {
    settings.ok_or_else(|| {
        anyhow!(
            "Could not load configuration from {}. Run 'zoneddns config' to see the expected format.",
            config_path.display()
        )
    })
}

fn provider(settings: &Settings, credentials_path: &Path) -> Result<Arc<dyn DnsProvider>> {
    let creds = secrets::get_credentials(credentials_path, PROVIDER)?;
    Ok(create_provider(PROVIDER, creds, &settings.provider)?)
}

async fn build_updater(settings: &Settings, credentials_path: &Path) -> Result<Updater> {
    let provider = provider(settings, credentials_path)?;
    let resolver = ip::create_resolver(&settings.ip)?;

    Updater::initialize(provider, resolver, &settings.zones)
        .await
        .context("Failed to resolve record ids for the configured domains")
}

async fn check_status(settings: &Settings, credentials_path: &Path) -> Result<()> {
    println!("Checking public IP...\n");

    let resolver = ip::create_resolver(&settings.ip)?;
    match resolver.resolve().await {
        Ok(ip) => println!("Public IP: {}", ip),
        Err(e) => println!("Public IP: Error - {} (tried {:?})", e, resolver.services()),
    }

    println!("\nChecking DNS records...\n");

    let provider = provider(settings, credentials_path)?;
    for zone in &settings.zones {
        let records = match provider.list_records(&zone.name).await {
            Ok(records) => records,
            Err(e) => {
                println!("{}: Error - {}", zone.name, e);
                continue;
            }
        };

        for label in zone.labels() {
            let name = registry::qualify(label, &zone.name);
            match records.get(&name) {
                Some(id) => println!("{} (A): record {}", name, id),
                None => println!("{} (A): missing", name),
            }
        }
    }

    Ok(())
}

fn show_config(config_path: &Path, settings: &Option<Settings>) -> Result<()> {
    println!("Configuration file location: {}\n", config_path.display());

    match settings {
        Some(s) => {
            println!("Current configuration:\n");
            println!("{}", toml::to_string_pretty(s)?);
        }
        None => {
            println!("Configuration file not found.");
            println!("\nCreate a configuration file at the location above.");
            println!("Example configuration:\n");
            println!(
                r#"[daemon]
interval_seconds = 300
log_level = "info"

[provider]
ttl = 1

[[zones]]
name = "example.com"
domains = ["@", "www"]
"#
            );
        }
    }

    Ok(())
}
