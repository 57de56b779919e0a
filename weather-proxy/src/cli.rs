use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::Text;
use std::path::PathBuf;
use tokio::net::TcpListener;
use weather_core::{Config, WeatherQuery, WeatherService, server};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-proxy", version, about = "Caching, rate-limited weather proxy")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP proxy.
    Serve {
        /// Address to listen on, e.g. "0.0.0.0:8080". Overrides the config file.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Look up the weather once, through key validation, rate limiting and the cache.
    Lookup {
        /// City name.
        city: String,

        /// Optional country code, e.g. "gb".
        #[arg(long)]
        country: Option<String>,

        /// Caller API key; must be on the allow-list.
        #[arg(long)]
        api_key: String,
    },

    /// Interactively add an allowed key and set the provider URL and store location.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        match self.command {
            Command::Serve { bind } => {
                let bind = bind.unwrap_or_else(|| config.server.bind.clone());
                let service = WeatherService::from_config(&config).await?;

                let listener = TcpListener::bind(&bind)
                    .await
                    .with_context(|| format!("Failed to bind {bind}"))?;
                tracing::info!(
                    %bind,
                    allowed_keys = config.allowed_keys().len(),
                    quota = config.rate_limit.quota,
                    "starting weather proxy"
                );

                server::serve(listener, service).await.context("Server error")?;
            }
            Command::Lookup { city, country, api_key } => {
                let service = WeatherService::from_config(&config).await?;
                let query = WeatherQuery::new(city, country, Some(api_key));

                let description = service.get_weather_description(&query).await?;
                println!("{description}");
            }
            Command::Configure => {
                configure(config, self.config)?;
            }
        }

        Ok(())
    }
}

fn configure(mut config: Config, path: Option<PathBuf>) -> anyhow::Result<()> {
    let key = Text::new("API key to allow (blank to skip):").prompt()?;
    if !key.trim().is_empty() && !config.add_api_key(key.trim().to_string()) {
        println!("Key is already allowed.");
    }

    config.upstream.base_url = Text::new("Upstream weather URL:")
        .with_default(&config.upstream.base_url)
        .prompt()?;

    let current_store = config
        .store
        .path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let store = Text::new("Record database file (blank keeps records in memory):")
        .with_default(&current_store)
        .prompt()?;
    config.store.path = Some(store.trim())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from);

    let path = match path {
        Some(path) => path,
        None => Config::config_file_path()?,
    };
    config.save_to(&path)?;

    println!(
        "Saved {} allowed key(s) to {}",
        config.allowed_keys().len(),
        path.display()
    );
    Ok(())
}
