use anyhow::Result;
use clap::{Parser, Subcommand};
use tasks_cache::{CacheConfig, CacheKeyBuilder};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tasks_api::config::{load_dotenv, ApiServerConfig};
use tasks_api::ApiServer;

#[derive(Parser)]
#[command(name = "tasks-api")]
#[command(about = "Task record API with a versioned read-through cache", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start API server
    Serve {
        /// Host to bind to (default: HOST env var or 127.0.0.1)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (default: PORT env var or 8080)
        #[arg(short, long)]
        port: Option<u16>,

        /// Cache entry TTL in seconds; values below 60 are raised to 60
        #[arg(long)]
        ttl_seconds: Option<u64>,

        /// Serve without the cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Print the cache key a request would use
    CacheKey {
        #[command(subcommand)]
        target: KeyTarget,
    },
}

#[derive(Subcommand)]
enum KeyTarget {
    /// Key for a list request URL (absolute, or a path with query)
    List {
        url: String,

        /// Version tag to build the key under
        #[arg(long)]
        version: String,
    },

    /// Key for a single-record read
    Read {
        id: String,

        /// Version tag to build the key under
        #[arg(long)]
        version: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tasks_api=info,tasks_cache=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            ttl_seconds,
            no_cache,
        } => {
            let mut config = ApiServerConfig::from_env()?;
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(ttl) = ttl_seconds {
                config.cache = CacheConfig::builder()
                    .namespace(config.cache.namespace.clone())
                    .ttl_jitter(config.cache.ttl_jitter)
                    .write_mode(config.cache.write_mode)
                    .enabled(config.cache.enabled)
                    .ttl_seconds(ttl)
                    .build();
            }
            if no_cache {
                config.cache.enabled = false;
            }
            config.validate()?;

            println!("Starting API server on {}", config.bind_address());
            ApiServer::new(config).start().await?;
        }

        Commands::CacheKey { target } => {
            let keys = CacheKeyBuilder::new(CacheConfig::from_env().namespace);
            let key = match target {
                KeyTarget::List { url, version } => keys.list(&version, &url)?,
                KeyTarget::Read { id, version } => keys.read(&version, id)?,
            };
            println!("{}", key);
        }
    }

    Ok(())
}
