use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tallyguard::config::TallyguardConfig;
use tallyguard::ratelimit::{RateLimitOptions, RateLimiter};
use tallyguard::store::{CounterStore, InMemoryStore, RedisStore};

/// Inspect and drive fixed-window rate limits stored in a counter store.
#[derive(Debug, Parser)]
#[command(name = "tallyguard", version, about)]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Redis URL; overrides the configuration file
    #[arg(long, global = true)]
    redis_url: Option<String>,

    /// Requests allowed per window
    #[arg(long, global = true)]
    limit: Option<u64>,

    /// Window length in seconds
    #[arg(long, global = true)]
    window: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Count one request against a key
    Hit { key: String },
    /// Show the requests left in the key's window
    Remaining { key: String },
    /// Clear the key's counter
    Reset { key: String },
    /// Show the seconds left in the key's window
    Ttl { key: String },
    /// Print the effective limit and window
    Options,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs on stderr, JSON results on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = TallyguardConfig::load(cli.config.as_deref())?;
    let options = config.rate_limiting.merge(RateLimitOptions {
        limit: cli.limit,
        window: cli.window,
    });

    let redis_url = cli.redis_url.or(config.store.redis_url);
    let store: Arc<dyn CounterStore> = match redis_url {
        Some(url) => Arc::new(RedisStore::connect(&url).await?),
        None => {
            warn!("No Redis URL configured, counters will not outlive this process");
            Arc::new(InMemoryStore::new())
        }
    };

    let limiter = RateLimiter::new(store, Some(options))?;
    info!(
        limit = limiter.options().limit(),
        window = limiter.options().window(),
        "Rate limiter initialized"
    );

    let output = match cli.command {
        Command::Hit { key } => {
            let allowed = limiter.limit(&key).await?;
            let remaining = limiter.remaining_attempts(&key).await?;
            json!({ "key": key, "allowed": allowed, "remaining": remaining })
        }
        Command::Remaining { key } => {
            let remaining = limiter.remaining_attempts(&key).await?;
            json!({ "key": key, "remaining": remaining })
        }
        Command::Reset { key } => {
            limiter.reset_limit(&key).await?;
            json!({ "key": key, "reset": true })
        }
        Command::Ttl { key } => {
            let ttl = limiter.ttl(&key).await?;
            json!({ "key": key, "ttl": ttl })
        }
        Command::Options => serde_json::to_value(limiter.options())?,
    };

    println!("{}", output);
    Ok(())
}
