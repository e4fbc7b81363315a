//! SWCACHE CLI
//!
//! Drives the offline caching router against a directory-backed cache store
//! and the real network.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use swcache_core::traits::{CacheStorage, CacheStore, Fetcher};
use swcache_core::types::{Method, Request};
use swcache_core::RouterConfig;
use swcache_fetch::{HttpFetcher, HttpFetcherConfig, OfflineFetcher};
use swcache_router::{CacheRouter, ResponseSource};
use swcache_store::FileCacheStorage;

/// Bytes of a response body printed before truncating.
const BODY_PREVIEW_BYTES: usize = 512;

/// SWCACHE - offline caching router
#[derive(Parser, Debug)]
#[command(name = "swcache")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding the cache store
    #[arg(long, global = true, env = "SWCACHE_STORE", default_value = ".swcache")]
    store: PathBuf,

    /// Router configuration file (JSON); environment otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Network timeout in seconds
    #[arg(long, global = true, env = "SWCACHE_TIMEOUT")]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch and store every core asset
    Install,

    /// Install, then delete every other cache
    Activate,

    /// Route one request through the router
    Fetch {
        /// Path relative to the scope, or an absolute URL
        path: String,
        /// Treat the request as a page navigation
        #[arg(short, long)]
        navigate: bool,
        /// HTTP method
        #[arg(short, long, default_value = "GET")]
        method: String,
        /// Simulate a lost connection
        #[arg(long)]
        offline: bool,
    },

    /// List caches, or the entries of one cache
    Keys {
        /// Cache name
        name: Option<String>,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "swcache=debug,info"
    } else {
        "swcache=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Install => cmd_install(&cli.store, config, cli.timeout).await,
        Commands::Activate => cmd_activate(&cli.store, config, cli.timeout).await,
        Commands::Fetch {
            path,
            navigate,
            method,
            offline,
        } => {
            let network = Network::new(offline, cli.timeout);
            cmd_fetch(&cli.store, config, network, &path, &method, navigate).await
        }
        Commands::Keys { name } => cmd_keys(&cli.store, name.as_deref()).await,
        Commands::Config => cmd_config(&config),
    }
}

fn load_config(path: Option<&Path>) -> Result<RouterConfig> {
    match path {
        Some(path) => RouterConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => RouterConfig::from_env().context("Invalid SWCACHE_* environment"),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Network {
    Offline,
    Http { timeout: Option<u64> },
}

impl Network {
    fn new(offline: bool, timeout: Option<u64>) -> Self {
        if offline {
            Network::Offline
        } else {
            Network::Http { timeout }
        }
    }

    fn fetcher(self) -> Result<Arc<dyn Fetcher>> {
        let fetcher: Arc<dyn Fetcher> = match self {
            Network::Offline => Arc::new(OfflineFetcher),
            Network::Http { timeout } => {
                let mut config = HttpFetcherConfig::default();
                if let Some(seconds) = timeout {
                    config = config.with_timeout(seconds);
                }
                Arc::new(HttpFetcher::with_config(config).context("Failed to build HTTP client")?)
            }
        };
        Ok(fetcher)
    }
}

async fn open_store(root: &Path) -> Result<Arc<FileCacheStorage>> {
    let storage = FileCacheStorage::new(root)
        .await
        .with_context(|| format!("Failed to open cache store at {}", root.display()))?;
    Ok(Arc::new(storage))
}

async fn build_router(
    root: &Path,
    config: RouterConfig,
    network: Network,
) -> Result<CacheRouter> {
    let storage = open_store(root).await?;
    let fetcher = network.fetcher()?;
    CacheRouter::new(config, storage, fetcher).context("Failed to create router")
}

/// Install core assets
async fn cmd_install(root: &Path, config: RouterConfig, timeout: Option<u64>) -> Result<()> {
    println!("{} {}", "📦 Installing into".cyan().bold(), config.cache_name());

    let router = build_router(root, config, Network::Http { timeout }).await?;
    let report = router.install().await.context("Install failed")?;

    println!(
        "{} {} asset(s) cached in {}",
        "✅".green(),
        report.assets_cached,
        report.cache_name
    );
    Ok(())
}

/// Install, then activate
async fn cmd_activate(root: &Path, config: RouterConfig, timeout: Option<u64>) -> Result<()> {
    println!("{} {}", "🚀 Activating".cyan().bold(), config.cache_name());

    let router = build_router(root, config, Network::Http { timeout }).await?;
    let installed = router.install().await.context("Install failed")?;
    println!(
        "   {} {} asset(s) cached",
        "Installed:".dimmed(),
        installed.assets_cached
    );

    let report = router.activate().await.context("Activation failed")?;
    if report.deleted.is_empty() {
        println!("   {} none", "Deleted:".dimmed());
    } else {
        for name in &report.deleted {
            println!("   {} {}", "Deleted:".dimmed(), name);
        }
    }
    println!("{} {} is active", "✅".green(), report.cache_name);
    Ok(())
}

/// Route a single request
async fn cmd_fetch(
    root: &Path,
    config: RouterConfig,
    network: Network,
    path: &str,
    method: &str,
    navigate: bool,
) -> Result<()> {
    let method: Method = method.parse()?;
    let url = config
        .resolve(path)
        .with_context(|| format!("Cannot resolve {:?} against {}", path, config.scope))?;

    let mut request = Request::new(method, url);
    if navigate {
        request = request.navigate();
    }
    println!("{} {} {}", "🌐".cyan(), request.method, request.url);

    let router = build_router(root, config, network).await?;
    let routed = router.respond(request).await.context("No response")?;

    let source = match routed.source {
        ResponseSource::Network => routed.source.to_string().green(),
        ResponseSource::Cache => routed.source.to_string().yellow(),
        ResponseSource::Fallback => routed.source.to_string().magenta(),
        ResponseSource::PassThrough => routed.source.to_string().blue(),
    };
    println!(
        "   {} {} {}",
        "Status:".dimmed(),
        routed.response.status,
        routed.response.status_text
    );
    println!("   {} {}", "Source:".dimmed(), source);
    for (name, value) in routed.response.headers.iter() {
        println!("   {} {}: {}", "Header:".dimmed(), name, value);
    }

    let body = &routed.response.body;
    let preview = String::from_utf8_lossy(&body[..body.len().min(BODY_PREVIEW_BYTES)]);
    println!("\n{}", preview);
    if body.len() > BODY_PREVIEW_BYTES {
        println!("{}", format!("... {} more byte(s)", body.len() - BODY_PREVIEW_BYTES).dimmed());
    }

    if let Some(revalidation) = routed.revalidation {
        if revalidation.settled().await {
            println!("\n{}", "🔄 Cache entry refreshed".green());
        } else {
            println!("\n{}", "⚠️  Refresh failed; cached copy kept".yellow());
        }
    }

    Ok(())
}

/// List caches or entries
async fn cmd_keys(root: &Path, name: Option<&str>) -> Result<()> {
    let storage = open_store(root).await?;

    match name {
        Some(name) => {
            let cache = storage
                .get(name)
                .with_context(|| format!("No cache named {}", name))?;
            let keys = cache.keys().await?;
            let stats = cache.stats();

            println!(
                "{} {} ({} entries, {} bytes)",
                "🗂 ".cyan(),
                name.bold(),
                stats.entries,
                stats.body_bytes
            );
            for key in keys {
                println!("   {}", key);
            }
        }
        None => {
            let names = storage.keys().await?;
            if names.is_empty() {
                println!("{}", "No caches.".yellow());
                return Ok(());
            }
            for name in names {
                let entries = storage.get(&name).map(|c| c.stats().entries).unwrap_or(0);
                println!("   {} {}", name.bold(), format!("({} entries)", entries).dimmed());
            }
        }
    }

    Ok(())
}

/// Show the effective configuration
fn cmd_config(config: &RouterConfig) -> Result<()> {
    println!("{} {}", "Cache name:".yellow(), config.cache_name());
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
