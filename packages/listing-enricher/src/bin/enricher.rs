//! Listing enricher CLI
//!
//! `enricher run` enriches the configured listing documents in place.
//! `enricher reformat` rebuilds old-layout cards in the compact layout.
//! `enricher normalize-head` cleans the head of documents from other provinces.
//! `enricher sitemap` writes sitemap files for a published site tree.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use listing_enricher::sitemap::{self, SitemapOptions, MAX_URLS_PER_SITEMAP};
use listing_enricher::{
    normalize_head_listings, reformat_listings, run_with_http, EnrichConfig, FileRewrite,
    Result as EnrichResult,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "enricher")]
#[command(about = "Enrich archived job listings with offer descriptions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inject descriptions into listing documents
    Run {
        #[arg(long)]
        listing_dir: Option<PathBuf>,
        #[arg(long)]
        cache_dir: Option<PathBuf>,
        #[arg(long)]
        max_pages: Option<usize>,
        #[arg(long)]
        base_url: Option<String>,
        /// Pause after each network fetch, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Cache 2xx detail pages even when no description is found
        #[arg(long)]
        no_validate: bool,
        /// Also read cache entries stored under the old undigested names
        #[arg(long)]
        legacy_cache_names: bool,
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rebuild old-layout cards in the compact layout
    Reformat {
        #[command(flatten)]
        files: ListingFiles,
    },

    /// Clean scripts, links and fonts in the head of listing documents
    NormalizeHead {
        #[command(flatten)]
        files: ListingFiles,
    },

    /// Generate sitemap files for a site tree
    Sitemap {
        #[arg(long, default_value = ".")]
        root: PathBuf,
        #[arg(long)]
        base_url: String,
        #[arg(long, default_value_t = MAX_URLS_PER_SITEMAP)]
        max_urls: usize,
        #[arg(long, default_value = sitemap::DEFAULT_OUTPUT)]
        output: String,
    },
}

/// Listing selection shared by the maintenance subcommands
#[derive(Args)]
struct ListingFiles {
    #[arg(long)]
    listing_dir: Option<PathBuf>,
    /// Filename prefix of listing pages, e.g. `cordoba_p`
    #[arg(long)]
    prefix: Option<String>,
    /// Print per-file results as JSON
    #[arg(long)]
    json: bool,
}

impl ListingFiles {
    fn config(&self) -> Result<EnrichConfig> {
        let mut config = EnrichConfig::from_env().context("Failed to load configuration")?;
        if let Some(dir) = &self.listing_dir {
            config.listing_dir = dir.clone();
        }
        if let Some(prefix) = &self.prefix {
            config.listing_prefix = prefix.clone();
        }
        Ok(config)
    }

    fn report(&self, results: EnrichResult<Vec<FileRewrite>>, what: &str) -> Result<()> {
        let results = results.with_context(|| format!("{} failed", what))?;
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&results).context("Failed to serialize results")?
            );
        }
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "listing_enricher=info,enricher=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            listing_dir,
            cache_dir,
            max_pages,
            base_url,
            delay_ms,
            no_validate,
            legacy_cache_names,
            json,
        } => {
            let mut config = EnrichConfig::from_env().context("Failed to load configuration")?;
            if let Some(dir) = listing_dir {
                config.listing_dir = dir;
            }
            if let Some(dir) = cache_dir {
                config.cache_dir = dir;
            }
            if let Some(max) = max_pages {
                config.max_pages = max;
            }
            if let Some(url) = base_url {
                config.base_url = url;
            }
            if let Some(ms) = delay_ms {
                config.request_delay = Duration::from_millis(ms);
            }
            if no_validate {
                config.validate_before_cache = false;
            }
            if legacy_cache_names {
                config.legacy_cache_names = true;
            }

            let report = run_with_http(&config)
                .await
                .context("Enrichment run failed")?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("Failed to serialize report")?
                );
            }
        }
        Commands::Reformat { files } => {
            let config = files.config()?;
            files.report(reformat_listings(&config).await, "Layout reformat")?;
        }
        Commands::NormalizeHead { files } => {
            let config = files.config()?;
            files.report(normalize_head_listings(&config).await, "Head normalization")?;
        }
        Commands::Sitemap {
            root,
            base_url,
            max_urls,
            output,
        } => {
            let options = SitemapOptions::new(&root, base_url)
                .with_max_urls(max_urls)
                .with_output(output);
            let report = sitemap::generate(&options)
                .with_context(|| format!("Failed to generate sitemap under {}", root.display()))?;
            tracing::info!(urls = report.urls, parts = report.parts.len(), "Sitemap done");
        }
    }
    Ok(())
}
