use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use racket_scraper::config::Config;
use racket_scraper::constants::DEFAULT_CONFIG_PATH;
use racket_scraper::infra::import_client::ImportClient;
use racket_scraper::logging;
use racket_scraper::output;
use racket_scraper::pipeline::ingestion::catalog::discover_collection;
use racket_scraper::pipeline::ingestion::http_client::{HttpPageFetcher, PageFetcher};
use racket_scraper::pipeline::runner::ScrapeRunner;
use racket_scraper::pipeline::ExtractionPipeline;
use racket_scraper::types::ProductRecord;

#[derive(Parser)]
#[command(name = "racket_scraper")]
#[command(about = "Badminton racket product page scraper and spec normalizer")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the products on a collection page and its follow-up pages
    Discover {
        #[arg(long)]
        collection_url: String,
    },
    /// Fetch product pages, extract records, and write them out
    Scrape {
        /// Product page URLs (comma-separated)
        #[arg(long, conflicts_with = "collection_url")]
        urls: Option<String>,
        /// Collection page to discover product URLs from
        #[arg(long)]
        collection_url: Option<String>,
        /// Post the records to the import endpoint afterwards
        #[arg(long)]
        import: bool,
    },
    /// Extract a record from a saved product page
    Extract {
        #[arg(long)]
        file: PathBuf,
        /// URL to record for the page
        #[arg(long, default_value = "")]
        url: String,
    },
    /// Post a previously written JSON file to the import endpoint
    Import {
        #[arg(long)]
        file: PathBuf,
    },
}

fn build_pipeline(config: &Config) -> anyhow::Result<ExtractionPipeline> {
    let schema = config.schema.build().context("invalid [schema] section")?;
    Ok(ExtractionPipeline::new(config.extraction.clone(), schema)?)
}

async fn import_records(config: &Config, records: &[ProductRecord]) -> anyhow::Result<()> {
    let Some(endpoint) = config.import.endpoint.as_deref() else {
        bail!("no import endpoint configured; set [import].endpoint or RACKET_IMPORT_URL");
    };
    let client = ImportClient::new(endpoint, config.import.batch_size)?;
    let summary = client.import(records).await.context("import failed")?;
    println!("📤 Imported {} records in {} batches", summary.sent, summary.batches);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    let output_dir = Path::new(&config.output.dir);

    match cli.command {
        Commands::Discover { collection_url } => {
            let fetcher = HttpPageFetcher::new(&config.scraper)?;
            let links = discover_collection(&fetcher, &collection_url, config.scraper.max_pages).await;

            std::fs::create_dir_all(output_dir)?;
            let names_path = output_dir.join("racket_names.txt");
            output::write_names(&links, &names_path)?;

            println!("🔎 Found {} products:", links.len());
            for link in &links {
                println!("   {} ({})", link.name, link.url);
            }
            println!("💾 Names saved to {}", names_path.display());
        }
        Commands::Scrape {
            urls,
            collection_url,
            import,
        } => {
            let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpPageFetcher::new(&config.scraper)?);
            let urls: Vec<String> = match (urls, collection_url) {
                (Some(list), _) => list
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                (None, Some(collection_url)) => {
                    discover_collection(fetcher.as_ref(), &collection_url, config.scraper.max_pages)
                        .await
                        .into_iter()
                        .map(|link| link.url)
                        .collect()
                }
                (None, None) => bail!("pass --urls or --collection-url"),
            };
            info!("Scraping {} product URLs", urls.len());

            let runner = ScrapeRunner::new(fetcher, build_pipeline(&config)?);
            let report = runner.run(&urls).await;

            println!("\n📊 Scrape results:");
            println!("   Total pages: {}", report.total);
            println!("   Records: {}", report.records.len());
            println!("   Skipped: {}", report.skipped.len());
            for url in &report.skipped {
                println!("   - {}", url);
            }

            let written = output::persist(&report.records, output_dir, &config.output.formats)?;
            for path in &written {
                println!("   Output file: {}", path.display());
            }

            if import {
                if let Err(e) = import_records(&config, &report.records).await {
                    warn!("Import failed: {:#}", e);
                    return Err(e);
                }
            }
        }
        Commands::Extract { file, url } => {
            let markup = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let record = build_pipeline(&config)?.extract(&url, Some(&markup));
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Import { file } => {
            let records = output::read_json(&file).with_context(|| format!("failed to read {}", file.display()))?;
            import_records(&config, &records).await?;
        }
    }

    Ok(())
}
