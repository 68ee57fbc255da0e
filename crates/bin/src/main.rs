//! Hobart CLI binary.
//!
//! Provides command-line interface for building labeled fundamentals datasets.

mod integration;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use hobart::universe::{FileUniverse, Universe};
use hobart_data::{FmpClient, FmpConfig, PriceVariationProvider};
use hobart_dataset::{AlignmentPolicy, DatasetConfig, IndicatorList, SparsityThresholds, Threshold};
use hobart_output::ExportFormat;
use indicatif::{ProgressBar, ProgressStyle};
use integration::cache_manager::{get_cache_path, open_cache, open_shared_cache};
use integration::pipeline::{build, default_price_window, finish, write_outputs};
use integration::retrieval::{
    DEFAULT_CONCURRENCY, FetchConfig, fetch_document_sets, fetch_price_variations,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hobart")]
#[command(about = "Hobart: labeled fundamentals datasets from annual filings", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a labeled dataset for one fiscal year
    Build {
        /// Symbol list, one per line
        #[arg(long)]
        universe: PathBuf,

        /// Indicator list, one per line (defaults to the bundled list)
        #[arg(long)]
        indicators: Option<PathBuf>,

        /// Fiscal year tag matched against filing dates
        #[arg(long, default_value = "2018")]
        year: String,

        /// First day of the price window (defaults to Jan 1 of the next year)
        #[arg(long)]
        price_start: Option<NaiveDate>,

        /// Last day of the price window (defaults to Dec 31 of the next year)
        #[arg(long)]
        price_end: Option<NaiveDate>,

        /// Maximum missing cells per column, as a count or a fraction like 0.024
        #[arg(long)]
        max_missing: Option<Threshold>,

        /// Maximum zero cells per column, as a count or a fraction like 0.03125
        #[arg(long)]
        max_zeros: Option<Threshold>,

        /// Filing to keep when several match the year (first or latest)
        #[arg(long, default_value = "first")]
        policy: AlignmentPolicy,

        /// Output path (defaults to hobart_<year>.<ext>)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format (csv, json or pretty-json)
        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// Also write the uncleaned matrix
        #[arg(long)]
        raw_output: Option<PathBuf>,

        /// Entities retrieved concurrently
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,

        /// Disable caching (always fetch fresh data)
        #[arg(long)]
        no_cache: bool,

        /// Force refresh cached data
        #[arg(long)]
        refresh: bool,

        /// Statements API key
        #[arg(long, env = "FMP_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// Print the effective indicator list
    Indicators {
        /// Indicator list file (defaults to the bundled list)
        #[arg(long)]
        indicators: Option<PathBuf>,
    },

    /// Inspect or clear the local cache
    Cache {
        /// Show cache statistics
        #[arg(long)]
        stats: bool,

        /// Delete all cached data
        #[arg(long)]
        clear: bool,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hobart=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            universe,
            indicators,
            year,
            price_start,
            price_end,
            max_missing,
            max_zeros,
            policy,
            output,
            format,
            raw_output,
            concurrency,
            no_cache,
            refresh,
            api_key,
        } => {
            let defaults = SparsityThresholds::default();
            let thresholds = SparsityThresholds {
                max_missing: max_missing.unwrap_or(defaults.max_missing),
                max_zeros: max_zeros.unwrap_or(defaults.max_zeros),
            };
            let config = DatasetConfig::new(year, load_indicators(indicators.as_deref())?)
                .with_thresholds(thresholds)
                .with_policy(policy);
            config.validate()?;

            let window = match (price_start, price_end) {
                (Some(start), Some(end)) => (start, end),
                (start, end) => {
                    let (default_start, default_end) =
                        default_price_window(&config.fiscal_year_tag)?;
                    (start.unwrap_or(default_start), end.unwrap_or(default_end))
                }
            };

            let output = output.unwrap_or_else(|| {
                PathBuf::from(format!("hobart_{}.{}", config.fiscal_year_tag, format.extension()))
            });
            let fetch = FetchConfig {
                use_cache: !no_cache,
                force_refresh: refresh,
                concurrency,
            };

            build_dataset(BuildRequest {
                universe: &universe,
                config,
                window,
                output: &output,
                raw_output: raw_output.as_deref(),
                format,
                fetch,
                api_key: api_key.unwrap_or_default(),
            })
            .await?;
        }
        Commands::Indicators { indicators } => {
            let list = load_indicators(indicators.as_deref())?;
            for (i, name) in list.iter().enumerate() {
                println!("{:>4}  {}", i + 1, name);
            }
            println!("\n{} indicators", list.len());
        }
        Commands::Cache { stats, clear, json } => {
            manage_cache(stats, clear, json)?;
        }
    }

    Ok(())
}

fn load_indicators(path: Option<&Path>) -> Result<IndicatorList, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(IndicatorList::from_file(path)
            .map_err(|e| format!("Failed to read indicators {}: {}", path.display(), e))?),
        None => Ok(IndicatorList::bundled()),
    }
}

fn progress_bar(
    len: usize,
    message: &'static str,
) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    Ok(pb)
}

struct BuildRequest<'a> {
    universe: &'a Path,
    config: DatasetConfig,
    window: (NaiveDate, NaiveDate),
    output: &'a Path,
    raw_output: Option<&'a Path>,
    format: ExportFormat,
    fetch: FetchConfig,
    api_key: String,
}

async fn build_dataset(request: BuildRequest<'_>) -> Result<(), Box<dyn std::error::Error>> {
    let BuildRequest {
        universe,
        config,
        window,
        output,
        raw_output,
        format,
        fetch,
        api_key,
    } = request;

    let universe = FileUniverse::from_file(universe)?;
    let symbols = Universe::symbols(&universe);
    let client = FmpClient::new(FmpConfig::new(api_key))?;
    let provider = PriceVariationProvider::new()?;

    println!("Fiscal year:  {}", config.fiscal_year_tag);
    println!("Universe:     {} symbols", universe.size());
    println!("Indicators:   {}", config.indicators.len());
    println!("Price window: {} to {}", window.0, window.1);
    if fetch.use_cache {
        println!("Cache:        {}", get_cache_path().display());
        if fetch.force_refresh {
            println!("  Mode: Force refresh (re-fetching all data)");
        }
    } else {
        println!("Cache:        Disabled");
    }
    println!();

    let cache = open_shared_cache(fetch.use_cache);

    let pb = progress_bar(symbols.len(), "Fetching statements...")?;
    let retrieved = fetch_document_sets(&client, &symbols, cache.as_ref(), &fetch, Some(&pb)).await;
    pb.finish_with_message("Statements retrieved");

    let built = build(&config, retrieved)?;
    info!(
        aligned = built.retained(),
        dropped = built.dropped.len(),
        "aligned filings"
    );

    let aligned = built.matrix.entities().to_vec();
    let pb = progress_bar(aligned.len(), "Fetching price variations...")?;
    let variations = fetch_price_variations(
        &provider,
        &aligned,
        window.0,
        window.1,
        cache.as_ref(),
        &fetch,
        Some(&pb),
    )
    .await;
    pb.finish_with_message("Price variations retrieved");

    let run = finish(&config, &built, &variations, window)?;
    write_outputs(&run, output, raw_output, format)?;

    println!("{}", run.summary.to_ascii_table());
    println!("Dataset written to {}", output.display());
    if let Some(path) = raw_output {
        println!("Raw matrix written to {}", path.display());
    }

    Ok(())
}

fn manage_cache(stats: bool, clear: bool, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let cache = open_cache()?;

    if clear {
        cache.clear()?;
        info!(path = %get_cache_path().display(), "cache cleared");
    }

    if stats || !clear {
        let stats = cache.get_stats()?;
        if json {
            let value = json!({
                "path": get_cache_path().display().to_string(),
                "stats": stats,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
            return Ok(());
        }

        println!("Cache location: {}", get_cache_path().display());
        println!("  Statement documents: {}", stats.documents);
        println!("  Symbols:             {}", stats.unique_symbols);
        println!("  Price variations:    {}", stats.price_variations);
    }

    Ok(())
}
