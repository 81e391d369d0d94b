//! Stock Advisor: scores A-share symbols and prints a trading decision
//!
//! Usage:
//!   stock-advisor analyze 600519                  # analyze one symbol (live data)
//!   stock-advisor batch 600519,000001 --mock      # analyze several symbols offline
//!   stock-advisor cache stats                     # inspect the local data cache

mod config;

use anyhow::Context;
use cache::CacheDb;
use clap::{Parser, Subcommand, ValueEnum};
use config::AdvisorConfig;
use engine::{
    AnalysisPipeline, AnalysisReport, BlendPolicy, CachedProvider, FundamentalProvider,
    HistoryProvider, MarketRegime, MockMarketData, NewsProvider, PipelineConfig, Providers,
    SinaClient, WeightProfile,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "stock-advisor")]
#[command(about = "Signal scoring and consensus decisions for A-share stocks", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone)]
struct AnalysisArgs {
    /// Market regime selecting the technical weight profile
    #[arg(long, default_value = "default")]
    regime: MarketRegime,
    /// JSON weight profile file (overrides --regime)
    #[arg(long)]
    weights: Option<PathBuf>,
    /// Technical, fundamental and sentiment blend weights, e.g. 0.4,0.3,0.3
    #[arg(long, value_delimiter = ',')]
    blend: Option<Vec<f64>>,
    /// Use deterministic offline data instead of live sources
    #[arg(long)]
    mock: bool,
    /// Seed for --mock data
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Bypass the local cache
    #[arg(long)]
    no_cache: bool,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one symbol
    Analyze {
        /// Symbol, with or without exchange prefix (600519, sh600519)
        symbol: String,
        #[command(flatten)]
        args: AnalysisArgs,
    },
    /// Analyze several symbols concurrently
    Batch {
        /// Symbols (comma-separated)
        #[arg(value_delimiter = ',', required = true)]
        symbols: Vec<String>,
        #[command(flatten)]
        args: AnalysisArgs,
    },
    /// Inspect or prune the local data cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show entry counts and age range
    Stats,
    /// Delete entries older than the configured TTL
    Purge,
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug,engine=debug,cache=debug,stock_advisor=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,engine=info,stock_advisor=info"))
    };

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = AdvisorConfig::from_env()?;

    match cli.command {
        Commands::Analyze { symbol, args } => {
            let pipeline = build_pipeline(&config, &args).await?;
            let report = pipeline.run(&symbol).await;
            print_reports(std::slice::from_ref(&report), args.format)?;
        }
        Commands::Batch { symbols, args } => {
            let pipeline = build_pipeline(&config, &args).await?;
            let reports = pipeline.batch(&symbols).await;
            print_reports(&reports, args.format)?;
        }
        Commands::Cache { action } => {
            cmd_cache(&config, action).await?;
        }
    }

    Ok(())
}

fn load_weights(args: &AnalysisArgs) -> anyhow::Result<WeightProfile> {
    match &args.weights {
        Some(path) => WeightProfile::load(path)
            .with_context(|| format!("loading weight profile {}", path.display())),
        None => Ok(WeightProfile::for_regime(args.regime)),
    }
}

fn blend_policy(args: &AnalysisArgs) -> anyhow::Result<BlendPolicy> {
    match args.blend.as_deref() {
        None => Ok(BlendPolicy::default()),
        Some([technical, fundamental, sentiment]) => {
            Ok(BlendPolicy::new(*technical, *fundamental, *sentiment))
        }
        Some(other) => anyhow::bail!("--blend takes exactly 3 weights, got {}", other.len()),
    }
}

async fn build_pipeline(config: &AdvisorConfig, args: &AnalysisArgs) -> anyhow::Result<AnalysisPipeline> {
    let weights = load_weights(args)?;
    let blend = blend_policy(args)?;
    let pipeline_config = PipelineConfig {
        concurrency: config.concurrency,
        ..PipelineConfig::default()
    };

    let mock = MockMarketData::new(args.seed);
    let providers = if args.mock {
        info!(seed = args.seed, "Using offline mock data");
        Providers::mock(mock)
    } else {
        live_providers(config, args, mock).await?
    };

    info!(weights = %weights.name, regime = %args.regime.as_str(), "Pipeline ready");
    Ok(AnalysisPipeline::new(providers, weights, blend, pipeline_config))
}

/// Quotes and history come from Sina only: when it fails the pipeline reports
/// the gap instead of pricing off synthetic data. Fundamentals and news have no
/// live source and come from the mock's board defaults.
async fn live_providers(
    config: &AdvisorConfig,
    args: &AnalysisArgs,
    mock: MockMarketData,
) -> anyhow::Result<Providers> {
    let sina = Arc::new(
        SinaClient::with_urls(&config.sina_base_url, &config.sina_history_url)
            .context("building Sina client")?,
    );
    let mock = Arc::new(mock);

    let history: Arc<dyn HistoryProvider>;
    let fundamentals: Arc<dyn FundamentalProvider>;
    let news: Arc<dyn NewsProvider>;
    if args.no_cache {
        history = sina.clone();
        fundamentals = mock.clone();
        news = mock.clone();
    } else {
        let db = CacheDb::new(&config.cache_path)
            .await
            .with_context(|| format!("opening cache {}", config.cache_path))?;
        let ttl = config.cache_ttl();
        history = Arc::new(CachedProvider::new(sina.clone(), db.clone(), ttl));
        fundamentals = Arc::new(CachedProvider::new(mock.clone(), db.clone(), ttl));
        news = Arc::new(CachedProvider::new(mock.clone(), db, ttl));
    }

    warn!("No live fundamentals or news source configured, using board defaults");

    Ok(Providers {
        quotes: sina,
        history,
        fundamentals,
        news,
    })
}

fn print_reports(reports: &[AnalysisReport], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let json = match reports {
                [single] => serde_json::to_string_pretty(single)?,
                many => serde_json::to_string_pretty(many)?,
            };
            println!("{json}");
        }
        OutputFormat::Text => {
            for report in reports {
                print_text(report);
            }
        }
    }
    Ok(())
}

fn print_text(report: &AnalysisReport) {
    let d = &report.decision;
    println!("\n=== {} ===", report.symbol);
    if let Some(q) = &report.quote {
        println!("Price: {} ({}%)  {}", q.price, q.change_percent, q.name);
    }
    println!(
        "Scores: technical {:.2} | fundamental {:.2} | sentiment {:.2} | overall {:.2}",
        d.technical_score, d.fundamental_score, d.sentiment_score, d.overall_score
    );
    println!(
        "Consensus: {} (bull {:.2} / bear {:.2})",
        report.debate.consensus, report.debate.bull_score, report.debate.bear_score
    );
    println!("Decision: {} (confidence {:.0}%)", d.action, d.confidence * 100.0);
    if let (Some(stop), Some(target)) = (d.stop_loss, d.target_price) {
        println!("Stop loss: {stop} | Target: {target}");
    }
    if let Some(sell) = d.sell_price {
        println!("Sell at: {sell}");
    }
    for reason in &d.reasons {
        println!("  - {reason}");
    }
    for warning in &report.warnings {
        println!("  ! {warning}");
    }
    print!("{}", report.diagnosis.report);
}

async fn cmd_cache(config: &AdvisorConfig, action: CacheAction) -> anyhow::Result<()> {
    let db = CacheDb::new(&config.cache_path)
        .await
        .with_context(|| format!("opening cache {}", config.cache_path))?;
    let repo = db.repository();

    match action {
        CacheAction::Stats => {
            let stats = repo.stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        CacheAction::Purge => {
            let removed = repo.purge_expired(config.cache_ttl()).await?;
            info!(removed, path = %config.cache_path, "Purged expired cache entries");
            println!("Removed {removed} expired entries");
        }
    }
    Ok(())
}
