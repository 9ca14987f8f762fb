// =============================================================================
// Funding APR — Command-line entry point
// =============================================================================
//
// Subcommands:
//   analyze          Compute APR for one funding file and print / export it
//   detect-interval  Suggest the funding interval from timestamp cadence
//   serve            Run the stateless HTTP service
//   init-config      Write a default JSON config file
// =============================================================================

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use funding_apr::classify::AprBucket;
use funding_apr::indicators::rsi::current_rsi;
use funding_apr::runtime_config::{config_path_from_env, RuntimeConfig};
use funding_apr::types::format_pct;
use funding_apr::{api, export, pipeline, AprReport, ColumnSelection, Config, FundingTable, RateFormat};

// ---------------------------------------------------------------------------
// CLI argument structs
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "funding-apr",
    version,
    about = "Annualized APR from perpetual-futures funding-rate history",
    propagate_version = true
)]
struct Cli {
    /// Path to the JSON config file (default: $FUNDING_APR_CONFIG or apr_config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute website-style and legacy APR for a funding file
    Analyze(AnalyzeArgs),
    /// Suggest the funding interval implied by the timestamps
    DetectInterval(InputArgs),
    /// Serve the APR computation over HTTP
    Serve(ServeArgs),
    /// Write a default config file
    InitConfig {
        /// Destination (defaults to the --config path)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Funding CSV file (Bybit, WOOX, Hyperliquid or compatible)
    file: PathBuf,

    /// Timestamp column (auto-detected when omitted)
    #[arg(long)]
    time_col: Option<String>,

    /// Funding-rate column (auto-detected when omitted)
    #[arg(long)]
    rate_col: Option<String>,

    /// How the rate column is expressed: decimal (0.0001) or percent (0.01 / 0.01%)
    #[arg(long)]
    rate_format: Option<RateFormat>,
}

#[derive(Args)]
struct AnalyzeArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Confirmed funding interval in hours (detected from timestamps when omitted)
    #[arg(long)]
    interval_hours: Option<f64>,

    /// Trailing APR window, 1 to 90 days
    #[arg(long)]
    window_days: Option<u32>,

    /// Exchange label for the audit record and export file names
    #[arg(long)]
    exchange: Option<String>,

    /// Print the full report as JSON instead of the summary
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Write `<exchange>_with_apr.csv` and `<exchange>_apr_logic_summary.csv` here
    #[arg(long)]
    export_dir: Option<PathBuf>,
}

#[derive(Args)]
struct ServeArgs {
    /// Listen address (default from config / FUNDING_APR_BIND_ADDR)
    #[arg(long)]
    bind: Option<String>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(config_path_from_env()));

    match cli.command {
        Commands::Analyze(args) => analyze(&load_defaults(&config_path), args),
        Commands::DetectInterval(args) => detect_interval(&load_defaults(&config_path), args),
        Commands::Serve(args) => serve(load_defaults(&config_path), args).await,
        Commands::InitConfig { path, force } => init_config(&path.unwrap_or(config_path), force),
    }
}

fn load_defaults(path: &Path) -> RuntimeConfig {
    let mut config = if path.exists() {
        RuntimeConfig::load(path).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            RuntimeConfig::default()
        })
    } else {
        info!(path = %path.display(), "No config file, using defaults");
        RuntimeConfig::default()
    };
    config.apply_env();
    config
}

/// Flags override file defaults.
fn merge_input(defaults: &RuntimeConfig, input: &InputArgs) -> RuntimeConfig {
    RuntimeConfig {
        timestamp_column: input.time_col.clone().or_else(|| defaults.timestamp_column.clone()),
        rate_column: input.rate_col.clone().or_else(|| defaults.rate_column.clone()),
        rate_format: input.rate_format.unwrap_or(defaults.rate_format),
        ..defaults.clone()
    }
}

fn load_input(options: &RuntimeConfig, file: &Path) -> Result<(FundingTable, ColumnSelection)> {
    let table = FundingTable::from_path(file)?;
    if table.is_empty() {
        warn!(path = %file.display(), "funding file has a header but no rows");
    }
    let selection = ColumnSelection::resolve(
        table.headers(),
        options.timestamp_column.as_deref(),
        options.rate_column.as_deref(),
    )
    .with_context(|| format!("failed to select columns in {}", file.display()))?;

    info!(
        rows = table.len(),
        timestamp_column = %selection.timestamp_column,
        rate_column = %selection.rate_column,
        "funding file loaded"
    );
    Ok((table, selection))
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

fn analyze(defaults: &RuntimeConfig, args: AnalyzeArgs) -> Result<()> {
    let mut options = merge_input(defaults, &args.input);
    if let Some(hours) = args.interval_hours {
        options.interval_hours = Some(hours);
    }
    if let Some(days) = args.window_days {
        options.window_days = days;
    }
    if let Some(exchange) = &args.exchange {
        options.exchange = exchange.clone();
    }

    let (table, selection) = load_input(&options, &args.input.file)?;
    let detected = pipeline::suggest_interval(
        &table,
        &selection,
        options.rate_format,
        options.fallback_interval_hours,
    );
    let config = options
        .to_config(detected.hours)
        .context("invalid run configuration")?;

    let report = pipeline::run(&table, &selection, &config);

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("failed to serialise report")?;
        println!("{json}");
    } else {
        print_summary(&report, &config);
    }

    if let Some(dir) = args.export_dir {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create export dir {}", dir.display()))?;
        export::save_enriched(&table, &report, dir.join(export::enriched_file_name(config.exchange())))?;
        export::save_logic(&report.audit, dir.join(export::logic_file_name(config.exchange())))?;
    }

    Ok(())
}

fn detect_interval(defaults: &RuntimeConfig, args: InputArgs) -> Result<()> {
    let options = merge_input(defaults, &args);
    let (table, selection) = load_input(&options, &args.file)?;
    let estimate = pipeline::suggest_interval(
        &table,
        &selection,
        options.rate_format,
        options.fallback_interval_hours,
    );

    let source = if estimate.detected { "detected" } else { "fallback" };
    println!("{}h ({source})", estimate.hours);
    Ok(())
}

async fn serve(defaults: RuntimeConfig, args: ServeArgs) -> Result<()> {
    let bind_addr = args.bind.unwrap_or_else(|| defaults.bind_addr.clone());
    let app = api::router(Arc::new(defaults));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    info!("API server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    warn!("Shutdown signal received, stopping gracefully");
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    RuntimeConfig::default().save(path)?;
    println!("wrote {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Summary rendering
// ---------------------------------------------------------------------------

fn bucket_glyph(bucket: AprBucket) -> char {
    match bucket {
        AprBucket::HighPositive => '+',
        AprBucket::HighNegative => '-',
        AprBucket::NearZero => '0',
        AprBucket::Moderate => '=',
    }
}

fn print_summary(report: &AprReport, config: &Config) {
    let (website, legacy) = report.headline();
    let summary = &report.summary;
    let instant = |t: Option<chrono::DateTime<chrono::Utc>>| {
        t.map_or_else(|| "N/A".to_string(), |t| t.format("%Y-%m-%d %H:%M UTC").to_string())
    };

    println!("APR Summary for Last {} Days ({})", config.window_days(), config.exchange());
    println!("  Website-Style APR (preferred):  {website}");
    println!("  Average of Interval APRs:       {legacy}");
    println!("  Rows used / expected:           {} / {}", summary.rows_used, summary.rows_expected);
    println!(
        "  Window:                         {} -> {}",
        instant(summary.window_start),
        instant(summary.window_end)
    );

    let detected = report
        .audit
        .detected_interval_hours
        .map_or_else(|| "not detected".to_string(), |h| format!("detected {h}h"));
    println!("  Funding interval:               {}h ({detected})", config.interval_hours());

    if let Some(last) = report.rows.last() {
        println!("  Latest funding:                 {}", format_pct(Some(last.funding_pct)));
        println!("  Latest EMA10 / EMA30:           {} / {}", format_pct(last.ema10), format_pct(last.ema30));
    }
    let rsi: Vec<Option<f64>> = report.rows.iter().map(|r| r.rsi14).collect();
    match current_rsi(&rsi) {
        Some((value, label)) => println!("  Latest RSI14:                   {value:.2} ({label})"),
        None => println!("  Latest RSI14:                   N/A"),
    }

    if !report.strip.is_empty() {
        println!("Threshold strip (+ >100%, - <-100%, 0 near zero, = moderate):");
        for day in &report.strip {
            let glyphs: String = day.buckets.iter().map(|b| bucket_glyph(*b)).collect();
            println!("  {}  {glyphs}", day.date);
        }
    }

    for advisory in &report.advisories {
        println!("! {advisory}");
    }
}
