//! ConvertEase CLI - command-line host for the conversion service client.
//!
//! Stands in for the UI: picks files from the command line, runs a batch,
//! renders batch events as log lines and prints per-item outcomes.

mod host;
mod metrics;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio::sync::broadcast::{error::RecvError, Receiver};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use convertease_core::{
    load_config, normalize_result_url, validate_config, BatchEvent, BatchOrchestrator, Category,
    Config, ConvertClient, FormatCatalog, HttpTransport, ItemStatus, RequestTemplate,
};

use host::{HttpDownloader, PathFileSelector};

/// Environment variable naming the configuration file.
const CONFIG_ENV: &str = "CONVERTEASE_CONFIG";

/// Convert documents and audio with the ConvertEase service
#[derive(Parser, Debug)]
#[command(name = "convertease", author, version)]
struct Args {
    /// Configuration file (overrides CONVERTEASE_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "convertease_core=trace" (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Print metrics in Prometheus text format after the command
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert files in one batch, one at a time
    Convert {
        /// Conversion category (document, audio, image)
        #[arg(long)]
        category: Category,

        /// Source format; files with other extensions are skipped
        #[arg(long)]
        source: Option<String>,

        /// Target format
        #[arg(long)]
        target: String,

        /// Download results into this directory
        #[arg(long)]
        download_dir: Option<PathBuf>,

        /// Files to convert
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List supported conversions for a category
    Formats {
        /// Conversion category (document, audio, image)
        #[arg(long)]
        category: Category,
    },

    /// Check whether the service is reachable
    Health,

    /// Print the public form of a result URL
    Normalize {
        /// URL as reported by the service
        url: String,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Convert { .. } => "convert",
            Command::Formats { .. } => "formats",
            Command::Health => "health",
            Command::Normalize { .. } => "normalize",
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; stdout is reserved for command output
    let filter = match &args.log_level {
        Some(level) => EnvFilter::try_new(level).context("Invalid log level")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = resolve_config(args.config.clone())?;
    info!(base_url = %config.api.resolved_base_url(), "Configuration loaded");

    let command = args.command.name();
    let result = execute(args.command, &config).await;
    let label = if result.is_ok() { "success" } else { "error" };
    metrics::COMMANDS_TOTAL
        .with_label_values(&[command, label])
        .inc();

    if args.metrics {
        print!("{}", metrics::encode_metrics().context("Failed to encode metrics")?);
    }

    result
}

/// Load the configuration file if one is named, else use defaults.
fn resolve_config(explicit: Option<PathBuf>) -> Result<Config> {
    let path = explicit.or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from));

    let config = match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(&path)
                .with_context(|| format!("Failed to load config from {:?}", path))?
        }
        None => {
            debug!("No configuration file, using defaults");
            Config::default()
        }
    };

    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

fn build_client(config: &Config) -> Result<ConvertClient<HttpTransport>> {
    let transport = HttpTransport::new(&config.api).context("Failed to build HTTP client")?;
    Ok(ConvertClient::new(transport, &config.api))
}

async fn execute(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Convert {
            category,
            source,
            target,
            download_dir,
            files,
        } => {
            convert(
                config,
                RequestTemplate::new(category, source.as_deref(), &target),
                download_dir,
                files,
            )
            .await
        }
        Command::Formats { category } => formats(config, category).await,
        Command::Health => health(config).await,
        Command::Normalize { url } => {
            println!("{}", normalize_result_url(&url));
            Ok(())
        }
    }
}

async fn convert(
    config: &Config,
    template: RequestTemplate,
    download_dir: Option<PathBuf>,
    files: Vec<PathBuf>,
) -> Result<()> {
    let client = build_client(config)?;

    let mut catalog = FormatCatalog::new();
    catalog.refresh(&client, template.category).await;
    if let Some(source) = template.source_format.as_deref() {
        if !catalog.supports(template.category, source, &template.target_format) {
            warn!(
                category = %template.category,
                source,
                target = %template.target_format,
                "Conversion not listed as supported, submitting anyway"
            );
        }
    }

    let batch = Arc::new(BatchOrchestrator::new(
        config.batch.clone(),
        config.polling.clone(),
        Arc::new(client),
    ));

    // Feed every path through the picker seam, a page at a time
    let selector = PathFileSelector::new(files);
    while !selector.is_exhausted().await {
        let outcome = batch
            .add_selected(&selector, &template, &catalog)
            .await
            .context("Failed to read input files")?;
        for skipped in &outcome.skipped {
            warn!(file = %skipped.name, reason = %skipped.reason, "Skipped file");
        }
    }

    if batch.items().await.is_empty() {
        bail!("No files to convert");
    }

    let renderer = tokio::spawn(render_events(batch.subscribe()));

    let cancel_on_interrupt = {
        let batch = Arc::clone(&batch);
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling batch");
                batch.cancel();
            }
        })
    };

    let summary = batch.run().await.context("Failed to run batch")?;
    cancel_on_interrupt.abort();
    let _ = renderer.await;

    let downloader = match download_dir {
        Some(dir) => Some(
            HttpDownloader::new(dir, Duration::from_secs(config.api.request_timeout_secs))
                .context("Failed to build download client")?,
        ),
        None => None,
    };

    for item in batch.items().await {
        match item.status {
            ItemStatus::Success => {
                let url = item.result_url.as_deref().unwrap_or_default();
                println!("success\t{}\t{}", item.name, url);
                if let Some(downloader) = &downloader {
                    match batch.download_result(&item.id, downloader).await {
                        Ok(path) => println!("saved\t{}\t{}", item.name, path.display()),
                        Err(e) => warn!(file = %item.name, error = %e, "Download failed"),
                    }
                }
            }
            ItemStatus::Error => {
                println!(
                    "error\t{}\t{}",
                    item.name,
                    item.error.as_deref().unwrap_or_default()
                );
            }
            status => println!("{}\t{}", status, item.name),
        }
    }

    if summary.cancelled {
        bail!(
            "Batch cancelled after {} of {} files",
            summary.succeeded + summary.failed,
            summary.total
        );
    }
    if summary.failed > 0 {
        bail!("{} of {} conversions failed", summary.failed, summary.total);
    }
    Ok(())
}

/// Log batch events until the run completes.
async fn render_events(mut events: Receiver<BatchEvent>) {
    loop {
        match events.recv().await {
            Ok(BatchEvent::Started { total }) => info!(total, "Converting files"),
            Ok(BatchEvent::ItemProgress { id, percent }) => debug!(item_id = %id, percent, "Polling"),
            Ok(BatchEvent::ItemFailed { name, message, .. }) => {
                warn!(file = %name, "Conversion failed: {}", message)
            }
            Ok(BatchEvent::Progress {
                done,
                total,
                percent,
            }) => info!("Progress {}/{} ({}%)", done, total, percent),
            Ok(BatchEvent::Completed { .. }) => break,
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => debug!(skipped, "Event renderer lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}

async fn formats(config: &Config, category: Category) -> Result<()> {
    let client = build_client(config)?;
    let mut catalog = FormatCatalog::new();
    let origin = if catalog.refresh(&client, category).await {
        "service"
    } else {
        "built-in"
    };
    info!(category = %category, origin, "Format table");

    for source in catalog.sources(category) {
        println!("{}\t{}", source, catalog.targets_for(category, source).join(", "));
    }
    Ok(())
}

async fn health(config: &Config) -> Result<()> {
    let client = build_client(config)?;
    let healthy = client.check_health().await;
    println!(
        "{}\t{}",
        if healthy { "healthy" } else { "unavailable" },
        client.base_url()
    );
    Ok(())
}
