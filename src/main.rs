use crate::config::{build_channel, Config};
use crate::errors::AppError;
use crate::geo::{Geocoder, NominatimGeocoder, RateLimitedGeocoder};
use crate::domain::Listing;
use crate::notify::{DispatchResult, Dispatcher, NotificationChannel};
use crate::pipeline::{CancelToken, MatchingPipeline, Scanner};
use crate::places::Registry;
use crate::report::{group_by_point_of_interest, write_report};
use crate::router::{handle, AppState};
use crate::scraper::{source_by_key, FetchMode, HttpFetcher};
use crate::store::{load_snapshot, ListingStore};
use astra::Server;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

mod config;
mod domain;
mod errors;
mod geo;
mod notify;
mod pipeline;
mod places;
mod report;
mod responses;
mod router;
mod scraper;
mod store;
mod templates;

#[cfg(test)]
mod tests;

/// Finds houses for sale near a list of places you care about.
#[derive(Debug, Parser)]
#[command(name = "home_finder", version, about)]
struct Cli {
    /// Points of interest JSON file (overrides POI_FILE)
    #[arg(long, global = true)]
    places: Option<PathBuf>,

    /// Listing snapshot file (overrides SNAPSHOT_FILE)
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// HTML report output file (overrides REPORT_FILE)
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scrape every region and source, then write the report and send the digest
    Scan {
        /// Ignore the existing snapshot and start from nothing
        #[arg(long)]
        fresh: bool,
        /// Skip the notification step
        #[arg(long)]
        no_notify: bool,
    },
    /// Send the digest for the last snapshot without scraping
    Notify,
    /// Re-render the HTML report from the last snapshot
    Report,
    /// Serve the report and the raw snapshot over HTTP
    Serve {
        /// Listen address (overrides SERVE_ADDR)
        #[arg(long)]
        addr: Option<SocketAddr>,
    },
}

fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "home_finder=info".into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("❌ {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = Config::from_env()?;
    if let Some(path) = cli.places {
        config.poi_file = path;
    }
    if let Some(path) = cli.snapshot {
        config.snapshot_file = path;
    }
    if let Some(path) = cli.report {
        config.report_file = path;
    }

    match cli.command {
        Command::Scan { fresh, no_notify } => scan(&config, fresh, !no_notify),
        Command::Notify => notify_only(&config),
        Command::Report => report_only(&config),
        Command::Serve { addr } => serve(&config, addr.unwrap_or(config.serve_addr)),
    }
}

fn scan(config: &Config, fresh: bool, notify: bool) -> Result<(), AppError> {
    let registry = Arc::new(Registry::load(&config.poi_file)?);
    if registry.is_empty() {
        warn!("⚠️ No points of interest in {}, nothing can match", config.poi_file.display());
    }

    let store = if fresh {
        info!("🆕 Starting fresh, ignoring {}", config.snapshot_file.display());
        ListingStore::new()
    } else {
        ListingStore::resume(&config.snapshot_file)
    };
    let store = Arc::new(store);

    let nominatim = NominatimGeocoder::new(&config.geocoder_url, &config.geocoder_user_agent)
        .map_err(|e| AppError::Client(e.to_string()))?;
    let limited = RateLimitedGeocoder::new(nominatim, config.geocode_interval);
    info!(
        interval_ms = limited.interval().as_millis() as u64,
        "🌍 Geocoding through {}", config.geocoder_url
    );
    let geocoder: Arc<dyn Geocoder> = Arc::new(limited);

    let pipeline = MatchingPipeline::new(geocoder, registry.clone(), store.clone())
        .with_radius(config.radius_miles)
        .with_locality_suffix(config.locality_suffix.clone());

    let mode = match &config.zenrows_api_key {
        Some(api_key) => {
            info!("🛡️ Fetching through ZenRows");
            FetchMode::ZenRows {
                api_key: api_key.clone(),
            }
        }
        None => FetchMode::Direct,
    };
    let fetcher = Arc::new(HttpFetcher::new(mode, config.fetch_timeout, config.fetch_attempts)?);

    // Keys were validated when the config was read.
    let sources = config.sources.iter().filter_map(|key| source_by_key(key)).collect();

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        warn!("🛑 Interrupted, finishing current page and saving");
        on_interrupt.cancel();
    }) {
        warn!("⚠️ Could not install Ctrl+C handler: {e}");
    }

    let summary = Scanner::new(fetcher, sources, pipeline, &config.snapshot_file, &config.state_code)
        .with_workers(config.scan_workers)
        .with_cancel(cancel)
        .run(&config.regions);

    let channel = if summary.cancelled {
        info!("Scan was interrupted, not sending a digest");
        None
    } else if notify {
        open_channel(config)
    } else {
        None
    };

    let (report, digest) = publish(config, &store.all(), &registry, channel);
    if !digest.is_success() {
        warn!(
            "⚠️ Digest was not delivered, listings are still in {}",
            config.snapshot_file.display()
        );
    }
    report
}

/// Writes the report, then sends the digest whether or not the report was
/// written. A report failure is returned only after the send was attempted.
fn publish(
    config: &Config,
    listings: &[Listing],
    registry: &Registry,
    channel: Option<Box<dyn NotificationChannel>>,
) -> (Result<(), AppError>, DispatchResult) {
    let report = match write_report(&config.report_file, listings, registry) {
        Ok(()) => {
            info!("📄 Report written to {}", config.report_file.display());
            Ok(())
        }
        Err(source) => {
            error!("❌ Could not write report to {}: {source}", config.report_file.display());
            Err(AppError::Report {
                path: config.report_file.display().to_string(),
                source,
            })
        }
    };

    let digest = match channel {
        Some(channel) => send_digest(channel, config, listings, registry),
        None => DispatchResult::Skipped,
    };

    (report, digest)
}

fn notify_only(config: &Config) -> Result<(), AppError> {
    let registry = Registry::load(&config.poi_file)?;
    let listings = snapshot_or_empty(&config.snapshot_file);
    info!("📂 Loaded {} listings from {}", listings.len(), config.snapshot_file.display());

    if let Some(channel) = open_channel(config) {
        send_digest(channel, config, &listings, &registry);
    }
    Ok(())
}

/// An unreadable snapshot is logged and read as no listings.
fn snapshot_or_empty(path: &Path) -> Vec<Listing> {
    load_snapshot(path).unwrap_or_else(|e| {
        error!("❌ Could not read snapshot {}: {e}", path.display());
        Vec::new()
    })
}

fn report_only(config: &Config) -> Result<(), AppError> {
    let registry = Registry::load(&config.poi_file)?;
    let listings = load_snapshot(&config.snapshot_file)?;

    write_report(&config.report_file, &listings, &registry).map_err(|source| AppError::Report {
        path: config.report_file.display().to_string(),
        source,
    })?;

    info!(
        "📄 Report with {} listings written to {}",
        listings.len(),
        config.report_file.display()
    );
    Ok(())
}

/// Channel problems are logged and never fail the run.
fn open_channel(config: &Config) -> Option<Box<dyn NotificationChannel>> {
    match build_channel(config) {
        Ok(Some(channel)) => Some(channel),
        Ok(None) => {
            info!("🔕 No notification channel configured");
            None
        }
        Err(e) => {
            error!("❌ Notification channel unavailable: {e}");
            None
        }
    }
}

fn send_digest(
    channel: Box<dyn NotificationChannel>,
    config: &Config,
    listings: &[Listing],
    registry: &Registry,
) -> DispatchResult {
    let groups = group_by_point_of_interest(listings, registry.points());
    let dispatcher = Dispatcher::new(channel, config.digest.clone());
    let result = dispatcher.dispatch(&groups, listings.len());

    if let DispatchResult::Delivered { channel } = &result {
        info!("📨 Digest delivered via {channel}");
    }
    result
}

fn serve(config: &Config, addr: SocketAddr) -> Result<(), AppError> {
    let state = AppState {
        registry_path: config.poi_file.clone(),
        snapshot_path: config.snapshot_file.clone(),
    };

    info!("Starting server at http://{addr}");

    let server = Server::bind(&addr).max_workers(8);

    let result = server.serve(move |req, _info| match handle(req, &state) {
        Ok(resp) => resp,
        Err(err) => templates::html_error_response(err),
    });

    result.map_err(|e| AppError::Server(e.to_string()))?;

    info!("Server shut down cleanly.");
    Ok(())
}
