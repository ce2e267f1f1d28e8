//! Location code lookups from the command line or over HTTP.
//!
//! Loads the polygon catalog once, then resolves points to
//! `"<DisplayName>.<ShortCode>"` codes.

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use polycode::config::Config;
use polycode::pip::CatalogStats;
use polycode::shortcode::GridOffsetEncoder;
use polycode::{Catalog, LatLng, LocationCode, Locator, ResolveMode};

mod batch;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Resolve points to location codes")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Catalog file (JSON array of geocoder results, optionally .gz)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Fail on the first invalid catalog entry instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Scan the catalog linearly instead of building an R-tree
    #[arg(long)]
    no_index: bool,

    /// Short-code grid size in degrees
    #[arg(long)]
    precision: Option<f64>,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a single point
    Lookup {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        #[arg(long, default_value_t = ResolveMode::First)]
        mode: ResolveMode,
    },
    /// Resolve every `lat,lng` row of a CSV file
    Batch {
        #[arg(short, long)]
        input: PathBuf,
        /// Output CSV (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, default_value_t = ResolveMode::First)]
        mode: ResolveMode,
    },
    /// Serve the HTTP API
    Serve {
        /// Listen address
        #[arg(short, long)]
        listen: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; stdout is reserved for lookup output
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(path) = &args.catalog {
        config.catalog.path = Some(path.clone());
    }
    if args.strict {
        config.catalog.strict = true;
    }
    if args.no_index {
        config.catalog.index = false;
    }
    if let Some(precision) = args.precision {
        config.shortcode.precision = precision;
    }

    let locator = build_locator(&config)?;

    match args.command {
        Command::Lookup { lat, lng, mode } => {
            let codes = locator.locate(LatLng::new(lat, lng), mode);
            if codes.is_empty() {
                println!("None");
            }
            for code in codes {
                println!("{}", code.code);
            }
        }
        Command::Batch {
            input,
            output,
            mode,
        } => {
            let input = File::open(&input)
                .with_context(|| format!("Failed to open {}", input.display()))?;
            match output {
                Some(path) => {
                    let output = File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    batch::run_batch(&locator, input, output, mode, true)?;
                }
                None => {
                    batch::run_batch(&locator, input, io::stdout(), mode, false)?;
                }
            }
        }
        Command::Serve { listen } => {
            let listen = listen.unwrap_or(config.server.listen);
            serve(locator, &listen).await?;
        }
    }

    Ok(())
}

fn build_locator(config: &Config) -> Result<Locator> {
    let Some(path) = &config.catalog.path else {
        anyhow::bail!("No catalog given (use --catalog or [catalog].path)");
    };

    let catalog = Catalog::load_from_file(path, config.catalog.strict)
        .with_context(|| format!("Failed to load catalog {}", path.display()))?;
    if catalog.stats().resolved == 0 {
        anyhow::bail!("Catalog {} has no usable polygons", path.display());
    }

    let encoder = GridOffsetEncoder::new(config.shortcode.precision)?;
    let catalog = Arc::new(catalog);

    Ok(if config.catalog.index {
        Locator::with_index(catalog, Box::new(encoder))
    } else {
        Locator::new(catalog, Box::new(encoder))
    })
}

/// Application state shared across handlers
struct AppState {
    locator: Locator,
}

async fn serve(locator: Locator, listen: &str) -> Result<()> {
    let state = Arc::new(AppState { locator });

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/locate", get(locate_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", listen);

    let listener = tokio::net::TcpListener::bind(listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    indexed: bool,
    catalog: CatalogStats,
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let stats = state.locator.catalog().stats();
    Json(HealthResponse {
        status: if stats.resolved > 0 { "ok" } else { "degraded" },
        indexed: state.locator.is_indexed(),
        catalog: stats,
    })
}

#[derive(Deserialize)]
struct LocateQueryParams {
    /// Point latitude
    #[serde(rename = "point.lat")]
    point_lat: f64,
    /// Point longitude
    #[serde(rename = "point.lon")]
    point_lon: f64,
    /// `first` (default) or `all`
    mode: Option<ResolveMode>,
}

#[derive(Serialize)]
struct LocateResponse {
    features: Vec<LocationCode>,
    took_us: u128,
}

/// Point to location code(s)
async fn locate_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LocateQueryParams>,
) -> Result<Json<LocateResponse>, (StatusCode, String)> {
    let point = LatLng::new(params.point_lat, params.point_lon);
    if !(-90.0..=90.0).contains(&point.lat) || !(-180.0..=180.0).contains(&point.lng) {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("point ({}, {}) is out of range", point.lat, point.lng),
        ));
    }

    let start = Instant::now();
    let features = state
        .locator
        .locate(point, params.mode.unwrap_or_default());

    Ok(Json(LocateResponse {
        features,
        took_us: start.elapsed().as_micros(),
    }))
}
