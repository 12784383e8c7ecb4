//! # resort-routes CLI
//!
//! Command-line driver for the resort-routes pipeline: routes one home
//! against a resort list and writes the route store, travel-time table and
//! corridor graph.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::error;
use resort_routes::{
    load_homes, load_resorts, parse_origin, run_pipeline, select_home, AcquireOptions,
    CorridorConfig, Error, Home, PipelineConfig, Result,
};

mod cli;

/// Command-line interface for resort-routes
#[derive(Parser)]
#[command(name = "resort-routes")]
#[command(about = "Precompute home-to-resort driving routes, travel times and shared corridors")]
#[command(long_about = "Routes one home against a resort list and writes three files:
  routes_<home>.geojson        every successfully routed resort
  travel_times_<home>.json     per-resort {hours, km} lookup table
  corridors_<home>.geojson     road corridors shared by many routes

Typical runs:
  resort-routes --homes homes.json --home-id muc --resorts resorts.json
  resort-routes --origin 48.137,11.575 --resorts resorts.json --out data
  resort-routes --homes homes.json --list-homes

An existing route store is reused; pass --force to refetch.")]
#[command(version)]
struct Cli {
    /// Homes file: JSON object mapping home id to {name, lat, lon}
    #[arg(long)]
    homes: Option<PathBuf>,

    /// Which home from the homes file to route from
    #[arg(long = "home-id")]
    home_id: Option<String>,

    /// Resorts file: JSON array of {id|slug, name, lat, lon}
    #[arg(long)]
    resorts: Option<PathBuf>,

    /// Ad-hoc origin "lat,lon"; overrides --homes/--home-id
    #[arg(long)]
    origin: Option<String>,

    /// Base URL of the OSRM-compatible routing engine
    #[arg(long = "routing-base", default_value = "http://localhost:5000")]
    routing_base: String,

    /// Output directory for the generated files
    #[arg(long, default_value = "data")]
    out: PathBuf,

    /// Maximum number of in-flight route requests
    #[arg(long, default_value_t = 6)]
    concurrency: usize,

    /// Resample step along each route, meters
    #[arg(long, default_value_t = 500.0)]
    step: f64,

    /// Corridor grid resolution, meters
    #[arg(long, default_value_t = 800.0)]
    grid: f64,

    /// Minimum number of contributing routes for a corridor edge
    #[arg(long = "min-count", default_value_t = 3)]
    min_count: u32,

    /// Refetch routes even when the store file already exists
    #[arg(short, long)]
    force: bool,

    /// Print the available home ids and exit
    #[arg(long = "list-homes")]
    list_homes: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("❌ Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging to stderr
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stderr);
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    } else if std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(log::LevelFilter::Info);
    }
    builder.init();

    if cli.list_homes {
        let homes_path = cli.homes.as_deref().ok_or_else(|| {
            Error::InvalidInput("--list-homes requires --homes <path>".to_string())
        })?;
        for (id, spec) in load_homes(homes_path)? {
            println!("{id}\t{}", spec.name);
        }
        return Ok(());
    }

    let home = resolve_home(&cli)?;
    let resorts_path = cli.resorts.clone().ok_or_else(|| {
        Error::InvalidInput("--resorts <path> is required".to_string())
    })?;

    // Size the progress bar once the resort count is known
    let resort_count = load_resorts(&resorts_path)?.len() as u64;
    let manager = cli::ProgressManager::new(
        resort_count,
        &format!("🏔  Routing {} resorts from '{}'", resort_count, home.name),
    );
    let pb = manager.pb.clone();

    let config = PipelineConfig {
        home,
        resorts_path,
        routing_base: cli.routing_base.clone(),
        out_dir: cli.out.clone(),
        force: cli.force,
        acquire: AcquireOptions {
            concurrency: cli.concurrency,
            api_key: std::env::var("ROUTING_API_KEY").ok(),
            progress: Some(Arc::new(move |done, total| {
                if pb.length().unwrap_or(0) != total {
                    pb.set_length(total);
                }
                pb.set_position(done);
            })),
        },
        corridor: CorridorConfig {
            step_m: cli.step,
            grid_m: cli.grid,
            min_count: cli.min_count,
        },
    };

    let report = run_pipeline(config).await?;
    manager.pb.finish_and_clear();

    if report.reused_store {
        eprintln!(
            "✅ Reused route store for '{}': {} routes, {} corridor edges → {}",
            report.home_id,
            report.succeeded,
            report.corridor_edges,
            cli.out.display()
        );
    } else {
        eprintln!(
            "✅ Home '{}': {} routed, {} skipped, {} corridor edges → {}",
            report.home_id,
            report.succeeded,
            report.failed,
            report.corridor_edges,
            cli.out.display()
        );
    }

    Ok(())
}

/// Resolve the origin: an ad-hoc --origin wins over the homes file
fn resolve_home(cli: &Cli) -> Result<Home> {
    if let Some(origin) = &cli.origin {
        return parse_origin(origin);
    }

    let homes_path = cli.homes.as_deref().ok_or_else(|| {
        Error::InvalidInput("either --origin or --homes with --home-id is required".to_string())
    })?;
    let home_id = cli.home_id.as_deref().ok_or_else(|| {
        Error::InvalidInput("--home-id is required with --homes (or use --list-homes)".to_string())
    })?;

    let homes = load_homes(homes_path)?;
    select_home(&homes, home_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["resort-routes", "--resorts", "resorts.json"]);
        assert_eq!(cli.concurrency, 6);
        assert_eq!(cli.step, 500.0);
        assert_eq!(cli.grid, 800.0);
        assert_eq!(cli.min_count, 3);
        assert!(!cli.force);
        assert!(!cli.list_homes);
    }

    #[test]
    fn test_resolve_home_from_origin() {
        let cli = parse(&[
            "resort-routes",
            "--origin",
            "48.137,11.575",
            "--resorts",
            "r.json",
        ]);
        let home = resolve_home(&cli).unwrap();
        assert_eq!(home.id, "origin");
        assert_eq!(home.lat, 48.137);
    }

    #[test]
    fn test_resolve_home_requires_some_origin() {
        let cli = parse(&["resort-routes", "--resorts", "r.json"]);
        assert!(resolve_home(&cli).is_err());
    }

    #[test]
    fn test_home_id_required_with_homes() {
        let cli = parse(&["resort-routes", "--homes", "h.json", "--resorts", "r.json"]);
        match resolve_home(&cli) {
            Err(Error::InvalidInput(msg)) => assert!(msg.contains("--home-id")),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }
}
