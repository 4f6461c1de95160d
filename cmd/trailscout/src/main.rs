//! # trailscout
//!
//! Wires the discovery engine over in-memory stores, seeds trails and
//! spots, and replays a recorded walk. Every location record, the final
//! trail view and the resulting discovery state are written to stdout
//! as JSON lines; logs go to stderr.
//!
//! Usage: `trailscout [scenario.json]`. Without an argument the scenario
//! path comes from `simulation.scenario_path`.

mod scenario;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use configs::{LogFormat, LogSettings, Settings};
use domains::models::{Discovery, DiscoveryProfile, Spot, Trail};
use services::{
    DiscoveryApplication, DiscoverySettings, DiscoveryStateComposite, SpotAccessComposite,
    StoreSpotCatalog, StoreTrailCatalog,
};
use storage_adapters::{MemoryStore, SeedData};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::scenario::{Engine, Scenario};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    init_tracing(&settings.log)?;
    if let Some(path) = &settings.env_file {
        debug!(path = %path.display(), "loaded .env");
    }

    let scenario_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| settings.simulation.scenario_path.clone());
    let Some(scenario_path) = scenario_path else {
        bail!("no scenario given: pass a path or set simulation.scenario_path");
    };

    let engine = build_engine(&settings).await?;
    let scenario = Scenario::from_file(&scenario_path).await?;
    info!(
        path = %scenario_path.display(),
        fixes = scenario.track.len(),
        "replaying scenario"
    );

    let mut out = std::io::stdout().lock();
    scenario.replay(&engine, &mut out).await?;
    Ok(())
}

/// `RUST_LOG` wins over `log.level` when set.
fn init_tracing(log: &LogSettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&log.level))
        .with_context(|| format!("invalid log level {:?}", log.level))?;
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match log.format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.init(),
    }
    Ok(())
}

async fn build_engine(settings: &Settings) -> anyhow::Result<Engine> {
    let trail_store = Arc::new(MemoryStore::<Trail>::new());
    let spot_store = Arc::new(MemoryStore::<Spot>::new());

    match &settings.seed.path {
        Some(path) => {
            let seed = SeedData::from_file(path).await?;
            seed.apply(trail_store.as_ref(), spot_store.as_ref())
                .await
                .context("writing seed data")?;
        }
        None => info!("no seed file configured, starting with empty catalogs"),
    }

    let trails = Arc::new(StoreTrailCatalog::new(trail_store));
    let spots = Arc::new(StoreSpotCatalog::new(spot_store));
    let discovery = Arc::new(DiscoveryApplication::new(
        Arc::new(MemoryStore::<Discovery>::new()),
        Arc::new(MemoryStore::<DiscoveryProfile>::new()),
        trails.clone(),
        spots.clone(),
        DiscoverySettings {
            default_map_radius_m: settings.discovery.default_map_radius_m,
        },
    ));

    Ok(Engine {
        state: DiscoveryStateComposite::new(discovery.clone(), trails.clone()),
        spots: SpotAccessComposite::new(discovery.clone(), spots, trails),
        discovery,
    })
}
