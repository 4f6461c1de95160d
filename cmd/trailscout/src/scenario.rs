use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use domains::geo::{GeoLocation, LocationWithDirection};
use domains::models::{AccountContext, DiscoveryLocationRecord, DiscoveryState, SpotView};
use serde::{Deserialize, Serialize};
use services::{DiscoveryApplication, DiscoveryStateComposite, SpotAccessComposite};
use tracing::info;

pub struct Engine {
    pub discovery: Arc<DiscoveryApplication>,
    pub state: DiscoveryStateComposite,
    pub spots: SpotAccessComposite,
}

/// A recorded walk of one account along one trail.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub account: AccountContext,
    pub trail_id: String,
    pub track: Vec<GeoLocation>,
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
enum ReplayLine<'a> {
    Location { record: &'a DiscoveryLocationRecord },
    TrailSpots { spots: &'a [SpotView] },
    State { state: &'a DiscoveryState },
}

impl Scenario {
    pub async fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading scenario {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing scenario {}", path.display()))
    }

    pub async fn replay(&self, engine: &Engine, out: &mut impl Write) -> anyhow::Result<()> {
        engine.state.activate_trail(&self.account, &self.trail_id).await?;

        let mut previous: Option<GeoLocation> = None;
        for &fix in &self.track {
            let location = match previous {
                Some(from) => LocationWithDirection::between(from, fix),
                None => LocationWithDirection::at(fix),
            };
            let record = engine
                .discovery
                .process_location(&self.account, &location, &self.trail_id)
                .await?;
            for discovery in &record.discoveries {
                info!(spot_id = %discovery.spot_id, "spot discovered");
            }
            emit(out, &ReplayLine::Location { record: &record })?;
            previous = Some(fix);
        }

        let views = engine.spots.get_trail_spots(&self.account, &self.trail_id).await?;
        emit(out, &ReplayLine::TrailSpots { spots: &views })?;

        let state = engine.state.get_discovery_state(&self.account).await?;
        emit(out, &ReplayLine::State { state: &state })?;
        Ok(())
    }
}

fn emit(out: &mut impl Write, line: &ReplayLine<'_>) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *out, line)?;
    writeln!(out)?;
    Ok(())
}
