use std::collections::HashSet;
use std::sync::Arc;

use domains::error::{AppError, Result};
use domains::models::{AccountContext, Spot, SpotView};
use domains::ports::{SpotCatalog, TrailCatalog};
use tracing::{debug, instrument};

use super::gate::{self, GateMode, SpotAccess};
use crate::discovery::DiscoveryApplication;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessibleSpotsOptions {
    /// Cap on the number of spots returned
    pub limit: Option<usize>,
}

/// Filters the spot catalog down to what an account may see, by
/// consulting discovery state. Depends only on the public contracts of
/// the discovery application and the spot catalog.
pub struct SpotAccessComposite {
    discovery: Arc<DiscoveryApplication>,
    spots: Arc<dyn SpotCatalog>,
    trails: Arc<dyn TrailCatalog>,
}

impl SpotAccessComposite {
    pub fn new(
        discovery: Arc<DiscoveryApplication>,
        spots: Arc<dyn SpotCatalog>,
        trails: Arc<dyn TrailCatalog>,
    ) -> Self {
        Self {
            discovery,
            spots,
            trails,
        }
    }

    /// Full records of the spots the account has discovered.
    /// Without discoveries the spot catalog is never queried.
    #[instrument(skip(self, context), fields(account_id = ?context.account_id))]
    pub async fn get_accessible_spots(
        &self,
        context: &AccountContext,
        trail_id: Option<&str>,
        options: AccessibleSpotsOptions,
    ) -> Result<Vec<Spot>> {
        let mut spot_ids = self
            .discovery
            .get_discovered_spot_ids(context, trail_id)
            .await?;
        if spot_ids.is_empty() {
            debug!("no discoveries, nothing accessible");
            return Ok(Vec::new());
        }
        if let Some(limit) = options.limit {
            spot_ids.truncate(limit);
        }
        self.spots.get_spots_by_ids(&spot_ids).await
    }

    /// Single spot through the read gate. The discovery lookup only runs
    /// when neither the creator nor the admin-tool bypass applies.
    #[instrument(skip(self, context), fields(account_id = ?context.account_id))]
    pub async fn get_spot(
        &self,
        context: &AccountContext,
        spot_id: &str,
        mode: GateMode,
    ) -> Result<SpotView> {
        let spot = self
            .spots
            .get_spot(spot_id)
            .await?
            .ok_or_else(|| AppError::not_found("spot", spot_id))?;

        let access = match gate::bypass_access(context, &spot) {
            Some(access) => access,
            None => {
                let discovered = self.discovery.is_spot_discovered(context, spot_id).await?;
                gate::spot_access(context, &spot, discovered)
            }
        };
        debug!(?access, "spot access resolved");

        match (access, mode) {
            (SpotAccess::Denied, GateMode::Preview) => Ok(SpotView::Preview(spot.preview())),
            (SpotAccess::Denied, GateMode::Strict) => {
                Err(AppError::DiscoveryRequired(spot_id.to_string()))
            }
            _ => Ok(SpotView::Full(spot)),
        }
    }

    /// Every spot of a trail, in trail order, each full or preview.
    #[instrument(skip(self, context), fields(account_id = ?context.account_id))]
    pub async fn get_trail_spots(
        &self,
        context: &AccountContext,
        trail_id: &str,
    ) -> Result<Vec<SpotView>> {
        let trail = self
            .trails
            .get_trail(trail_id)
            .await?
            .ok_or_else(|| AppError::not_found("trail", trail_id))?;
        let spots = self.spots.get_spots_for_trail(trail_id).await?;

        let needs_lookup = spots
            .iter()
            .any(|spot| gate::bypass_access(context, spot).is_none());
        let discovered: HashSet<String> = if needs_lookup {
            self.discovery
                .get_discovered_spot_ids(context, None)
                .await?
                .into_iter()
                .collect()
        } else {
            HashSet::new()
        };

        Ok(trail
            .spot_ids
            .iter()
            .filter_map(|id| spots.iter().find(|spot| &spot.id == id))
            .map(|spot| {
                let access = gate::spot_access(context, spot, discovered.contains(&spot.id));
                if access.is_granted() {
                    SpotView::Full(spot.clone())
                } else {
                    SpotView::Preview(spot.preview())
                }
            })
            .collect())
    }
}
