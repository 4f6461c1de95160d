use std::sync::Arc;

use domains::error::{AppError, Result};
use domains::models::{AccountContext, DiscoveryProfilePatch, DiscoveryState, DiscoveryTrail};
use domains::ports::TrailCatalog;
use tracing::{info, instrument, warn};

use crate::discovery::DiscoveryApplication;

/// One-read aggregate of profile, discoveries, discovered spots and the
/// active trail.
pub struct DiscoveryStateComposite {
    discovery: Arc<DiscoveryApplication>,
    trails: Arc<dyn TrailCatalog>,
}

impl DiscoveryStateComposite {
    pub fn new(discovery: Arc<DiscoveryApplication>, trails: Arc<dyn TrailCatalog>) -> Self {
        Self { discovery, trails }
    }

    /// Profile, discoveries and spots are fetched concurrently; the active
    /// trail view depends on the profile and is fetched afterwards.
    #[instrument(skip(self, context), fields(account_id = ?context.account_id))]
    pub async fn get_discovery_state(&self, context: &AccountContext) -> Result<DiscoveryState> {
        context.require_account_id()?;

        let (profile, discoveries, spots) = tokio::try_join!(
            self.discovery.get_discovery_profile(context),
            self.discovery.get_discoveries(context, None),
            self.discovery.get_discovered_spots(context, None),
        )?;

        let trail = match profile.last_active_trail_id.as_deref() {
            Some(trail_id) => self.active_trail(context, trail_id).await?,
            None => None,
        };

        Ok(DiscoveryState {
            profile,
            discoveries,
            spots,
            trail,
        })
    }

    /// Marks a trail as active and returns the resulting state, saving the
    /// caller a second round trip.
    #[instrument(skip(self, context), fields(account_id = ?context.account_id))]
    pub async fn activate_trail(
        &self,
        context: &AccountContext,
        trail_id: &str,
    ) -> Result<DiscoveryState> {
        context.require_account_id()?;
        if self.trails.get_trail(trail_id).await?.is_none() {
            return Err(AppError::not_found("trail", trail_id));
        }

        let profile = self
            .discovery
            .update_discovery_profile(context, DiscoveryProfilePatch::activate(trail_id))
            .await?;
        info!(trail_id, "trail activated");

        let (discoveries, spots, trail) = tokio::try_join!(
            self.discovery.get_discoveries(context, None),
            self.discovery.get_discovered_spots(context, None),
            self.discovery.get_discovery_trail(context, trail_id, None),
        )?;

        Ok(DiscoveryState {
            profile,
            discoveries,
            spots,
            trail: Some(trail),
        })
    }

    /// A profile may point at a trail that has since been removed; that
    /// reads as "no active trail" rather than failing the whole state.
    async fn active_trail(
        &self,
        context: &AccountContext,
        trail_id: &str,
    ) -> Result<Option<DiscoveryTrail>> {
        match self.discovery.get_discovery_trail(context, trail_id, None).await {
            Ok(trail) => Ok(Some(trail)),
            Err(AppError::NotFound { .. }) => {
                warn!(trail_id, "active trail no longer exists");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
