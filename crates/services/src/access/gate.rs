//! Per-spot read gate.
//!
//! Checks run in a fixed order: creator, then admin in the authoring
//! tool, then discovery. Role alone never grants access; an admin on the
//! consumer app is treated like any other player.

use domains::models::{AccountContext, Spot};

/// Why a spot read was allowed, or that it was not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpotAccess {
    Creator,
    AdminTool,
    Discovered,
    Denied,
}

impl SpotAccess {
    pub fn is_granted(self) -> bool {
        !matches!(self, Self::Denied)
    }
}

/// How a gated read should answer when access is denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateMode {
    /// Fall back to a [`SpotPreview`](domains::models::SpotPreview)
    #[default]
    Preview,
    /// Fail with `DISCOVERY_REQUIRED`
    Strict,
}

/// The checks that need no discovery lookup. `None` means the caller must
/// consult discovery state.
pub fn bypass_access(context: &AccountContext, spot: &Spot) -> Option<SpotAccess> {
    if context.account_id.as_deref() == Some(spot.created_by.as_str()) {
        Some(SpotAccess::Creator)
    } else if context.is_admin_on_creator_client() {
        Some(SpotAccess::AdminTool)
    } else {
        None
    }
}

/// Full gate decision once discovery state is known.
pub fn spot_access(context: &AccountContext, spot: &Spot, discovered: bool) -> SpotAccess {
    match bypass_access(context, spot) {
        Some(access) => access,
        None if discovered => SpotAccess::Discovered,
        None => SpotAccess::Denied,
    }
}
