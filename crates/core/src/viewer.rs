//! Capabilities of the viewer issuing a request.

use serde::{Deserialize, Serialize};

/// The capability triple the host resolves for each request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    /// The request carries a recognized identity.
    pub authenticated: bool,
    /// The viewer may edit content (previews, post-type listing, events).
    pub can_edit: bool,
    /// The viewer may manage the site (manual cache flush).
    pub can_manage: bool,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn editor() -> Self {
        Self { authenticated: true, can_edit: true, can_manage: false }
    }

    pub fn administrator() -> Self {
        Self { authenticated: true, can_edit: true, can_manage: true }
    }

    /// Authenticated and holding edit capability.
    pub fn is_privileged(&self) -> bool {
        self.authenticated && self.can_edit
    }
}
