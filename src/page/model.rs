use serde::Serialize;

use crate::settings::{GlobalSettings, Mode, SiteKey, SiteSetting};

/// In-memory mirror of the persisted inputs for one page load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAgentState {
    pub site_key: SiteKey,
    pub global: GlobalSettings,
    pub site: SiteSetting,
    /// Highest store version this mirror reflects.
    pub applied_version: u64,
}

impl PageAgentState {
    pub fn new(site_key: SiteKey, global: GlobalSettings, site: SiteSetting) -> Self {
        Self {
            site_key,
            global,
            site,
            applied_version: 0,
        }
    }

    pub fn site_override(&self) -> bool {
        self.site.is_overridden()
    }

    pub fn site_mode(&self) -> Mode {
        self.site.mode().unwrap_or_default()
    }

    pub(crate) fn observe_version(&mut self, version: u64) {
        self.applied_version = self.applied_version.max(version);
    }
}
