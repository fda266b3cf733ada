use std::sync::mpsc::Receiver;

use serde::Serialize;

use crate::coordinator::Command;
use crate::input::{parse_shortcut, ShortcutLabel};
use crate::messaging::{BroadcastBus, Message, Response, StateReport, TabId, Transport};
use crate::settings::{self, Mode, SiteKey, GLOBAL_ENABLED_KEY, GLOBAL_MODE_KEY};
use crate::storage::{SharedStore, StoreChange};
use crate::theme::{popup_palette, PopupPalette, ThemeSource};

/// What the popup currently believes about the active tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupSnapshot {
    pub global_enabled: bool,
    pub global_mode: Mode,
    pub site_override: bool,
    pub current_mode: Mode,
    pub effectively_enabled: bool,
    pub is_pdf: bool,
    /// `None` when the active tab has no page agent.
    pub site_key: Option<SiteKey>,
}

impl PopupSnapshot {
    pub fn page_reachable(&self) -> bool {
        self.site_key.is_some()
    }

    fn from_store(store: &SharedStore) -> Self {
        let global = settings::read_global(store);
        Self {
            global_enabled: global.enabled,
            global_mode: global.mode,
            site_override: false,
            current_mode: global.mode,
            effectively_enabled: false,
            is_pdf: false,
            site_key: None,
        }
    }

    fn from_report(report: StateReport) -> Self {
        Self {
            global_enabled: report.global_enabled,
            global_mode: report.global_mode,
            site_override: report.site_override,
            current_mode: report.current_mode,
            effectively_enabled: report.effectively_enabled,
            is_pdf: report.is_pdf,
            site_key: Some(report.site_key),
        }
    }
}

/// Rendered control state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupView {
    pub dot_on: bool,
    pub status: &'static str,
    pub global_checked: bool,
    pub site_checked: bool,
    pub highlighted_mode: Mode,
    pub site_row_visible: bool,
    pub palette: PopupPalette,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortcutRow {
    pub command: Command,
    pub label: ShortcutLabel,
}

/// Shortcut rows for the advanced screen, from the platform's command bindings.
pub fn shortcut_rows<'a>(
    bindings: impl IntoIterator<Item = (Command, Option<&'a str>)>,
) -> Vec<ShortcutRow> {
    let bindings: Vec<(Command, Option<&str>)> = bindings.into_iter().collect();
    Command::ALL
        .iter()
        .map(|command| {
            let shortcut = bindings
                .iter()
                .find(|(bound, _)| bound == command)
                .and_then(|(_, shortcut)| *shortcut);
            ShortcutRow {
                command: *command,
                label: parse_shortcut(shortcut),
            }
        })
        .collect()
}

/// Transient observer. Holds no authority; it re-derives its view on open.
pub struct Popup<T> {
    store: SharedStore,
    theme: T,
    tab: Option<TabId>,
    snapshot: PopupSnapshot,
    seen_version: u64,
    /// Highest version the popup wrote itself and handed straight to the page.
    own_write_version: u64,
    hints: Receiver<Message>,
    changes: Receiver<StoreChange>,
}

impl<T: ThemeSource> Popup<T> {
    pub fn open(
        store: SharedStore,
        bus: &BroadcastBus,
        theme: T,
        transport: &dyn Transport,
    ) -> Self {
        let hints = bus.subscribe();
        let changes = store.subscribe();
        let mut popup = Self {
            snapshot: PopupSnapshot::from_store(&store),
            store,
            theme,
            tab: transport.active_tab(),
            seen_version: 0,
            own_write_version: 0,
            hints,
            changes,
        };
        popup.refresh(transport);
        popup
    }

    pub fn snapshot(&self) -> &PopupSnapshot {
        &self.snapshot
    }

    pub fn seen_version(&self) -> u64 {
        self.seen_version
    }

    /// Store read first, then the page's answer overwrites it in full.
    ///
    /// A page answer sets `seen_version` to what the page reflects, which may
    /// trail the store; the page's hint after it settles triggers the next look.
    pub fn refresh(&mut self, transport: &dyn Transport) {
        self.snapshot = PopupSnapshot::from_store(&self.store);

        let Some(tab) = self.tab else {
            self.seen_version = self.store.version();
            return;
        };
        match transport.send_to_tab(tab, &Message::GetState) {
            Ok(Response::State(report)) => {
                self.seen_version = report.version.max(self.own_write_version);
                self.snapshot = PopupSnapshot::from_report(report);
            }
            Ok(Response::Ack { .. }) => {
                tracing::debug!(?tab, "page answered getState without a report");
                self.seen_version = self.store.version();
            }
            Err(err) => {
                tracing::debug!(%err, "page query failed; keeping store snapshot");
                self.seen_version = self.store.version();
            }
        }
    }

    pub fn toggle_global(&mut self, transport: &dyn Transport) {
        let enabled = !self.snapshot.global_enabled;
        self.snapshot.global_enabled = enabled;
        match settings::write_global_enabled(&self.store, enabled) {
            Ok(version) => self.own_write_version = version,
            Err(err) => tracing::warn!(?err, "failed to persist global toggle"),
        }
        self.send(transport, &Message::SetGlobalEnabled { enabled });
        self.refresh(transport);
    }

    /// No-op unless the active tab is a reachable PDF page.
    pub fn toggle_site(&mut self, transport: &dyn Transport) -> bool {
        if !self.snapshot.page_reachable() || !self.snapshot.is_pdf {
            return false;
        }
        let enabled = !self.snapshot.site_override;
        self.snapshot.site_override = enabled;
        // the page owns the site record write
        self.send(transport, &Message::SetSiteOverride { enabled });
        self.refresh(transport);
        true
    }

    pub fn select_mode(&mut self, mode: Mode, transport: &dyn Transport) {
        self.snapshot.current_mode = mode;
        if !self.snapshot.site_override {
            self.snapshot.global_mode = mode;
            match settings::write_global_mode(&self.store, mode) {
                Ok(version) => self.own_write_version = version,
                Err(err) => tracing::warn!(?err, "failed to persist global mode"),
            }
        }
        self.send(transport, &Message::SetMode { mode });
        self.refresh(transport);
    }

    /// Drain hints and store changes; re-query only for versions not yet seen.
    pub fn pump(&mut self, transport: &dyn Transport) -> bool {
        let mut newest: Option<u64> = None;
        let mut unversioned = false;

        for hint in self.hints.try_iter() {
            match hint {
                Message::StateChanged {
                    version: Some(version),
                } => newest = newest.max(Some(version)),
                Message::StateChanged { version: None } => unversioned = true,
                _ => {}
            }
        }
        let site_key = self.snapshot.site_key.as_ref().map(SiteKey::store_key);
        for change in self.changes.try_iter() {
            let relevant = change.key == GLOBAL_ENABLED_KEY
                || change.key == GLOBAL_MODE_KEY
                || site_key.as_deref() == Some(change.key.as_str());
            if relevant {
                newest = newest.max(Some(change.version));
            }
        }

        let stale = newest.map_or(true, |version| version <= self.seen_version);
        if stale && !unversioned {
            return false;
        }
        tracing::debug!(?newest, seen = self.seen_version, "popup reconciling");
        self.refresh(transport);
        true
    }

    pub fn view(&self) -> PopupView {
        let snapshot = &self.snapshot;
        PopupView {
            dot_on: snapshot.effectively_enabled,
            status: if snapshot.effectively_enabled {
                "Active"
            } else {
                "No Filter"
            },
            global_checked: snapshot.global_enabled,
            site_checked: snapshot.site_override,
            highlighted_mode: snapshot.current_mode,
            site_row_visible: snapshot.is_pdf,
            palette: self.palette(),
        }
    }

    pub fn palette(&self) -> PopupPalette {
        popup_palette(self.snapshot.global_enabled, self.theme.prefers_dark())
    }

    fn send(&self, transport: &dyn Transport, message: &Message) {
        let Some(tab) = self.tab else {
            return;
        };
        if let Err(err) = transport.send_to_tab(tab, message) {
            tracing::debug!(%err, "popup message not delivered");
        }
    }
}
