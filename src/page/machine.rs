use std::sync::mpsc::Receiver;

use serde_json::Value;

use super::host::{Notice, PageHost};
use super::model::PageAgentState;
use super::resolver::{self, EffectiveDecision};
use crate::messaging::{BroadcastBus, Message, Response, StateReport, TabReceiver};
use crate::settings::{
    self, GlobalSettings, Mode, SiteSetting, GLOBAL_ENABLED_KEY, GLOBAL_MODE_KEY,
};
use crate::storage::{SharedStore, StoreChange, StoreResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct AgentOptions {
    pub max_site_overrides: Option<usize>,
}

/// Per-page owner of the live filter decision.
pub struct PageAgent<H> {
    state: PageAgentState,
    host: H,
    store: SharedStore,
    changes: Receiver<StoreChange>,
    bus: BroadcastBus,
    options: AgentOptions,
}

impl<H: PageHost> PageAgent<H> {
    /// Subscribes before reading so no change between the two is lost.
    pub fn load(host: H, store: SharedStore, bus: BroadcastBus, options: AgentOptions) -> Self {
        let changes = store.subscribe();
        let site_key = host.location().site_key();
        let mut state = PageAgentState::new(
            site_key.clone(),
            settings::read_global(&store),
            settings::read_site(&store, &site_key),
        );
        state.observe_version(store.version());
        tracing::debug!(site = %site_key, global = ?state.global, site_setting = ?state.site, "page agent loaded");

        let mut agent = Self {
            state,
            host,
            store,
            changes,
            bus,
            options,
        };
        agent.render();
        agent
    }

    pub fn state(&self) -> &PageAgentState {
        &self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn decision(&self) -> EffectiveDecision {
        resolver::decide(
            &self.state,
            &self.host.document(),
            self.host.prefers_dark(),
        )
    }

    pub fn report(&self) -> StateReport {
        let dark = self.host.prefers_dark();
        StateReport {
            global_enabled: self.state.global.enabled,
            global_mode: self.state.global.mode,
            site_override: self.state.site_override(),
            site_mode: self.state.site_mode(),
            current_mode: resolver::current_mode(&self.state),
            effectively_enabled: resolver::should_filter(&self.state, dark),
            is_system_dark: dark,
            is_pdf: resolver::is_applicable_document(&self.host.document()),
            site_key: self.state.site_key.clone(),
            version: self.state.applied_version,
        }
    }

    pub fn handle(&mut self, message: &Message) -> Response {
        tracing::debug!(site = %self.state.site_key, ?message, "page agent message");
        match message {
            Message::SetGlobalEnabled { enabled } => {
                self.set_global_enabled(*enabled);
                Response::ack(None)
            }
            Message::SetSiteOverride { enabled } => Response::ack(self.set_site_override(*enabled)),
            Message::ToggleSiteOverride => Response::ack(self.toggle_site_override()),
            Message::SetMode { mode } => Response::ack(self.set_mode(*mode)),
            Message::GetState => Response::State(self.report()),
            Message::StateChanged { .. } | Message::UpdateKeybind { .. } => Response::ack(None),
        }
    }

    pub fn set_global_enabled(&mut self, enabled: bool) {
        self.state.global.enabled = enabled;
        if !enabled {
            self.host.clear_style();
        }
        self.render();
        self.host.show_notice(if enabled {
            Notice::ExtensionOn
        } else {
            Notice::ExtensionOff
        });
    }

    /// Enabling snapshots the global mode as it is before the flag flips.
    pub fn set_site_override(&mut self, enabled: bool) -> Option<u64> {
        let setting = if enabled {
            SiteSetting::Overridden(self.state.global.mode)
        } else {
            SiteSetting::Inherited
        };
        self.state.site = setting;
        let version = self.persist_site(setting);
        self.render();
        self.host.show_notice(if enabled {
            Notice::SiteOverrideOn
        } else {
            Notice::SiteOverrideOff
        });
        version
    }

    pub fn toggle_site_override(&mut self) -> Option<u64> {
        self.set_site_override(!self.state.site_override())
    }

    /// Writes whichever mode is active: the site's when overridden, else the global one.
    pub fn set_mode(&mut self, mode: Mode) -> Option<u64> {
        let version = if self.state.site_override() {
            let setting = SiteSetting::Overridden(mode);
            self.state.site = setting;
            self.persist_site(setting)
        } else {
            self.state.global.mode = mode;
            let written = settings::write_global_mode(&self.store, mode);
            self.finish_write(GLOBAL_MODE_KEY, written)
        };
        self.render();
        self.host.show_notice(Notice::Mode(mode));
        version
    }

    pub fn on_theme_changed(&mut self) {
        if resolver::current_mode(&self.state) == Mode::System {
            self.render();
        }
    }

    pub fn apply_store_change(&mut self, change: &StoreChange) {
        let site_key = self.state.site_key.store_key();
        let before = (self.state.global, self.state.site);
        let new_value = change.new_value.as_ref();
        match change.key.as_str() {
            GLOBAL_ENABLED_KEY => {
                self.state.global.enabled = new_value == Some(&Value::Bool(true));
                self.render();
            }
            GLOBAL_MODE_KEY => {
                self.state.global.mode = Mode::from_stored(new_value);
                if !self.state.site_override() {
                    self.render();
                }
            }
            key if key == site_key => {
                self.state.site = SiteSetting::from_stored(new_value);
                self.render();
            }
            _ => {}
        }
        self.state.observe_version(change.version);
        tracing::debug!(key = %change.key, version = change.version, site = %self.state.site_key, "applied store change");

        // observers that queried before this settled need another look
        if (self.state.global, self.state.site) != before {
            self.bus.send(&Message::StateChanged {
                version: Some(change.version),
            });
        }
    }

    /// Drain queued store notifications in commit order.
    pub fn pump(&mut self) -> usize {
        let pending: Vec<StoreChange> = self.changes.try_iter().collect();
        for change in &pending {
            self.apply_store_change(change);
        }
        pending.len()
    }

    pub fn global(&self) -> GlobalSettings {
        self.state.global
    }

    fn render(&mut self) {
        let css = self.decision().style_text();
        tracing::debug!(site = %self.state.site_key, filtered = !css.is_empty(), "render");
        self.host.write_style(&css);
    }

    fn persist_site(&mut self, setting: SiteSetting) -> Option<u64> {
        let key = self.state.site_key.store_key();
        let written = settings::write_site(&self.store, &self.state.site_key, setting);
        let version = self.finish_write(&key, written);
        if let (SiteSetting::Overridden(_), Some(limit)) = (setting, self.options.max_site_overrides)
        {
            if let Err(err) = settings::evict_site_records(&self.store, &self.state.site_key, limit) {
                tracing::warn!(?err, "failed to evict old site override records");
            }
        }
        version
    }

    fn finish_write(&mut self, key: &str, written: StoreResult<u64>) -> Option<u64> {
        match written {
            Ok(version) => {
                self.state.observe_version(version);
                self.bus.send(&Message::StateChanged {
                    version: Some(version),
                });
                Some(version)
            }
            Err(err) => {
                tracing::warn!(key, ?err, "store write failed; continuing with local state");
                None
            }
        }
    }
}

impl<H: PageHost> TabReceiver for PageAgent<H> {
    fn receive(&mut self, message: &Message) -> Response {
        self.handle(message)
    }

    fn pump(&mut self) -> usize {
        PageAgent::pump(self)
    }

    fn theme_changed(&mut self) {
        self.on_theme_changed();
    }
}
