use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::messaging::{Message, Response, Transport};
use crate::settings;
use crate::storage::SharedStore;

/// Named platform command; the physical keys never reach the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Command {
    ToggleGlobal,
    ToggleSite,
}

impl Command {
    pub const ALL: [Self; 2] = [Self::ToggleSite, Self::ToggleGlobal];

    pub const fn name(self) -> &'static str {
        match self {
            Self::ToggleGlobal => "toggle-global",
            Self::ToggleSite => "toggle-site",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown command: {0}")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "toggle-global" => Ok(Self::ToggleGlobal),
            "toggle-site" => Ok(Self::ToggleSite),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}

/// Legacy keybinding record accepted from the popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keybind {
    pub keys: Vec<String>,
    pub code: String,
    pub key: String,
}

impl Keybind {
    fn meta_shift(letter: char) -> Self {
        let upper = letter.to_ascii_uppercase();
        Self {
            keys: vec!["Meta".to_string(), "Shift".to_string(), upper.to_string()],
            code: format!("Key{upper}"),
            key: letter.to_ascii_lowercase().to_string(),
        }
    }
}

/// In-memory only. Dispatch always goes through the platform command names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keybinds(BTreeMap<Command, Keybind>);

impl Default for Keybinds {
    fn default() -> Self {
        Self(BTreeMap::from([
            (Command::ToggleSite, Keybind::meta_shift('z')),
            (Command::ToggleGlobal, Keybind::meta_shift('x')),
        ]))
    }
}

impl Keybinds {
    pub fn get(&self, command: Command) -> Option<&Keybind> {
        self.0.get(&command)
    }

    pub fn update(&mut self, command: Command, keybind: Keybind) {
        self.0.insert(command, keybind);
    }
}

/// Background relay for command shortcuts.
#[derive(Debug, Clone)]
pub struct Coordinator {
    store: SharedStore,
    keybinds: Keybinds,
}

impl Coordinator {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            keybinds: Keybinds::default(),
        }
    }

    pub fn keybinds(&self) -> &Keybinds {
        &self.keybinds
    }

    pub fn on_command_name(&mut self, name: &str, transport: &dyn Transport) -> Option<u64> {
        match name.parse::<Command>() {
            Ok(command) => self.on_command(command, transport),
            Err(err) => {
                tracing::debug!(%err, "ignoring command");
                None
            }
        }
    }

    /// Returns the store version the broadcast hint carried, if one was sent.
    pub fn on_command(&mut self, command: Command, transport: &dyn Transport) -> Option<u64> {
        let Some(tab) = transport.active_tab() else {
            tracing::debug!(%command, "no active tab; command dropped");
            return None;
        };
        tracing::debug!(%command, ?tab, "command received");

        match command {
            Command::ToggleGlobal => {
                let enabled = !settings::read_global(&self.store).enabled;
                let version = match settings::write_global_enabled(&self.store, enabled) {
                    Ok(version) => version,
                    Err(err) => {
                        tracing::warn!(?err, "failed to persist global toggle");
                        self.store.version()
                    }
                };
                if let Err(err) = transport.send_to_tab(tab, &Message::SetGlobalEnabled { enabled })
                {
                    tracing::debug!(%err, "global toggle not delivered to page");
                }
                transport.broadcast(&Message::StateChanged {
                    version: Some(version),
                });
                Some(version)
            }
            Command::ToggleSite => match transport.send_to_tab(tab, &Message::ToggleSiteOverride) {
                Ok(Response::Ack { version }) => {
                    // the page already committed its write, so the hint cannot race it
                    let version = version.unwrap_or_else(|| self.store.version());
                    transport.broadcast(&Message::StateChanged {
                        version: Some(version),
                    });
                    Some(version)
                }
                Ok(Response::State(_)) => None,
                Err(err) => {
                    tracing::debug!(%err, "site toggle not delivered to page");
                    None
                }
            },
        }
    }

    /// Messages addressed to the coordinator itself.
    pub fn handle_message(&mut self, message: &Message) -> Option<Response> {
        match message {
            Message::UpdateKeybind { command, keybind } => {
                self.keybinds.update(*command, keybind.clone());
                Some(Response::ack(None))
            }
            _ => None,
        }
    }
}
