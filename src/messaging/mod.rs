mod hub;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coordinator::{Command, Keybind};
use crate::settings::{Mode, SiteKey};

pub use hub::Hub;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TabId(pub u32);

/// Cross-context message, selected by its `action` field on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Message {
    SetGlobalEnabled {
        enabled: bool,
    },
    SetSiteOverride {
        enabled: bool,
    },
    ToggleSiteOverride,
    SetMode {
        mode: Mode,
    },
    GetState,
    /// "Re-query me". The version lets receivers skip hints they already reflect.
    StateChanged {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version: Option<u64>,
    },
    UpdateKeybind {
        command: Command,
        keybind: Keybind,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateReport {
    pub global_enabled: bool,
    pub global_mode: Mode,
    pub site_override: bool,
    pub site_mode: Mode,
    pub current_mode: Mode,
    pub effectively_enabled: bool,
    pub is_system_dark: bool,
    #[serde(rename = "isPDF")]
    pub is_pdf: bool,
    pub site_key: SiteKey,
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    State(StateReport),
    Ack {
        #[serde(default)]
        version: Option<u64>,
    },
}

impl Response {
    pub const fn ack(version: Option<u64>) -> Self {
        Self::Ack { version }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("no active tab")]
    NoActiveTab,
    #[error("no receiver in tab {0:?}")]
    NoReceiver(TabId),
    #[error("tab {0:?} did not answer in time")]
    Timeout(TabId),
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Point-to-point and broadcast delivery between contexts.
pub trait Transport {
    fn active_tab(&self) -> Option<TabId>;
    fn send_to_tab(&self, tab: TabId, message: &Message) -> TransportResult<Response>;
    fn broadcast(&self, message: &Message);

    fn send_to_active(&self, message: &Message) -> TransportResult<Response> {
        let tab = self.active_tab().ok_or(TransportError::NoActiveTab)?;
        self.send_to_tab(tab, message)
    }
}

/// A page-side context that can be addressed by tab.
pub trait TabReceiver {
    fn receive(&mut self, message: &Message) -> Response;
    fn pump(&mut self) -> usize;
    fn theme_changed(&mut self);
}

/// Fan-out of broadcast hints to every subscribed popup.
#[derive(Debug, Clone, Default)]
pub struct BroadcastBus {
    subscribers: Rc<RefCell<Vec<Sender<Message>>>>,
}

impl BroadcastBus {
    pub fn subscribe(&self) -> Receiver<Message> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.borrow_mut().push(tx);
        rx
    }

    pub fn send(&self, message: &Message) {
        self.subscribers
            .borrow_mut()
            .retain(|subscriber| subscriber.send(message.clone()).is_ok());
    }
}
