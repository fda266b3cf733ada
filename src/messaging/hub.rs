use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use super::{
    BroadcastBus, Message, Response, TabId, TabReceiver, Transport, TransportError,
    TransportResult,
};

/// In-process transport that routes messages to registered page contexts.
#[derive(Default)]
pub struct Hub {
    pages: RefCell<BTreeMap<TabId, Rc<RefCell<dyn TabReceiver>>>>,
    active: Cell<Option<TabId>>,
    bus: BroadcastBus,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bus(&self) -> BroadcastBus {
        self.bus.clone()
    }

    pub fn register(&self, tab: TabId, receiver: Rc<RefCell<dyn TabReceiver>>) {
        self.pages.borrow_mut().insert(tab, receiver);
        tracing::debug!(?tab, "registered page context");
    }

    /// The page unloaded; later messages to the tab find no receiver.
    pub fn unregister(&self, tab: TabId) {
        self.pages.borrow_mut().remove(&tab);
    }

    pub fn activate(&self, tab: Option<TabId>) {
        self.active.set(tab);
    }

    /// Let every page drain its pending store notifications.
    pub fn pump_pages(&self) -> usize {
        self.receivers()
            .iter()
            .filter_map(|receiver| receiver.try_borrow_mut().ok().map(|mut page| page.pump()))
            .sum()
    }

    pub fn system_theme_changed(&self) {
        for receiver in self.receivers() {
            if let Ok(mut page) = receiver.try_borrow_mut() {
                page.theme_changed();
            }
        }
    }

    fn receivers(&self) -> Vec<Rc<RefCell<dyn TabReceiver>>> {
        self.pages.borrow().values().cloned().collect()
    }
}

impl Transport for Hub {
    fn active_tab(&self) -> Option<TabId> {
        self.active.get()
    }

    fn send_to_tab(&self, tab: TabId, message: &Message) -> TransportResult<Response> {
        let receiver = self
            .pages
            .borrow()
            .get(&tab)
            .cloned()
            .ok_or(TransportError::NoReceiver(tab))?;
        // A context that is still inside a handler cannot answer this request.
        let mut page = receiver
            .try_borrow_mut()
            .map_err(|_| TransportError::Timeout(tab))?;
        Ok(page.receive(message))
    }

    fn broadcast(&self, message: &Message) {
        self.bus.send(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{AgentOptions, PageAgent};
    use crate::settings::write_global_enabled;
    use crate::storage::SharedStore;
    use crate::testing::{pdf_page, FakePage, INVERT_RULE};
    use crate::theme::ColorScheme;

    #[test]
    fn send_to_missing_tab_is_no_receiver() {
        let hub = Hub::new();
        assert_eq!(
            hub.send_to_tab(TabId(9), &Message::GetState),
            Err(TransportError::NoReceiver(TabId(9)))
        );
        assert_eq!(
            hub.send_to_active(&Message::GetState),
            Err(TransportError::NoActiveTab)
        );
    }

    #[test]
    fn routes_to_registered_page_and_pumps_store_changes() {
        let hub = Hub::new();
        let store = SharedStore::in_memory();
        let agent = Rc::new(RefCell::new(PageAgent::load(
            pdf_page(ColorScheme::Dark),
            store.clone(),
            hub.bus(),
            AgentOptions::default(),
        )));
        hub.register(TabId(1), agent.clone());
        hub.activate(Some(TabId(1)));

        let response = hub
            .send_to_active(&Message::SetGlobalEnabled { enabled: true })
            .expect("page is registered");
        assert_eq!(response, Response::ack(None));
        assert_eq!(agent.borrow().host().style(), INVERT_RULE);

        write_global_enabled(&store, false).unwrap();
        assert_eq!(hub.pump_pages(), 1);
        assert_eq!(agent.borrow().host().style(), "");

        hub.unregister(TabId(1));
        assert_eq!(
            hub.send_to_active(&Message::GetState),
            Err(TransportError::NoReceiver(TabId(1)))
        );
    }

    #[test]
    fn busy_page_reports_timeout() {
        let hub = Hub::new();
        let agent = Rc::new(RefCell::new(PageAgent::load(
            FakePage::pdf("https://x.test/a.pdf", ColorScheme::Light),
            SharedStore::in_memory(),
            hub.bus(),
            AgentOptions::default(),
        )));
        hub.register(TabId(2), agent.clone());

        let _busy = agent.borrow_mut();
        assert_eq!(
            hub.send_to_tab(TabId(2), &Message::GetState),
            Err(TransportError::Timeout(TabId(2)))
        );
    }
}
