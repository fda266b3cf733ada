use std::cell::RefCell;
use std::rc::Rc;

use crate::coordinator::{Command, Coordinator};
use crate::messaging::{Hub, Message, TabId, Transport};
use crate::page::{AgentOptions, PageAgent};
use crate::popup::Popup;
use crate::settings::{self, Mode, SiteSetting};
use crate::storage::SharedStore;
use crate::testing::{FakePage, INVERT_RULE};
use crate::theme::{ColorScheme, SystemTheme};

const PDF_URL: &str = "https://journal.example/articles/42.pdf";

struct Browser {
    hub: Hub,
    store: SharedStore,
    theme: SystemTheme,
    coordinator: Coordinator,
}

impl Browser {
    fn new(scheme: ColorScheme) -> Self {
        let store = SharedStore::in_memory();
        Self {
            hub: Hub::new(),
            coordinator: Coordinator::new(store.clone()),
            store,
            theme: SystemTheme::new(scheme),
        }
    }

    fn open_tab(&self, tab: u32, href: &str) -> Rc<RefCell<PageAgent<FakePage>>> {
        let page = FakePage::with_theme(href, None, self.theme.clone());
        let agent = Rc::new(RefCell::new(PageAgent::load(
            page,
            self.store.clone(),
            self.hub.bus(),
            AgentOptions::default(),
        )));
        self.hub.register(TabId(tab), agent.clone());
        self.hub.activate(Some(TabId(tab)));
        agent
    }

    fn popup(&self) -> Popup<SystemTheme> {
        Popup::open(
            self.store.clone(),
            &self.hub.bus(),
            self.theme.clone(),
            &self.hub,
        )
    }

    fn command(&mut self, command: Command) {
        self.coordinator.on_command(command, &self.hub);
        self.hub.pump_pages();
    }
}

#[test]
fn global_gate_blocks_until_toggled_on() {
    let mut browser = Browser::new(ColorScheme::Dark);
    let agent = browser.open_tab(1, PDF_URL);

    let popup = browser.popup();
    assert!(!popup.snapshot().effectively_enabled);
    assert_eq!(agent.borrow().host().style(), "");

    browser.command(Command::ToggleGlobal);
    let report = agent.borrow().report();
    assert!(report.effectively_enabled);
    assert_eq!(agent.borrow().host().style(), INVERT_RULE);
}

#[test]
fn theme_switch_clears_system_override_without_messages() {
    let browser = Browser::new(ColorScheme::Dark);
    settings::write_global_enabled(&browser.store, true).unwrap();
    let agent = browser.open_tab(1, PDF_URL);
    let mut popup = browser.popup();

    assert!(popup.toggle_site(&browser.hub));
    assert_eq!(agent.borrow().state().site, SiteSetting::Overridden(Mode::System));
    assert!(agent.borrow().report().effectively_enabled);
    assert_eq!(agent.borrow().host().style(), INVERT_RULE);

    let version = browser.store.version();
    browser.theme.set_scheme(ColorScheme::Light);
    browser.hub.system_theme_changed();
    assert_eq!(agent.borrow().host().style(), "");
    assert_eq!(browser.store.version(), version);
}

#[test]
fn disabling_override_reverts_to_global_settings() {
    let browser = Browser::new(ColorScheme::Light);
    let agent = browser.open_tab(1, PDF_URL);
    let mut popup = browser.popup();

    popup.toggle_site(&browser.hub);
    popup.select_mode(Mode::Invert, &browser.hub);
    assert_eq!(agent.borrow().host().style(), INVERT_RULE);

    popup.toggle_site(&browser.hub);
    let site_key = agent.borrow().state().site_key.clone();
    assert_eq!(browser.store.get(&site_key.store_key()), None);
    // global is off, so the page falls back to no filter
    assert_eq!(agent.borrow().host().style(), "");
    assert!(!popup.snapshot().site_override);
    assert_eq!(popup.snapshot().current_mode, Mode::System);
}

#[test]
fn second_tab_on_same_page_follows_store_changes() {
    let browser = Browser::new(ColorScheme::Light);
    let first = browser.open_tab(1, PDF_URL);
    let second = browser.open_tab(2, PDF_URL);

    browser.hub.activate(Some(TabId(1)));
    browser
        .hub
        .send_to_active(&Message::SetSiteOverride { enabled: true })
        .expect("first tab is loaded");
    browser
        .hub
        .send_to_active(&Message::SetMode { mode: Mode::Invert })
        .expect("first tab is loaded");
    assert_eq!(first.borrow().host().style(), INVERT_RULE);
    assert_eq!(second.borrow().host().style(), "");

    browser.hub.pump_pages();
    assert_eq!(
        second.borrow().state().site,
        SiteSetting::Overridden(Mode::Invert)
    );
    assert_eq!(second.borrow().host().style(), INVERT_RULE);
}

#[test]
fn site_shortcut_updates_open_popup_through_versioned_hint() {
    let mut browser = Browser::new(ColorScheme::Dark);
    browser.open_tab(1, PDF_URL);
    let mut popup = browser.popup();
    assert!(!popup.snapshot().site_override);

    browser.command(Command::ToggleSite);
    assert!(popup.pump(&browser.hub));
    assert!(popup.snapshot().site_override);
    assert!(popup.view().site_checked);
    // everything pending is now stale
    assert!(!popup.pump(&browser.hub));
}

#[test]
fn document_detected_after_load_gets_filtered_on_next_render() {
    let browser = Browser::new(ColorScheme::Light);
    settings::write_global_enabled(&browser.store, true).unwrap();
    settings::write_global_mode(&browser.store, Mode::Invert).unwrap();
    let agent = browser.open_tab(1, "https://viewer.example/open?id=7");
    assert_eq!(agent.borrow().host().style(), "");
    assert!(!agent.borrow().report().is_pdf);

    agent.borrow_mut().host_mut().document_mut().body_children = vec!["embed".to_string()];
    browser
        .hub
        .send_to_active(&Message::SetGlobalEnabled { enabled: true })
        .expect("tab is loaded");
    assert!(agent.borrow().report().is_pdf);
    assert_eq!(agent.borrow().host().style(), INVERT_RULE);
}

#[test]
fn rapid_double_toggle_settles_on_last_write() {
    let mut browser = Browser::new(ColorScheme::Dark);
    let agent = browser.open_tab(1, PDF_URL);

    browser.coordinator.on_command(Command::ToggleGlobal, &browser.hub);
    browser.coordinator.on_command(Command::ToggleGlobal, &browser.hub);
    browser.hub.pump_pages();

    assert!(!settings::read_global(&browser.store).enabled);
    assert!(!agent.borrow().state().global.enabled);
    assert_eq!(agent.borrow().host().style(), "");
}

#[test]
fn closed_tab_is_an_inapplicable_context() {
    let mut browser = Browser::new(ColorScheme::Dark);
    browser.open_tab(1, PDF_URL);
    browser.hub.unregister(TabId(1));

    browser.command(Command::ToggleGlobal);
    assert!(settings::read_global(&browser.store).enabled);

    let mut popup = browser.popup();
    assert!(popup.snapshot().global_enabled);
    assert!(!popup.snapshot().page_reachable());
    assert!(!popup.toggle_site(&browser.hub));
}
