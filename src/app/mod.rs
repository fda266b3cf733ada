use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use thiserror::Error;

use crate::config::AppConfig;
use crate::coordinator::{Command, Coordinator};
use crate::error::AppResult;
use crate::messaging::{Hub, StateReport, TabId};
use crate::page::{AgentOptions, EffectiveDecision, PageAgent};
use crate::popup::{Popup, PopupView};
use crate::settings::Mode;
use crate::storage::SharedStore;
use crate::theme::{ColorScheme, SystemTheme};

mod headless;
#[cfg(test)]
mod scenarios;

pub use headless::HeadlessPage;

const PAGE_TAB: TabId = TabId(1);

const USAGE: &str = "usage: pdfshade <toggle-global|toggle-site|status|mode <system|invert>> <url> [--dark] [--content-type <mime>]";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("missing command\n{}", USAGE)]
    MissingCommand,
    #[error("missing page url\n{}", USAGE)]
    MissingUrl,
    #[error("unknown command `{0}`\n{usage}", usage = USAGE)]
    UnknownCommand(String),
    #[error("`{0}` needs a value")]
    MissingValue(&'static str),
    #[error("unexpected argument `{0}`")]
    UnexpectedArgument(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Command(Command),
    SetMode(Mode),
    Status,
}

/// One headless invocation against a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub action: Action,
    pub url: String,
    pub scheme: ColorScheme,
    pub content_type: Option<String>,
}

impl Request {
    pub fn parse<I>(args: I) -> Result<Self, RequestError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let mut positional = Vec::new();
        let mut scheme = ColorScheme::Light;
        let mut content_type = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--dark" => scheme = ColorScheme::Dark,
                "--light" => scheme = ColorScheme::Light,
                "--content-type" => {
                    content_type = Some(
                        args.next()
                            .ok_or(RequestError::MissingValue("--content-type"))?,
                    );
                }
                flag if flag.starts_with("--") => {
                    return Err(RequestError::UnexpectedArgument(flag.to_string()));
                }
                _ => positional.push(arg),
            }
        }

        let mut positional = positional.into_iter();
        let command = positional.next().ok_or(RequestError::MissingCommand)?;
        let action = match command.as_str() {
            "status" => Action::Status,
            "mode" => {
                let mode = positional.next().ok_or(RequestError::MissingValue("mode"))?;
                Action::SetMode(Mode::parse_lenient(&mode))
            }
            name => Action::Command(
                name.parse()
                    .map_err(|_| RequestError::UnknownCommand(name.to_string()))?,
            ),
        };
        let url = positional.next().ok_or(RequestError::MissingUrl)?;
        if let Some(extra) = positional.next() {
            return Err(RequestError::UnexpectedArgument(extra));
        }

        Ok(Self {
            action,
            url,
            scheme,
            content_type,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub state: StateReport,
    pub decision: EffectiveDecision,
    pub style: String,
    pub popup: PopupView,
    pub store_version: u64,
}

pub fn execute(request: &Request, config: &AppConfig) -> AppResult<Outcome> {
    let store_path = config.store_path()?;
    let store = SharedStore::open(&store_path)?;
    tracing::info!(path = %store_path.display(), action = ?request.action, "running headless session");
    Ok(run_session(request, &store, config))
}

/// Wire every context together for one page, run the action, then let everything settle.
pub fn run_session(request: &Request, store: &SharedStore, config: &AppConfig) -> Outcome {
    let theme = SystemTheme::new(request.scheme);
    let hub = Hub::new();
    let page = HeadlessPage::new(
        &request.url,
        request.content_type.clone(),
        theme.clone(),
        config.notices,
    );
    let agent = Rc::new(RefCell::new(PageAgent::load(
        page,
        store.clone(),
        hub.bus(),
        AgentOptions {
            max_site_overrides: config.max_site_overrides,
        },
    )));
    hub.register(PAGE_TAB, agent.clone());
    hub.activate(Some(PAGE_TAB));

    let mut popup = Popup::open(store.clone(), &hub.bus(), theme, &hub);
    match request.action {
        Action::Command(command) => {
            Coordinator::new(store.clone()).on_command(command, &hub);
        }
        Action::SetMode(mode) => popup.select_mode(mode, &hub),
        Action::Status => {}
    }
    hub.pump_pages();
    popup.pump(&hub);

    let agent = agent.borrow();
    Outcome {
        state: agent.report(),
        decision: agent.decision(),
        style: agent.host().style().to_string(),
        popup: popup.view(),
        store_version: store.version(),
    }
}
