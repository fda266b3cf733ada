use serde::Serialize;

use crate::settings::{Mode, SiteKey};

/// Where the page was loaded from, split the way the site key needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLocation {
    pub href: String,
    pub hostname: String,
    pub path: String,
}

impl PageLocation {
    pub fn parse(href: &str) -> Self {
        let rest = href.split_once("://").map_or(href, |(_, rest)| rest);
        let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
        let (authority, tail) = rest.split_at(authority_end);

        let host = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
        let hostname = match host.rsplit_once(':') {
            Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
                name
            }
            _ => host,
        };

        let path_end = tail.find(['?', '#']).unwrap_or(tail.len());
        let path = match &tail[..path_end] {
            "" => "/",
            path => path,
        };

        Self {
            href: href.to_string(),
            hostname: hostname.to_ascii_lowercase(),
            path: path.to_string(),
        }
    }

    pub fn site_key(&self) -> SiteKey {
        SiteKey::new(&self.hostname, &self.path)
    }
}

/// Point-in-time facts about the loaded document. Re-probed on every decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentProbe {
    pub href: String,
    pub content_type: Option<String>,
    /// `embed[type="application/pdf"]` or a `pdf-viewer` element is present.
    pub has_pdf_embed: bool,
    /// Tag names of the direct children of `<body>`.
    pub body_children: Vec<String>,
}

/// Transient on-page notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    ExtensionOn,
    ExtensionOff,
    SiteOverrideOn,
    SiteOverrideOff,
    Mode(Mode),
}

impl Notice {
    pub fn text(self) -> String {
        match self {
            Self::ExtensionOn => "Extension ON".to_string(),
            Self::ExtensionOff => "Extension OFF".to_string(),
            Self::SiteOverrideOn => "Custom settings for this PDF".to_string(),
            Self::SiteOverrideOff => "Using global settings".to_string(),
            Self::Mode(mode) => format!("Mode: {mode}"),
        }
    }
}

/// The DOM-facing side of a page. Style writes replace the whole injected rule text.
pub trait PageHost {
    fn location(&self) -> PageLocation;
    fn document(&self) -> DocumentProbe;
    fn prefers_dark(&self) -> bool;
    fn write_style(&mut self, css: &str);
    fn show_notice(&mut self, notice: Notice);

    fn clear_style(&mut self) {
        self.write_style("");
    }
}
