//! Test doubles shared by unit tests.

use crate::page::{DocumentProbe, Notice, PageHost, PageLocation};
use crate::theme::{ColorScheme, SystemTheme, ThemeSource};

pub(crate) const INVERT_RULE: &str =
    "embed, pdf-viewer { filter: invert(1) hue-rotate(180deg) !important; }";

/// Page that records every style write and notice.
#[derive(Debug, Clone)]
pub(crate) struct FakePage {
    location: PageLocation,
    document: DocumentProbe,
    theme: SystemTheme,
    style_writes: Vec<String>,
    notices: Vec<String>,
}

impl FakePage {
    pub(crate) fn pdf(href: &str, scheme: ColorScheme) -> Self {
        Self::with_theme(href, Some("application/pdf"), SystemTheme::new(scheme))
    }

    pub(crate) fn html(href: &str, scheme: ColorScheme) -> Self {
        Self::with_theme(href, Some("text/html"), SystemTheme::new(scheme))
    }

    pub(crate) fn with_theme(href: &str, content_type: Option<&str>, theme: SystemTheme) -> Self {
        Self {
            location: PageLocation::parse(href),
            document: DocumentProbe {
                href: href.to_string(),
                content_type: content_type.map(str::to_string),
                ..Default::default()
            },
            theme,
            style_writes: Vec::new(),
            notices: Vec::new(),
        }
    }

    pub(crate) fn theme(&self) -> &SystemTheme {
        &self.theme
    }

    pub(crate) fn document_mut(&mut self) -> &mut DocumentProbe {
        &mut self.document
    }

    /// Current text of the injected style element.
    pub(crate) fn style(&self) -> &str {
        self.style_writes.last().map_or("", String::as_str)
    }

    pub(crate) fn style_writes(&self) -> &[String] {
        &self.style_writes
    }

    pub(crate) fn notices(&self) -> &[String] {
        &self.notices
    }
}

impl PageHost for FakePage {
    fn location(&self) -> PageLocation {
        self.location.clone()
    }

    fn document(&self) -> DocumentProbe {
        self.document.clone()
    }

    fn prefers_dark(&self) -> bool {
        self.theme.prefers_dark()
    }

    fn write_style(&mut self, css: &str) {
        self.style_writes.push(css.to_string());
    }

    fn show_notice(&mut self, notice: Notice) {
        self.notices.push(notice.text());
    }
}

pub(crate) fn pdf_page(scheme: ColorScheme) -> FakePage {
    FakePage::pdf("https://example.org/paper.pdf", scheme)
}
