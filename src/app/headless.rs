use crate::notification;
use crate::page::{DocumentProbe, Notice, PageHost, PageLocation};
use crate::theme::{SystemTheme, ThemeSource};

/// Page without a DOM: the document is described by its URL and declared content type.
#[derive(Debug, Clone)]
pub struct HeadlessPage {
    location: PageLocation,
    content_type: Option<String>,
    theme: SystemTheme,
    style: String,
    notices: bool,
}

impl HeadlessPage {
    pub fn new(
        href: &str,
        content_type: Option<String>,
        theme: SystemTheme,
        notices: bool,
    ) -> Self {
        Self {
            location: PageLocation::parse(href),
            content_type,
            theme,
            style: String::new(),
            notices,
        }
    }

    pub fn style(&self) -> &str {
        &self.style
    }
}

impl PageHost for HeadlessPage {
    fn location(&self) -> PageLocation {
        self.location.clone()
    }

    fn document(&self) -> DocumentProbe {
        DocumentProbe {
            href: self.location.href.clone(),
            content_type: self.content_type.clone(),
            has_pdf_embed: false,
            body_children: Vec::new(),
        }
    }

    fn prefers_dark(&self) -> bool {
        self.theme.prefers_dark()
    }

    fn write_style(&mut self, css: &str) {
        self.style.clear();
        self.style.push_str(css);
    }

    fn show_notice(&mut self, notice: Notice) {
        let text = notice.text();
        tracing::info!(notice = %text, site = %self.location.site_key(), "page notice");
        if self.notices {
            notification::send(text);
        }
    }
}
