use serde::Serialize;

use super::host::DocumentProbe;
use super::model::PageAgentState;
use crate::settings::{Mode, SiteSetting};

pub const INVERT_FILTER: &str = "invert(1) hue-rotate(180deg)";
pub const NO_FILTER: &str = "none";
const PDF_CONTENT_TYPE: &str = "application/pdf";
const FILTER_TARGETS: &str = "embed, pdf-viewer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveDecision {
    pub applicable: bool,
    pub should_filter: bool,
    pub css_filter_value: &'static str,
}

impl EffectiveDecision {
    /// Full text for the injected style element; empty means no filter.
    pub fn style_text(&self) -> String {
        if !self.applicable || !self.should_filter || self.css_filter_value == NO_FILTER {
            return String::new();
        }
        format!(
            "{FILTER_TARGETS} {{ filter: {} !important; }}",
            self.css_filter_value
        )
    }
}

pub fn current_mode(state: &PageAgentState) -> Mode {
    match state.site {
        SiteSetting::Overridden(mode) => mode,
        SiteSetting::Inherited => state.global.mode,
    }
}

pub fn is_applicable_document(document: &DocumentProbe) -> bool {
    let by_url = document.href.to_ascii_lowercase().contains(".pdf");
    let by_content_type = document
        .content_type
        .as_deref()
        .is_some_and(|content_type| content_type.eq_ignore_ascii_case(PDF_CONTENT_TYPE));
    let lone_embed = matches!(
        document.body_children.as_slice(),
        [only] if only.eq_ignore_ascii_case("embed")
    );

    by_url || by_content_type || document.has_pdf_embed || lone_embed
}

/// `System` resolves against the live theme; named modes map to fixed CSS.
pub fn effective_filter_value(mode: Mode, system_dark: bool) -> &'static str {
    match mode {
        Mode::System if system_dark => INVERT_FILTER,
        Mode::System => NO_FILTER,
        Mode::Invert => INVERT_FILTER,
    }
}

/// An override makes the site's mode authoritative even while globally off.
pub fn should_filter(state: &PageAgentState, system_dark: bool) -> bool {
    let gate_open = state.site.is_overridden() || state.global.enabled;
    let light_system = current_mode(state) == Mode::System && !system_dark;
    gate_open && !light_system
}

pub fn decide(
    state: &PageAgentState,
    document: &DocumentProbe,
    system_dark: bool,
) -> EffectiveDecision {
    EffectiveDecision {
        applicable: is_applicable_document(document),
        should_filter: should_filter(state, system_dark),
        css_filter_value: effective_filter_value(current_mode(state), system_dark),
    }
}
