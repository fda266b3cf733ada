use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    Character,
    Modifier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyToken {
    pub label: String,
    pub kind: KeyKind,
}

impl KeyToken {
    fn new(label: String) -> Self {
        let mut chars = label.chars();
        let kind = match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphanumeric() => KeyKind::Character,
            _ => KeyKind::Modifier,
        };
        Self { label, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "keys", rename_all = "lowercase")]
pub enum ShortcutLabel {
    Unset,
    Keys(Vec<KeyToken>),
}

impl ShortcutLabel {
    pub const UNSET_TEXT: &'static str = "Not set";
}

const SYMBOL_CHARS: [char; 9] = ['⌘', '⌃', '⌥', '⇧', '⏎', '⇥', '⎋', '⌫', '⌦'];

fn key_symbol(name: &str) -> Option<&'static str> {
    let symbol = match name.to_lowercase().as_str() {
        "command" | "cmd" | "meta" | "⌘" => "⌘",
        "ctrl" | "control" | "⌃" => "⌃",
        "alt" | "option" | "⌥" => "⌥",
        "shift" | "⇧" => "⇧",
        "arrowup" | "up" => "↑",
        "arrowdown" | "down" => "↓",
        "arrowleft" | "left" => "←",
        "arrowright" | "right" => "→",
        "backspace" => "⌫",
        "delete" => "⌦",
        "enter" => "⏎",
        "tab" => "⇥",
        "escape" => "⎋",
        "space" => "␣",
        _ => return None,
    };
    Some(symbol)
}

/// Parse a platform shortcut string, either `Shift+Command+Z` or `⇧⌘Z`.
pub fn parse_shortcut(shortcut: Option<&str>) -> ShortcutLabel {
    let Some(shortcut) = shortcut.map(str::trim).filter(|s| !s.is_empty()) else {
        return ShortcutLabel::Unset;
    };

    let labels: Vec<String> = if shortcut.contains('+') {
        shortcut
            .split('+')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| key_symbol(part).map_or_else(|| part.to_uppercase(), str::to_string))
            .collect()
    } else {
        shortcut
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| {
                if SYMBOL_CHARS.contains(&c) {
                    c.to_string()
                } else {
                    c.to_uppercase().collect()
                }
            })
            .collect()
    };

    ShortcutLabel::Keys(labels.into_iter().map(KeyToken::new).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(label: &ShortcutLabel) -> Vec<&str> {
        match label {
            ShortcutLabel::Unset => Vec::new(),
            ShortcutLabel::Keys(keys) => keys.iter().map(|k| k.label.as_str()).collect(),
        }
    }

    #[test]
    fn plus_separated_names_map_to_symbols() {
        let label = parse_shortcut(Some("Shift+Command+Z"));
        assert_eq!(labels(&label), vec!["⇧", "⌘", "Z"]);

        let label = parse_shortcut(Some("Ctrl+Alt+ArrowUp"));
        assert_eq!(labels(&label), vec!["⌃", "⌥", "↑"]);
    }

    #[test]
    fn symbol_strings_are_tokenized_per_character() {
        let label = parse_shortcut(Some("⇧⌘x"));
        assert_eq!(labels(&label), vec!["⇧", "⌘", "X"]);
    }

    #[test]
    fn single_alphanumerics_are_character_keys() {
        let ShortcutLabel::Keys(keys) = parse_shortcut(Some("Ctrl+Space+7")) else {
            panic!("shortcut should parse");
        };
        let kinds: Vec<KeyKind> = keys.iter().map(|k| k.kind).collect();
        assert_eq!(
            kinds,
            vec![KeyKind::Modifier, KeyKind::Modifier, KeyKind::Character]
        );
        assert_eq!(keys[1].label, "␣");
    }

    #[test]
    fn missing_or_blank_shortcut_is_unset() {
        assert_eq!(parse_shortcut(None), ShortcutLabel::Unset);
        assert_eq!(parse_shortcut(Some("  ")), ShortcutLabel::Unset);
        assert_eq!(ShortcutLabel::UNSET_TEXT, "Not set");
    }
}
