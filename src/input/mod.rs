mod shortcut;

pub use shortcut::{parse_shortcut, KeyKind, KeyToken, ShortcutLabel};
