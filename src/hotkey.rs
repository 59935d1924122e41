//! Hotkey bindings
//!
//! Bindings are written as `mod+mod+key` strings, e.g. `ctrl+q` or
//! `Ctrl + Shift + V`. Parsing is case- and whitespace-insensitive, and
//! `none` (or an empty string) disables a binding.

use std::fmt;

use crate::error::HotkeyError;

/// Modifier keys that can take part in a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierKey {
    Ctrl,
    Alt,
    Shift,
    Super,
}

impl ModifierKey {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "ctrl" | "control" => Some(ModifierKey::Ctrl),
            "alt" | "option" => Some(ModifierKey::Alt),
            "shift" => Some(ModifierKey::Shift),
            "super" | "win" | "cmd" | "command" | "meta" => Some(ModifierKey::Super),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ModifierKey::Ctrl => "ctrl",
            ModifierKey::Alt => "alt",
            ModifierKey::Shift => "shift",
            ModifierKey::Super => "super",
        }
    }
}

/// Non-modifier key of a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Printable character, stored lowercase
    Char(char),
    /// Function key F1-F12
    F(u8),
    Space,
    Tab,
}

impl Key {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "space" => return Some(Key::Space),
            "tab" => return Some(Key::Tab),
            _ => {}
        }

        let mut chars = token.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if !c.is_whitespace() && c != '+' {
                return Some(Key::Char(c.to_ascii_lowercase()));
            }
        }

        if let Some(num) = token.strip_prefix('f') {
            let n: u8 = num.parse().ok()?;
            if (1..=12).contains(&n) {
                return Some(Key::F(n));
            }
        }

        None
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{}", c),
            Key::F(n) => write!(f, "f{}", n),
            Key::Space => write!(f, "space"),
            Key::Tab => write!(f, "tab"),
        }
    }
}

/// A parsed key combination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hotkey {
    /// Modifiers in the order they were written; the first is the primary
    modifiers: Vec<ModifierKey>,
    key: Key,
}

impl Hotkey {
    /// Parse a binding string. Returns `Ok(None)` for a disabled binding.
    pub fn parse(input: &str) -> Result<Option<Self>, HotkeyError> {
        let normalized: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        if normalized.is_empty() || normalized == "none" {
            return Ok(None);
        }

        // "ctrl++" binds the plus key itself
        let (head, key_token) = match normalized.strip_suffix("++") {
            Some(rest) => (rest, "+"),
            None => match normalized.rsplit_once('+') {
                Some((rest, key)) => (rest, key),
                None => ("", normalized.as_str()),
            },
        };

        let key = if key_token == "+" {
            Key::Char('+')
        } else {
            Key::parse(key_token).ok_or_else(|| HotkeyError::UnknownKey(key_token.to_string()))?
        };

        let mut modifiers = Vec::new();
        for token in head.split('+').filter(|t| !t.is_empty()) {
            let modifier = ModifierKey::parse(token)
                .ok_or_else(|| HotkeyError::UnknownModifier(token.to_string()))?;
            if !modifiers.contains(&modifier) {
                modifiers.push(modifier);
            }
        }

        Ok(Some(Hotkey { modifiers, key }))
    }

    pub fn modifiers(&self) -> &[ModifierKey] {
        &self.modifiers
    }

    pub fn key(&self) -> Key {
        self.key
    }

    /// Modifier whose release commits a cycle
    pub fn primary_modifier(&self) -> Option<ModifierKey> {
        self.modifiers.first().copied()
    }

    pub fn has_modifier(&self, modifier: ModifierKey) -> bool {
        self.modifiers.contains(&modifier)
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}+", modifier.as_str())?;
        }
        write!(f, "{}", self.key)
    }
}

/// Identifies which binding a hotkey event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyId {
    /// The overlay-open hotkey
    Open,
    /// The cycle key
    Cycle,
    /// The held modifier of the open hotkey
    Modifier,
}

/// Press or release of a registered key, as reported by a hotkey source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyEvent {
    pub key: KeyId,
    pub pressed: bool,
}

impl HotkeyEvent {
    pub fn pressed(key: KeyId) -> Self {
        HotkeyEvent { key, pressed: true }
    }

    pub fn released(key: KeyId) -> Self {
        HotkeyEvent {
            key,
            pressed: false,
        }
    }
}

/// The active set of bindings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HotkeyBindings {
    pub open: Option<Hotkey>,
    pub cycle: Option<Hotkey>,
}

impl HotkeyBindings {
    /// Modifier that must stay held while cycling
    pub fn modifier(&self) -> Option<ModifierKey> {
        self.open.as_ref().and_then(Hotkey::primary_modifier)
    }
}

/// Receives hotkey events, on the registrar's own thread
pub type HotkeyCallback = Box<dyn Fn(HotkeyEvent) + Send>;

/// Source of hotkey presses and releases
pub trait HotkeyRegistrar {
    /// Start reporting the keys in `bindings` through `on_event`. Registering
    /// again replaces the previous bindings and callback.
    fn register(&mut self, bindings: &HotkeyBindings, on_event: HotkeyCallback) -> anyhow::Result<()>;

    /// Stop reporting events
    fn unregister(&mut self);

    /// Whether `Modifier` releases are reported. Without them a cycle is
    /// committed with Enter instead.
    fn reports_releases(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let hotkey = Hotkey::parse("ctrl+q").unwrap().unwrap();
        assert_eq!(hotkey.modifiers(), &[ModifierKey::Ctrl]);
        assert_eq!(hotkey.key(), Key::Char('q'));
        assert_eq!(hotkey.to_string(), "ctrl+q");
    }

    #[test]
    fn test_parse_normalizes_display_form() {
        let hotkey = Hotkey::parse("Ctrl + Shift + G").unwrap().unwrap();
        assert_eq!(hotkey.to_string(), "ctrl+shift+g");
        assert_eq!(hotkey.primary_modifier(), Some(ModifierKey::Ctrl));
        assert!(hotkey.has_modifier(ModifierKey::Shift));
    }

    #[test]
    fn test_parse_disabled() {
        assert_eq!(Hotkey::parse("none").unwrap(), None);
        assert_eq!(Hotkey::parse("None").unwrap(), None);
        assert_eq!(Hotkey::parse("  ").unwrap(), None);
    }

    #[test]
    fn test_parse_named_keys() {
        assert_eq!(Hotkey::parse("alt+tab").unwrap().unwrap().key(), Key::Tab);
        assert_eq!(Hotkey::parse("F12").unwrap().unwrap().key(), Key::F(12));
        assert_eq!(Hotkey::parse("ctrl++").unwrap().unwrap().key(), Key::Char('+'));
        assert!(Hotkey::parse("f13").is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_tokens() {
        assert_eq!(
            Hotkey::parse("hyper+q"),
            Err(HotkeyError::UnknownModifier("hyper".to_string()))
        );
        assert_eq!(
            Hotkey::parse("Ctrl + Banana"),
            Err(HotkeyError::UnknownKey("banana".to_string()))
        );
    }

    #[test]
    fn test_bindings_modifier_comes_from_open_hotkey() {
        let bindings = HotkeyBindings {
            open: Hotkey::parse("alt+shift+v").unwrap(),
            cycle: Hotkey::parse("ctrl+q").unwrap(),
        };
        assert_eq!(bindings.modifier(), Some(ModifierKey::Alt));

        let no_modifier = HotkeyBindings {
            open: Hotkey::parse("f9").unwrap(),
            cycle: None,
        };
        assert_eq!(no_modifier.modifier(), None);
    }
}
