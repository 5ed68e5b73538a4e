use crate::error::SkkError;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

bitflags! {
    /// Modifiers a key token can carry.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct KeyModifier: u32 {
        const SHIFT = 1;
        const CONTROL = 1 << 2;
        /// Key release. Only meaningful to the chord decoder.
        const RELEASE = 1 << 30;
    }
}

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
pub enum KeySymbol {
    Char(char),
    Return,
    Escape,
    BackSpace,
    Tab,
}

///
/// Key event as a host hands it to the context.
///
/// String representation is zero or more of "ctrl+", "shift+", "release+" followed by
/// one printable character or one of "return", "escape", "backspace", "tab", "space".
///
/// e.g.
/// "a" "shift+a" "ctrl+g" "return" "space" ","
///
#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
pub struct KeyToken {
    symbol: KeySymbol,
    modifiers: KeyModifier,
}

impl KeyToken {
    pub fn new(symbol: KeySymbol, modifiers: KeyModifier) -> Self {
        Self { symbol, modifiers }
    }

    pub fn symbol(&self) -> KeySymbol {
        self.symbol
    }

    pub fn modifiers(&self) -> KeyModifier {
        self.modifiers
    }

    pub(crate) fn is_shift(&self) -> bool {
        self.modifiers.contains(KeyModifier::SHIFT)
    }

    pub(crate) fn is_ctrl(&self) -> bool {
        self.modifiers.contains(KeyModifier::CONTROL)
    }

    pub(crate) fn is_release(&self) -> bool {
        self.modifiers.contains(KeyModifier::RELEASE)
    }

    /// Plain character without ctrl. Shift is allowed.
    pub(crate) fn char_without_ctrl(&self) -> Option<char> {
        match self.symbol {
            KeySymbol::Char(c) if !self.is_ctrl() => Some(c),
            _ => None,
        }
    }

    /// The character as typed: shifted letters come back uppercase.
    pub(crate) fn typed_char(&self) -> Option<char> {
        self.char_without_ctrl().map(|c| {
            if self.is_shift() {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
    }

    pub(crate) fn is_plain(&self, symbol: KeySymbol) -> bool {
        self.symbol == symbol && self.modifiers.is_empty()
    }

    pub(crate) fn is_ctrl_char(&self, c: char) -> bool {
        self.symbol == KeySymbol::Char(c) && self.modifiers == KeyModifier::CONTROL
    }
}

impl FromStr for KeyToken {
    type Err = SkkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut modifiers = KeyModifier::empty();
        let mut rest = s;
        loop {
            if let Some(stripped) = rest.strip_prefix("ctrl+") {
                modifiers |= KeyModifier::CONTROL;
                rest = stripped;
            } else if let Some(stripped) = rest.strip_prefix("shift+") {
                modifiers |= KeyModifier::SHIFT;
                rest = stripped;
            } else if let Some(stripped) = rest.strip_prefix("release+") {
                modifiers |= KeyModifier::RELEASE;
                rest = stripped;
            } else {
                break;
            }
        }

        let symbol = match rest {
            "return" => KeySymbol::Return,
            "escape" => KeySymbol::Escape,
            "backspace" => KeySymbol::BackSpace,
            "tab" | "\t" => KeySymbol::Tab,
            "space" => KeySymbol::Char(' '),
            _ => {
                let mut chars = rest.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if !c.is_control() => {
                        if c.is_ascii_uppercase() {
                            modifiers |= KeyModifier::SHIFT;
                            KeySymbol::Char(c.to_ascii_lowercase())
                        } else {
                            KeySymbol::Char(c)
                        }
                    }
                    _ => return Err(SkkError::ParseError(format!("Unknown key token: {}", s))),
                }
            }
        };
        Ok(KeyToken { symbol, modifiers })
    }
}

impl Display for KeyToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifier::RELEASE) {
            write!(f, "release+")?;
        }
        if self.modifiers.contains(KeyModifier::CONTROL) {
            write!(f, "ctrl+")?;
        }
        if self.modifiers.contains(KeyModifier::SHIFT) {
            write!(f, "shift+")?;
        }
        match self.symbol {
            KeySymbol::Char(' ') => write!(f, "space"),
            KeySymbol::Char(c) => write!(f, "{}", c),
            KeySymbol::Return => write!(f, "return"),
            KeySymbol::Escape => write!(f, "escape"),
            KeySymbol::BackSpace => write!(f, "backspace"),
            KeySymbol::Tab => write!(f, "tab"),
        }
    }
}
