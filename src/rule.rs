use crate::env::filepath_from_xdg_data_dir;
use crate::error::SkkError;
use crate::keyevent::KeyToken;
use crate::skk_modes::InputMode;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const DEFAULT_RULE: &str = include_str!("../assets/rule/default.toml");

/// Rule file for romaji to kana conversion.
///
/// ```toml
/// [conversion]
/// "ka" = ["", "か"]
/// "kk" = ["k", "っ"]
/// ```
/// Each value is the carried over input and the converted hiragana.
#[derive(Deserialize, Debug, Clone)]
pub struct RomKanaRule {
    conversion: HashMap<String, (String, String)>,
}

impl RomKanaRule {
    /// Rule in the data dir "skkcore/rule/rule.toml" if any, or the built-in one.
    pub fn load_default_rule() -> Result<Self, SkkError> {
        match filepath_from_xdg_data_dir("rule/rule.toml") {
            Ok(filepath) => Self::load_rule_file(&filepath),
            Err(_) => Self::from_string(DEFAULT_RULE),
        }
    }

    pub fn load_rule_file(filepath: &Path) -> Result<Self, SkkError> {
        let mut file = File::open(filepath)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_string(&contents)
    }

    pub fn from_string(contents: &str) -> Result<Self, SkkError> {
        let result = toml::from_str::<RomKanaRule>(contents)?;
        if let Some(empty) = result.conversion.keys().find(|input| input.is_empty()) {
            return Err(SkkError::RuleError(format!(
                "Empty input in conversion rule: {:?}",
                empty
            )));
        }
        Ok(result)
    }

    pub(crate) fn get_conversion_rule(&self) -> &HashMap<String, (String, String)> {
        &self.conversion
    }
}

/// Input mode the key switches to from the current mode, if the key is a mode switch key there.
pub(crate) fn input_mode_transition(key: &KeyToken, current: InputMode) -> Option<InputMode> {
    match (key.to_string().as_str(), current) {
        ("q", InputMode::Hiragana) => Some(InputMode::Katakana),
        ("q", InputMode::Katakana) | ("q", InputMode::HalfWidthKatakana) => {
            Some(InputMode::Hiragana)
        }
        ("ctrl+q", InputMode::Hiragana) | ("ctrl+q", InputMode::Katakana) => {
            Some(InputMode::HalfWidthKatakana)
        }
        ("ctrl+q", InputMode::HalfWidthKatakana) => Some(InputMode::Hiragana),
        ("l", mode) if mode.is_kana() => Some(InputMode::Latin),
        ("shift+l", mode) if mode.is_kana() => Some(InputMode::WideLatin),
        ("ctrl+j", InputMode::Latin) | ("ctrl+j", InputMode::WideLatin) => {
            Some(InputMode::Hiragana)
        }
        _ => None,
    }
}
