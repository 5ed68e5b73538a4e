use crate::chord::ChordConfig;
use crate::env::filepath_from_xdg_config_dir;
use crate::error::SkkError;
use crate::skk_modes::{CommaStyle, InputMode, PeriodStyle};
use log::*;
use std::fs::File;
use std::io::Read;
use std::path::Path;

///
/// Settings of a context, usually read from "skkcore/config.toml" in the XDG config dirs.
///
/// ```toml
/// page_size = 5
/// select_keys = "asdfg"
///
/// [dictionaries.user]
/// path = "/home/user/.skk-jisyo"
/// encoding = "utf-8"
///
/// [[dictionaries.system]]
/// type = "static_file"
/// path = "/usr/share/skk/SKK-JISYO.L"
/// encoding = "euc-jp"
///
/// [[dictionaries.system]]
/// type = "server"
/// host = "localhost"
/// port = 1178
/// encoding = "euc-jp"
/// ```
/// Omitted fields take the defaults.
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SkkConfig {
    /// Composing text ending with one of these is converted at once, e.g. "▽あい、" -> "▼愛、".
    pub auto_start_henkan_keywords: Vec<String>,
    pub period_style: PeriodStyle,
    pub comma_style: CommaStyle,
    /// Candidates on one page of the list.
    pub page_size: usize,
    /// Candidates shown one by one in the preedit before the list.
    pub pagination_start: usize,
    /// Keys to pick a candidate on the page shown, in page order.
    pub select_keys: String,
    pub initial_input_mode: InputMode,
    /// Rom-kana rule file. The built-in rule when None.
    pub rule_file: Option<String>,
    pub dictionaries: DictionariesConfig,
    pub chord: ChordConfig,
}

impl Default for SkkConfig {
    fn default() -> Self {
        SkkConfig {
            auto_start_henkan_keywords: [
                "を", "、", "。", "．", "，", "？", "」", "！", "；", "：", ")", ";", ":", "）",
                "”", "】", "』", "》", "〉", "｝", "］", "〕", "}", "]", "?", ".", ",", "!",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            period_style: PeriodStyle::PeriodJa,
            comma_style: CommaStyle::CommaJa,
            page_size: 7,
            pagination_start: 4,
            select_keys: "asdfjkl".to_string(),
            initial_input_mode: InputMode::Hiragana,
            rule_file: None,
            dictionaries: DictionariesConfig::default(),
            chord: ChordConfig::default(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct DictionariesConfig {
    pub user: Option<UserDictionaryConfig>,
    pub system: Vec<SystemDictionaryConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct UserDictionaryConfig {
    pub path: String,
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SystemDictionaryConfig {
    StaticFile {
        path: String,
        #[serde(default = "default_system_encoding")]
        encoding: String,
    },
    Server {
        host: String,
        port: u16,
        #[serde(default = "default_system_encoding")]
        encoding: String,
    },
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

fn default_system_encoding() -> String {
    "euc-jp".to_string()
}

impl SkkConfig {
    pub fn load_config_file(filepath: &Path) -> Result<Self, SkkError> {
        let mut file = File::open(filepath)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_string(&contents)
    }

    pub fn from_string(contents: &str) -> Result<Self, SkkError> {
        Ok(toml::from_str::<SkkConfig>(contents)?)
    }

    /// "skkcore/config.toml" in the config dirs, or the defaults when there is none.
    pub fn load_default_config() -> Result<Self, SkkError> {
        match filepath_from_xdg_config_dir("config.toml") {
            Ok(filepath) => {
                debug!("Loading config {:?}", filepath);
                Self::load_config_file(&filepath)
            }
            Err(_) => Ok(SkkConfig::default()),
        }
    }
}
