use crate::env::filepath_from_xdg_data_dir;
use crate::error::SkkError;
use log::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const DEFAULT_ASCII_FORM: &str = include_str!("../../assets/rule/ascii_form.toml");

/// ASCII文字を全角英数へ変換する
#[derive(Debug, Clone)]
pub(crate) struct AsciiFormChanger {
    zenkaku_map: BTreeMap<char, String>,
}

#[derive(Deserialize)]
struct AsciiFormMap {
    hankaku: Vec<String>,
    zenkaku: Vec<String>,
}

impl AsciiFormChanger {
    pub(crate) fn default_ascii_form_changer() -> Self {
        if let Ok(filepath) = filepath_from_xdg_data_dir("rule/ascii_form.toml") {
            match AsciiFormChanger::from_file(&filepath) {
                Ok(changer) => return changer,
                Err(e) => warn!("Ignoring ascii form file {:?}: {}", filepath, e),
            }
        }
        AsciiFormChanger::from_string(DEFAULT_ASCII_FORM).unwrap_or_else(|e| {
            error!("Embedded ascii form table is broken: {}", e);
            AsciiFormChanger {
                zenkaku_map: BTreeMap::new(),
            }
        })
    }

    pub(crate) fn from_file(filename: &Path) -> Result<Self, SkkError> {
        let mut file = File::open(filename)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        AsciiFormChanger::from_string(&contents)
    }

    pub(crate) fn from_string(contents: &str) -> Result<Self, SkkError> {
        let ascii_form_map: AsciiFormMap = toml::from_str(contents)?;

        if ascii_form_map.zenkaku.len() != ascii_form_map.hankaku.len() {
            return Err(SkkError::RuleError(
                "hankaku and zenkaku in ascii form don't match in length".to_string(),
            ));
        }
        let mut zenkaku_map = BTreeMap::new();
        for (hankaku, zenkaku) in ascii_form_map
            .hankaku
            .into_iter()
            .zip(ascii_form_map.zenkaku.into_iter())
        {
            let mut chars = hankaku.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => {
                    zenkaku_map.insert(c, zenkaku);
                }
                _ => warn!("Ignored non single char entry in ascii form: {}", hankaku),
            }
        }
        Ok(Self { zenkaku_map })
    }

    pub(crate) fn adjust_ascii_char(&self, ascii_char: char) -> String {
        if let Some(zenkaku_ascii) = self.zenkaku_map.get(&ascii_char) {
            zenkaku_ascii.to_owned()
        } else {
            ascii_char.to_string()
        }
    }
}
