use crate::env::filepath_from_xdg_data_dir;
use crate::error::SkkError;
use crate::skk_modes::InputMode;
use log::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const DEFAULT_KANA_FORM: &str = include_str!("../../assets/rule/kana_form.toml");

/// ひらがなをカタカナ・JIS X 0201カナへ、またその逆へ変換する
#[derive(Debug, Clone)]
pub(crate) struct KanaFormChanger {
    katakana: KanaMap,
    jisx0201: KanaMap,
    // カタカナ・半角カナ -> ひらがな
    hiragana: KanaMap,
}

#[derive(Deserialize)]
struct KanaFormMap {
    katakana: BTreeMap<String, String>,
    jisx0201: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default)]
struct KanaMap {
    map: BTreeMap<String, String>,
    /// max key len in chars. 'う゛' -> 2
    key_maxlen: usize,
}

impl KanaMap {
    fn new(map: BTreeMap<String, String>) -> Self {
        let key_maxlen = map.keys().map(|x| x.chars().count()).max().unwrap_or(0);
        Self { map, key_maxlen }
    }

    /// Greedy longest match replacement. Unmapped chars pass through.
    fn replace(&self, source: &str) -> String {
        let chars = source.chars().collect::<Vec<char>>();
        let mut result = String::new();
        let mut pos = 0;
        'outer: while pos < chars.len() {
            let longest = self.key_maxlen.min(chars.len() - pos);
            for len in (1..=longest).rev() {
                let key = chars[pos..pos + len].iter().collect::<String>();
                if let Some(replace) = self.map.get(&key) {
                    result.push_str(replace);
                    pos += len;
                    continue 'outer;
                }
            }
            result.push(chars[pos]);
            pos += 1;
        }
        result
    }
}

impl KanaFormChanger {
    pub(crate) fn default_kana_form_changer() -> Self {
        if let Ok(filepath) = filepath_from_xdg_data_dir("rule/kana_form.toml") {
            match KanaFormChanger::from_file(&filepath) {
                Ok(changer) => return changer,
                Err(e) => warn!("Ignoring kana form file {:?}: {}", filepath, e),
            }
        }
        KanaFormChanger::embedded()
    }

    fn embedded() -> Self {
        match KanaFormChanger::from_string(DEFAULT_KANA_FORM) {
            Ok(changer) => changer,
            Err(e) => {
                error!("Embedded kana form table is broken: {}", e);
                KanaFormChanger {
                    katakana: KanaMap::default(),
                    jisx0201: KanaMap::default(),
                    hiragana: KanaMap::default(),
                }
            }
        }
    }

    pub(crate) fn from_file(filename: &Path) -> Result<Self, SkkError> {
        let mut file = File::open(filename)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        KanaFormChanger::from_string(&contents)
    }

    pub(crate) fn from_string(contents: &str) -> Result<Self, SkkError> {
        let kana_form_map: KanaFormMap = toml::from_str(contents)?;
        let mut hiragana = BTreeMap::new();
        for (hira, other) in kana_form_map
            .katakana
            .iter()
            .chain(kana_form_map.jisx0201.iter())
        {
            hiragana
                .entry(other.to_owned())
                .or_insert_with(|| hira.to_owned());
        }
        Ok(KanaFormChanger {
            katakana: KanaMap::new(kana_form_map.katakana),
            jisx0201: KanaMap::new(kana_form_map.jisx0201),
            hiragana: KanaMap::new(hiragana),
        })
    }

    ///
    ///  ひらがなに対してinput modeに合わせた置換をする。
    ///  'う゛' -> 'ヴ', 'ぽ' -> 'ﾎﾟ' 等文字数も変わる可能性がある。
    ///
    pub(crate) fn adjust_kana_string(&self, input_mode: InputMode, kana: &str) -> String {
        match input_mode {
            InputMode::Katakana => self.katakana.replace(kana),
            InputMode::HalfWidthKatakana => self.jisx0201.replace(kana),
            _ => kana.to_string(),
        }
    }

    /// カタカナ・半角カナ混じりの文字列をひらがなに戻す。
    pub(crate) fn to_hiragana(&self, kana: &str) -> String {
        self.hiragana.replace(kana)
    }
}

#[cfg(test)]
impl KanaFormChanger {
    pub(crate) fn test_kana_form_changer() -> Self {
        KanaFormChanger::from_string(
            "\
[katakana]
\"あ\" = \"ア\"
\"ぁ\" = \"ァ\"
\"い\" = \"イ\"
\"き\" = \"キ\"
\"ん\" = \"ン\"
\"う゛\" = \"ヴ\"
\"ぐ\" = \"グ\"
\"っ\" = \"ッ\"
[jisx0201]
\"あ\" = \"ｱ\"
\"が\" = \"ｶﾞ\"
",
        )
        .unwrap()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sanity_check() {
        let changer = KanaFormChanger::test_kana_form_changer();
        assert_eq!(changer.jisx0201.map.get("あ").unwrap(), "ｱ");
        assert_eq!(changer.katakana.key_maxlen, 2);
    }

    #[test]
    fn adjust_kana_string() {
        let changer = KanaFormChanger::test_kana_form_changer();
        let actual = changer.adjust_kana_string(InputMode::Katakana, "う゛ぁいきんぐ");
        assert_eq!("ヴァイキング", actual);
    }

    #[test]
    fn adjust_kana_string_hiragana_untouched() {
        let changer = KanaFormChanger::test_kana_form_changer();
        let actual = changer.adjust_kana_string(InputMode::Hiragana, "っ");
        assert_eq!("っ", actual);
    }

    #[test]
    fn to_hiragana() {
        let changer = KanaFormChanger::test_kana_form_changer();
        assert_eq!("う゛ぁいきんぐ", changer.to_hiragana("ヴァイキング"));
        assert_eq!("あが", changer.to_hiragana("ｱｶﾞ"));
    }

    #[test]
    fn embedded_table() {
        let changer = KanaFormChanger::embedded();
        assert_eq!(
            "ｶﾞｯｺｳ",
            changer.adjust_kana_string(InputMode::HalfWidthKatakana, "がっこう")
        );
        assert_eq!(
            "ヴァイオリン",
            changer.adjust_kana_string(InputMode::Katakana, "う゛ぁいおりん")
        );
        assert_eq!("がっこう", changer.to_hiragana("ｶﾞｯｺｳ"));
    }
}
