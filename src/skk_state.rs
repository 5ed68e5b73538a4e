use crate::dictionary::Candidate;
use crate::rom_kana_converter::RomKanaState;
use crate::skk_modes::ConversionMode;
use std::fmt::{Display, Formatter};

/// Tab補完中の候補と位置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Completion {
    pub(crate) words: Vec<String>,
    pub(crate) index: usize,
}

///
/// One level of composition. Level 0 is the usual input, each dictionary edit pushes one more.
///
#[derive(Debug, Clone, Default)]
pub(crate) struct SkkState {
    pub(crate) conversion_mode: ConversionMode,
    // ■モードでは未確定のローマ字のみ。▽▼では読みのかな(abbrevでは入力そのまま)
    pub(crate) rom_kana: RomKanaState,
    // 送り仮名。送り開始の大文字から
    pub(crate) okuri: Option<RomKanaState>,
    // 送り仮名の最初の一文字。見出し語の末尾になる。 e.g. かんがe
    pub(crate) okuri_prefix: Option<char>,
    pub(crate) abbrev: bool,
    // \ から入る区点入力の16進数字
    pub(crate) kuten: Option<String>,
    // 変換時に引いた見出し語
    pub(crate) midasi: String,
    // auto-start-henkanのキーワード。確定時に候補の後に付く
    pub(crate) suffix: String,
    pub(crate) completion: Option<Completion>,
    // 辞書登録中に退避した候補リスト
    pub(crate) candidate_snapshot: Vec<Candidate>,
    // 辞書登録中に確定された文字列
    pub(crate) dict_edit_output: String,
}

impl SkkState {
    pub(crate) fn new() -> Self {
        Default::default()
    }

    /// Back to ■ keeping what this dictionary edit level has committed.
    pub(crate) fn clear_composition(&mut self) {
        let dict_edit_output = std::mem::take(&mut self.dict_edit_output);
        *self = SkkState {
            dict_edit_output,
            ..SkkState::new()
        };
    }

    /// Select -> Start. 送り仮名と接尾辞は読みに戻す。
    pub(crate) fn fold_to_start(&mut self) {
        if let Some(okuri) = self.okuri.take() {
            self.rom_kana.output.push_str(&okuri.output);
            self.rom_kana.pending = okuri.pending;
        }
        self.okuri_prefix = None;
        let suffix = std::mem::take(&mut self.suffix);
        self.rom_kana.output.push_str(&suffix);
        self.candidate_snapshot.clear();
        self.conversion_mode = ConversionMode::Start;
    }

    pub(crate) fn okuri_output(&self) -> &str {
        self.okuri.as_ref().map(|okuri| okuri.output()).unwrap_or("")
    }

    /// Kana in composition with its okuri, as shown in a dictionary edit prompt. e.g. "かんが*え"
    pub(crate) fn headword(&self) -> String {
        match &self.okuri {
            Some(okuri) => format!("{}*{}", self.rom_kana.output, okuri.output),
            None => self.rom_kana.output.to_owned(),
        }
    }

    ///
    /// (prefix, word, suffix) of the preedit of this level.
    /// `candidate` is the candidate selected when in ▼ mode.
    ///
    pub(crate) fn preedit_components(&self, candidate: Option<&Candidate>) -> (String, String, String) {
        if let Some(kuten) = &self.kuten {
            return ("JIS ".to_string(), kuten.to_owned(), String::new());
        }
        match self.conversion_mode {
            ConversionMode::None => (String::new(), self.rom_kana.pending.to_owned(), String::new()),
            ConversionMode::Start => {
                let mut word = self.rom_kana.output.to_owned() + &self.rom_kana.pending;
                if let Some(okuri) = &self.okuri {
                    word.push('*');
                    word.push_str(&okuri.output);
                    word.push_str(&okuri.pending);
                }
                ("▽".to_string(), word, String::new())
            }
            ConversionMode::Select => {
                let word = match candidate {
                    Some(candidate) => candidate.output.to_owned(),
                    None => self.rom_kana.output.to_owned(),
                };
                (
                    "▼".to_string(),
                    word,
                    self.okuri_output().to_owned() + &self.suffix,
                )
            }
        }
    }
}

impl Display for SkkState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{{:?} kana: {:?} okuri: {:?} abbrev: {} kuten: {:?} midasi: {} suffix: {} edited: {}}}",
            self.conversion_mode,
            self.rom_kana,
            self.okuri,
            self.abbrev,
            self.kuten,
            self.midasi,
            self.suffix,
            self.dict_edit_output
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn state(mode: ConversionMode, output: &str, pending: &str) -> SkkState {
        SkkState {
            conversion_mode: mode,
            rom_kana: RomKanaState {
                output: output.to_string(),
                pending: pending.to_string(),
            },
            ..SkkState::new()
        }
    }

    #[test]
    fn preedit_none() {
        let state = state(ConversionMode::None, "", "ky");
        assert_eq!(
            ("".to_string(), "ky".to_string(), "".to_string()),
            state.preedit_components(None)
        );
    }

    #[test]
    fn preedit_start_with_okuri() {
        let mut state = state(ConversionMode::Start, "つか", "");
        state.okuri = Some(RomKanaState {
            output: "っ".to_string(),
            pending: "t".to_string(),
        });
        let (prefix, word, _) = state.preedit_components(None);
        assert_eq!("▽", prefix);
        assert_eq!("つか*っt", word);
        assert_eq!("つか*っ", state.headword());
    }

    #[test]
    fn preedit_select() {
        let mut state = state(ConversionMode::Select, "かんが", "");
        state.okuri = Some(RomKanaState {
            output: "え".to_string(),
            pending: "".to_string(),
        });
        let candidate = Candidate::new(
            "かんがe".to_string(),
            true,
            "考".to_string(),
            None,
            "考".to_string(),
        );
        assert_eq!(
            ("▼".to_string(), "考".to_string(), "え".to_string()),
            state.preedit_components(Some(&candidate))
        );
    }

    #[test]
    fn fold_back() {
        let mut state = state(ConversionMode::Select, "あい", "");
        state.suffix = "、".to_string();
        state.fold_to_start();
        assert_eq!(ConversionMode::Start, state.conversion_mode);
        assert_eq!("あい、", state.rom_kana.output());
    }

    #[test]
    fn clear_keeps_edited() {
        let mut state = state(ConversionMode::Start, "あい", "k");
        state.dict_edit_output = "愛".to_string();
        state.clear_composition();
        assert_eq!(ConversionMode::None, state.conversion_mode);
        assert!(state.rom_kana.is_empty());
        assert_eq!("愛", state.dict_edit_output);
    }

    #[test]
    fn kuten_prompt() {
        let mut state = SkkState::new();
        state.kuten = Some("30".to_string());
        let (prefix, word, _) = state.preedit_components(None);
        assert_eq!("JIS 30", prefix + &word);
    }
}
