use sequence_trie::SequenceTrie;

use crate::form_changer::KanaFormChanger;
use crate::rule::RomKanaRule;
use crate::skk_modes::{CommaStyle, InputMode, PeriodStyle};

pub(crate) type Converted = String;
pub(crate) type CarryOver = Vec<char>;

///
/// Romaji to kana conversion state.
///
/// `pending` is always a path from the root of the conversion trie, so the trie node the next letter
/// continues from is the node reached by walking `pending`.
///
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RomKanaState {
    pub(crate) output: String,
    pub(crate) pending: String,
}

impl RomKanaState {
    pub fn new() -> Self {
        Default::default()
    }

    /// Kana converted so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Romaji not yet converted.
    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_empty() && self.pending.is_empty()
    }
}

#[derive(Clone, Debug)]
pub(crate) struct RomKanaConverter {
    process_map: SequenceTrie<char, (Converted, CarryOver)>,
    kana_form_changer: KanaFormChanger,
    period_style: PeriodStyle,
    comma_style: CommaStyle,
}

impl RomKanaConverter {
    pub(crate) fn new(rule: &RomKanaRule, kana_form_changer: KanaFormChanger) -> Self {
        let mut process_map = SequenceTrie::new();
        for (input, (carry, converted)) in rule.get_conversion_rule() {
            let key = input.chars().collect::<Vec<char>>();
            let carry_over = carry.chars().collect::<Vec<char>>();
            process_map.insert(&key, (converted.to_owned(), carry_over));
        }

        Self {
            process_map,
            kana_form_changer,
            period_style: PeriodStyle::PeriodJa,
            comma_style: CommaStyle::CommaJa,
        }
    }

    pub(crate) fn set_period_style(&mut self, period_style: PeriodStyle) {
        self.period_style = period_style;
    }

    pub(crate) fn set_comma_style(&mut self, comma_style: CommaStyle) {
        self.comma_style = comma_style;
    }

    pub(crate) fn kana_form_changer(&self) -> &KanaFormChanger {
        &self.kana_form_changer
    }

    fn get_node(&self, key: &[char]) -> Option<&SequenceTrie<char, (Converted, CarryOver)>> {
        self.process_map.get_node(key)
    }

    ///
    /// Feed one letter.
    ///
    /// A letter continuing a longer rule only grows `pending`. A letter reaching a rule end appends the
    /// kana in the form of `input_mode` and feeds the carried over letters again, e.g. "tt" -> "っ" + "t".
    /// A letter that continues nothing first resolves the pending romaji ("n" -> "ん") and retries from the root.
    ///
    pub(crate) fn convert(
        &self,
        letter: char,
        state: RomKanaState,
        input_mode: InputMode,
    ) -> RomKanaState {
        let RomKanaState {
            mut output,
            pending,
        } = state;
        let mut key = pending.chars().collect::<Vec<char>>();
        key.push(letter);

        if let Some(node) = self.get_node(&key) {
            if !node.is_leaf() {
                return RomKanaState {
                    output,
                    pending: key.into_iter().collect(),
                };
            }
            if let Some((converted, carry_over)) = node.value() {
                output.push_str(
                    &self
                        .kana_form_changer
                        .adjust_kana_string(input_mode, converted),
                );
                let mut next = RomKanaState {
                    output,
                    pending: String::new(),
                };
                for carried in carry_over {
                    next = self.convert(*carried, next, input_mode);
                }
                return next;
            }
        }

        if !pending.is_empty() {
            let flushed = self.flush(RomKanaState { output, pending }, input_mode);
            return self.convert(letter, flushed, input_mode);
        }

        match self.convert_periods(letter) {
            Some(period) => output.push_str(
                &self
                    .kana_form_changer
                    .adjust_kana_string(input_mode, period),
            ),
            None => output.push(letter),
        }
        RomKanaState {
            output,
            pending: String::new(),
        }
    }

    ///
    /// Resolve the pending romaji as far as possible and drop the rest.
    /// Only a trailing "n" (or a pending input that is itself a rule) survives as kana.
    ///
    pub(crate) fn flush(&self, state: RomKanaState, input_mode: InputMode) -> RomKanaState {
        let RomKanaState {
            mut output,
            pending,
        } = state;
        if pending.is_empty() {
            return RomKanaState { output, pending };
        }
        let key = pending.chars().collect::<Vec<char>>();
        let converted = match self.get_node(&key).and_then(|node| node.value()) {
            Some((converted, _)) => Some(converted.as_str()),
            None if pending.ends_with('n') => Some("ん"),
            None => None,
        };
        if let Some(converted) = converted {
            output.push_str(
                &self
                    .kana_form_changer
                    .adjust_kana_string(input_mode, converted),
            );
        }
        RomKanaState {
            output,
            pending: String::new(),
        }
    }

    /// Drop one pending letter, or the last output char when nothing is pending. None when both are empty.
    pub(crate) fn delete(&self, state: &RomKanaState) -> Option<RomKanaState> {
        let mut next = state.clone();
        if next.pending.pop().is_some() || next.output.pop().is_some() {
            Some(next)
        } else {
            None
        }
    }

    // 今のpendingに続いて次のletterが来た時にかな変換を続けられるか。
    // e.g.
    // k j -> false
    // t t -> true ('っt' として続けられるため)
    pub(crate) fn can_continue(&self, state: &RomKanaState, letter: char) -> bool {
        let mut key = state.pending.chars().collect::<Vec<char>>();
        key.push(letter);
        self.get_node(&key).is_some()
    }

    /// Depth of the trie node `state.pending` leads to. None if pending is not a path in the trie.
    #[cfg(test)]
    pub(crate) fn cursor_depth(&self, state: &RomKanaState) -> Option<usize> {
        let key = state.pending.chars().collect::<Vec<char>>();
        self.get_node(&key).map(|_| key.len())
    }

    fn convert_periods(&self, letter: char) -> Option<&'static str> {
        match letter {
            '.' => Some(self.period_style.as_str()),
            ',' => Some(self.comma_style.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
impl RomKanaConverter {
    // Example from ddskk 16.2 skk-kana-input
    pub(crate) fn test_ant_converter() -> Self {
        let rule = RomKanaRule::from_string(
            r#"
[conversion]
"a" = ["", "あ"]
"n" = ["", "ん"]
"nn" = ["", "ん"]
"na" = ["", "な"]
"ta" = ["", "た"]
"tt" = ["t", "っ"]
"#,
        )
        .unwrap();
        RomKanaConverter::new(&rule, KanaFormChanger::test_kana_form_changer())
    }

    pub(crate) fn default_test_converter() -> Self {
        let rule = RomKanaRule::from_string(include_str!("../assets/rule/default.toml")).unwrap();
        RomKanaConverter::new(&rule, KanaFormChanger::default_kana_form_changer())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn feed(converter: &RomKanaConverter, input: &str, input_mode: InputMode) -> RomKanaState {
        input.chars().fold(RomKanaState::new(), |state, c| {
            converter.convert(c, state, input_mode)
        })
    }

    #[test]
    fn simple() {
        let converter = RomKanaConverter::default_test_converter();
        let state = feed(&converter, "ka", InputMode::Hiragana);
        assert_eq!("か", state.output());
        assert_eq!("", state.pending());
    }

    #[test]
    fn pending() {
        let converter = RomKanaConverter::default_test_converter();
        let state = feed(&converter, "my", InputMode::Hiragana);
        assert_eq!("", state.output());
        assert_eq!("my", state.pending());
        let state = converter.convert('o', state, InputMode::Hiragana);
        assert_eq!("みょ", state.output());
    }

    #[test]
    fn carry_over() {
        let converter = RomKanaConverter::test_ant_converter();
        let state = feed(&converter, "tt", InputMode::Hiragana);
        assert_eq!("っ", state.output());
        assert_eq!("t", state.pending());
        let state = converter.convert('a', state, InputMode::Hiragana);
        assert_eq!("った", state.output());
    }

    #[test]
    fn node_with_value_resolved_by_next_letter() {
        let converter = RomKanaConverter::test_ant_converter();
        let state = feed(&converter, "nt", InputMode::Hiragana);
        assert_eq!("ん", state.output());
        assert_eq!("t", state.pending());
    }

    #[test]
    fn moraic_n() {
        let converter = RomKanaConverter::default_test_converter();
        let state = feed(&converter, "kanji", InputMode::Hiragana);
        assert_eq!("かんじ", state.output());
        let state = feed(&converter, "n.", InputMode::Katakana);
        assert_eq!("ン。", state.output());
        let state = feed(&converter, "n", InputMode::HalfWidthKatakana);
        let state = converter.flush(state, InputMode::HalfWidthKatakana);
        assert_eq!("ﾝ", state.output());
    }

    #[test]
    fn flush_drops_incomplete() {
        let converter = RomKanaConverter::default_test_converter();
        let state = feed(&converter, "ak", InputMode::Hiragana);
        let state = converter.flush(state, InputMode::Hiragana);
        assert_eq!("あ", state.output());
        assert_eq!("", state.pending());
    }

    #[test]
    fn katakana() {
        let converter = RomKanaConverter::default_test_converter();
        let state = feed(&converter, "kakko", InputMode::Katakana);
        assert_eq!("カッコ", state.output());
    }

    #[test]
    fn periods() {
        let mut converter = RomKanaConverter::default_test_converter();
        let state = feed(&converter, "a,.", InputMode::Hiragana);
        assert_eq!("あ、。", state.output());
        converter.set_period_style(PeriodStyle::PeriodEn);
        converter.set_comma_style(CommaStyle::CommaEn);
        let state = feed(&converter, "a,.", InputMode::Hiragana);
        assert_eq!("あ，．", state.output());
    }

    #[test]
    fn unmapped_is_literal() {
        let converter = RomKanaConverter::default_test_converter();
        let state = feed(&converter, "1a!", InputMode::Hiragana);
        assert_eq!("1あ!", state.output());
    }

    #[test]
    fn delete() {
        let converter = RomKanaConverter::default_test_converter();
        let state = feed(&converter, "aky", InputMode::Hiragana);
        let state = converter.delete(&state).unwrap();
        assert_eq!("k", state.pending());
        assert_eq!(Some(1), converter.cursor_depth(&state));
        let state = converter.delete(&state).unwrap();
        assert_eq!("", state.pending());
        assert_eq!("あ", state.output());
        let state = converter.delete(&state).unwrap();
        assert!(state.is_empty());
        assert!(converter.delete(&state).is_none());
    }

    #[test]
    fn can_continue() {
        let converter = RomKanaConverter::default_test_converter();
        let state = feed(&converter, "k", InputMode::Hiragana);
        assert!(!converter.can_continue(&state, 'j'));
        let state = feed(&converter, "t", InputMode::Hiragana);
        assert!(converter.can_continue(&state, 't'));
    }

    #[test]
    fn pending_grows_one_per_letter_for_every_rule() {
        let converter = RomKanaConverter::default_test_converter();
        let rule = RomKanaRule::from_string(include_str!("../assets/rule/default.toml")).unwrap();
        for (input, (carry, converted)) in rule.get_conversion_rule() {
            let letters = input.chars().collect::<Vec<char>>();
            let mut state = RomKanaState::new();
            for (i, letter) in letters.iter().enumerate() {
                state = converter.convert(*letter, state, InputMode::Katakana);
                if i + 1 < letters.len() {
                    assert_eq!(i + 1, state.pending().chars().count(), "rule {}", input);
                    assert_eq!(Some(i + 1), converter.cursor_depth(&state), "rule {}", input);
                }
            }
            assert_eq!(carry.as_str(), state.pending(), "rule {}", input);
            assert_eq!(
                converter
                    .kana_form_changer()
                    .adjust_kana_string(InputMode::Katakana, converted),
                state.output(),
                "rule {}",
                input
            );
        }
    }
}
