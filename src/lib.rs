#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate enum_display_derive;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate serde_derive;

use std::fmt::{Display, Formatter};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use log::*;

use crate::candidate_selector::CandidateSelector;
use crate::config::{SkkConfig, SystemDictionaryConfig};
use crate::dictionary::file_dictionary::decode_string;
use crate::dictionary::{Candidate, SkkDictionary};
use crate::error::SkkError;
use crate::form_changer::{AsciiFormChanger, KanaFormChanger};
use crate::keyevent::{KeyModifier, KeySymbol, KeyToken};
use crate::rom_kana_converter::{RomKanaConverter, RomKanaState};
use crate::rule::{input_mode_transition, RomKanaRule};
use crate::skk_modes::{CommaStyle, ConversionMode, InputMode, PeriodStyle};
use crate::skk_state::{Completion, SkkState};

mod candidate_selector;
pub mod chord;
pub mod config;
pub mod dictionary;
mod env;
pub mod error;
mod form_changer;
pub mod keyevent;
mod rom_kana_converter;
pub mod rule;
pub mod skk_modes;
mod skk_state;
#[cfg(test)]
mod testhelper;

///
/// SKKの変換コンテキスト。
///
/// Feed key tokens with [SkkContext::press_key] and render [SkkContext::preedit_components].
/// Committed text comes back from each call, nothing is buffered for the host.
///
/// Dictionary editing stacks one [SkkState] per level on top of `base_state`.
///
pub struct SkkContext {
    base_state: SkkState,
    dict_edit_stack: Vec<SkkState>,
    input_mode: InputMode,
    initial_input_mode: InputMode,
    user_dictionary: Arc<SkkDictionary>,
    system_dictionaries: Vec<Arc<SkkDictionary>>,
    candidate_selector: CandidateSelector,
    rom_kana_converter: RomKanaConverter,
    ascii_form_changer: AsciiFormChanger,
    auto_start_henkan_keywords: Vec<String>,
    select_keys: Vec<char>,
}

impl SkkContext {
    /// Context with the default settings and the rom-kana rule of the data dir or the built-in one.
    pub fn new(
        user_dictionary: Arc<SkkDictionary>,
        system_dictionaries: Vec<Arc<SkkDictionary>>,
    ) -> Result<Self, SkkError> {
        Self::new_with_config(&SkkConfig::default(), user_dictionary, system_dictionaries)
    }

    /// Context with given dictionaries, ignoring `config.dictionaries`.
    pub fn new_with_config(
        config: &SkkConfig,
        user_dictionary: Arc<SkkDictionary>,
        system_dictionaries: Vec<Arc<SkkDictionary>>,
    ) -> Result<Self, SkkError> {
        let rule = match &config.rule_file {
            Some(rule_file) => RomKanaRule::load_rule_file(Path::new(rule_file))?,
            None => RomKanaRule::load_default_rule()?,
        };
        let mut rom_kana_converter =
            RomKanaConverter::new(&rule, KanaFormChanger::default_kana_form_changer());
        rom_kana_converter.set_period_style(config.period_style);
        rom_kana_converter.set_comma_style(config.comma_style);

        Ok(Self {
            base_state: SkkState::new(),
            dict_edit_stack: vec![],
            input_mode: config.initial_input_mode,
            initial_input_mode: config.initial_input_mode,
            user_dictionary,
            system_dictionaries,
            candidate_selector: CandidateSelector::new(config.page_size, config.pagination_start),
            rom_kana_converter,
            ascii_form_changer: AsciiFormChanger::default_ascii_form_changer(),
            auto_start_henkan_keywords: config.auto_start_henkan_keywords.to_owned(),
            select_keys: config.select_keys.chars().collect(),
        })
    }

    /// Context with the dictionaries the config names. Without a user dictionary, selections are not recorded.
    pub fn from_config(config: &SkkConfig) -> Result<Self, SkkError> {
        let user_dictionary = match &config.dictionaries.user {
            Some(user) => SkkDictionary::new_user_dict(&user.path, &user.encoding)?,
            None => SkkDictionary::new_empty_dict(),
        };
        let system_dictionaries = config
            .dictionaries
            .system
            .iter()
            .map(|system| match system {
                SystemDictionaryConfig::StaticFile { path, encoding } => {
                    SkkDictionary::new_static_dict(path, encoding)
                }
                SystemDictionaryConfig::Server {
                    host,
                    port,
                    encoding,
                } => SkkDictionary::new_server_dict(host, *port, encoding),
            })
            .map(|dictionary| dictionary.map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new_with_config(config, Arc::new(user_dictionary), system_dictionaries)
    }

    ///
    /// Process one key token such as "a", "shift+a", "ctrl+g", "space" or "return".
    /// Returns if the key was consumed, and the text committed by it.
    /// Tokens that do not parse are not consumed.
    ///
    pub fn press_key(&mut self, key: &str) -> (bool, String) {
        match KeyToken::from_str(key) {
            Ok(key) => self.process_key(&key),
            Err(e) => {
                debug!("Ignoring key: {}", e);
                (false, String::new())
            }
        }
    }

    /// Whitespace separated key tokens. Returns all the text committed on the way.
    pub fn press_keys(&mut self, keys: &str) -> String {
        let mut committed = String::new();
        for key in keys.split_whitespace() {
            let (handled, output) = self.press_key(key);
            if !handled {
                debug!("Key not handled: {}", key);
            }
            committed.push_str(&output);
        }
        committed
    }

    pub fn process_key(&mut self, key: &KeyToken) -> (bool, String) {
        if key.is_release() {
            return (false, String::new());
        }
        if key.is_plain(KeySymbol::BackSpace) {
            return self.delete_char();
        }
        let mut committed = String::new();
        let handled = self.handle_key(key, &mut committed);
        debug!(
            "{} -> handled: {} committed: {:?} {}",
            key, handled, committed, self
        );
        (handled, committed)
    }

    fn handle_key(&mut self, key: &KeyToken, committed: &mut String) -> bool {
        if !key.is_plain(KeySymbol::Tab) {
            self.current_state_mut().completion = None;
        }
        if self.current_state().kuten.is_some() {
            return self.handle_kuten(key, committed);
        }
        match self.current_state().conversion_mode {
            ConversionMode::None => self.handle_none(key, committed),
            ConversionMode::Start => self.handle_start(key, committed),
            ConversionMode::Select => self.handle_select(key, committed),
        }
    }

    fn handle_none(&mut self, key: &KeyToken, committed: &mut String) -> bool {
        let has_pending = !self.current_state().rom_kana.pending.is_empty();
        if !has_pending {
            if let Some(input_mode) = input_mode_transition(key, self.input_mode) {
                self.activate_input_mode(input_mode);
                return true;
            }
        }

        let in_dict_edit = self.dict_edit_level() > 0;
        if is_kakutei_key(key) {
            self.flush_pending(committed);
            if in_dict_edit {
                self.leave_dict_edit(committed);
                return true;
            }
            return has_pending;
        }
        if is_abort_key(key) {
            self.current_state_mut().rom_kana = RomKanaState::new();
            if in_dict_edit {
                self.abort_dict_edit();
                return true;
            }
            return has_pending && key.is_ctrl_char('g');
        }

        let letter = match key.char_without_ctrl() {
            Some(letter) => letter,
            None => return false,
        };
        match self.input_mode {
            InputMode::Latin => {
                let typed = key.typed_char().unwrap_or(letter).to_string();
                self.emit(&typed, committed);
                true
            }
            InputMode::WideLatin => {
                let wide = self
                    .ascii_form_changer
                    .adjust_ascii_char(key.typed_char().unwrap_or(letter));
                self.emit(&wide, committed);
                true
            }
            _ => self.input_kana_none(key, letter, committed),
        }
    }

    fn input_kana_none(&mut self, key: &KeyToken, letter: char, committed: &mut String) -> bool {
        let input_mode = self.input_mode;
        if self.current_state().rom_kana.pending.is_empty() && key.modifiers().is_empty() {
            match letter {
                '/' => {
                    let state = self.current_state_mut();
                    state.conversion_mode = ConversionMode::Start;
                    state.abbrev = true;
                    return true;
                }
                '\\' => {
                    self.current_state_mut().kuten = Some(String::new());
                    return true;
                }
                _ => {}
            }
        }

        if key.is_shift() && letter.is_ascii_alphabetic() {
            // 続けられない未確定のローマ字は確定してから変換開始
            if !self
                .rom_kana_converter
                .can_continue(&self.current_state().rom_kana, letter)
            {
                self.flush_pending(committed);
            }
            self.current_state_mut().conversion_mode = ConversionMode::Start;
            debug!("Start composition");
            if letter == 'q' {
                // Q は読みなしで▽を始める
                return true;
            }
            return self.input_kana_start(false, letter);
        }

        let rom_kana = std::mem::take(&mut self.current_state_mut().rom_kana);
        let mut rom_kana = self.rom_kana_converter.convert(letter, rom_kana, input_mode);
        let converted = std::mem::take(&mut rom_kana.output);
        self.current_state_mut().rom_kana = rom_kana;
        self.emit(&converted, committed);
        true
    }

    fn handle_start(&mut self, key: &KeyToken, committed: &mut String) -> bool {
        if self.current_state().abbrev {
            return self.handle_abbrev(key, committed);
        }

        let state = self.current_state();
        let has_pending = !state.rom_kana.pending.is_empty()
            || state
                .okuri
                .as_ref()
                .map_or(false, |okuri| !okuri.pending.is_empty());
        if !has_pending {
            if let Some(input_mode) = input_mode_transition(key, self.input_mode) {
                let text = self.kana_for_mode_switch(key);
                self.current_state_mut().clear_composition();
                self.emit(&text, committed);
                self.activate_input_mode(input_mode);
                return true;
            }
        }

        if key.is_plain(KeySymbol::Char(' ')) {
            self.start_conversion();
            return true;
        }
        if is_kakutei_key(key) {
            let text = self.composed_kana();
            self.current_state_mut().clear_composition();
            self.emit(&text, committed);
            return true;
        }
        if is_abort_key(key) {
            self.current_state_mut().clear_composition();
            return true;
        }
        if key.is_plain(KeySymbol::Tab) {
            self.complete();
            return true;
        }

        match key.char_without_ctrl() {
            Some(letter) => self.input_kana_start(key.is_shift(), letter),
            None => false,
        }
    }

    // ▽モードのモード切り替えキーで確定する文字列
    fn kana_for_mode_switch(&self, key: &KeyToken) -> String {
        let kana = self.composed_kana();
        let kana_form_changer = self.rom_kana_converter.kana_form_changer();
        if key.is_ctrl_char('q') {
            kana_form_changer.adjust_kana_string(
                InputMode::HalfWidthKatakana,
                &kana_form_changer.to_hiragana(&kana),
            )
        } else if key.is_plain(KeySymbol::Char('q')) {
            let hiragana = kana_form_changer.to_hiragana(&kana);
            if self.input_mode == InputMode::Hiragana {
                kana_form_changer.adjust_kana_string(InputMode::Katakana, &hiragana)
            } else {
                hiragana
            }
        } else {
            kana
        }
    }

    fn input_kana_start(&mut self, shift: bool, letter: char) -> bool {
        let input_mode = self.input_mode;
        let letter = letter.to_ascii_lowercase();

        if let Some(okuri) = self.current_state().okuri.clone() {
            let okuri = self.rom_kana_converter.convert(letter, okuri, input_mode);
            let okuri_complete = okuri.pending.is_empty();
            self.current_state_mut().okuri = Some(okuri);
            if okuri_complete {
                self.start_conversion();
            }
            return true;
        }

        let mut rom_kana = self.current_state().rom_kana.clone();
        if shift && letter.is_ascii_alphabetic() {
            if !rom_kana.pending.is_empty() && !self.rom_kana_converter.can_continue(&rom_kana, letter) {
                // "▽かn" + J -> "▽かん*j"
                rom_kana = self.rom_kana_converter.flush(rom_kana, input_mode);
            }
            if rom_kana.pending.is_empty() && !rom_kana.output.is_empty() {
                let okuri = self
                    .rom_kana_converter
                    .convert(letter, RomKanaState::new(), input_mode);
                let okuri_complete = okuri.pending.is_empty();
                let state = self.current_state_mut();
                state.rom_kana = rom_kana;
                state.okuri_prefix = Some(letter);
                state.okuri = Some(okuri);
                debug!("Start okuri with {}", letter);
                if okuri_complete {
                    self.start_conversion();
                }
                return true;
            }
        }

        let rom_kana = self.rom_kana_converter.convert(letter, rom_kana, input_mode);
        self.current_state_mut().rom_kana = rom_kana;
        self.try_auto_start_henkan();
        true
    }

    // 読みがキーワードで終わったら、キーワードの前までで変換を始める
    fn try_auto_start_henkan(&mut self) {
        let state = self.current_state();
        if !state.rom_kana.pending.is_empty() {
            return;
        }
        let kana_form_changer = self.rom_kana_converter.kana_form_changer();
        let output = &state.rom_kana.output;
        let keyword = self
            .auto_start_henkan_keywords
            .iter()
            .map(|keyword| kana_form_changer.adjust_kana_string(self.input_mode, keyword))
            .find(|keyword| output.len() > keyword.len() && output.ends_with(keyword.as_str()));
        if let Some(keyword) = keyword {
            debug!("Auto start henkan by {}", keyword);
            let state = self.current_state_mut();
            let composed_len = state.rom_kana.output.len() - keyword.len();
            state.rom_kana.output.truncate(composed_len);
            state.suffix = keyword;
            self.start_conversion();
        }
    }

    fn handle_abbrev(&mut self, key: &KeyToken, committed: &mut String) -> bool {
        if key.is_plain(KeySymbol::Char(' ')) {
            self.start_conversion();
            return true;
        }
        if is_kakutei_key(key) {
            let text = self.current_state().rom_kana.output.to_owned();
            self.current_state_mut().clear_composition();
            self.emit(&text, committed);
            return true;
        }
        if is_abort_key(key) {
            self.current_state_mut().clear_composition();
            return true;
        }
        if key.is_plain(KeySymbol::Tab) {
            self.complete();
            return true;
        }
        match key.typed_char() {
            Some(c) => {
                self.current_state_mut().rom_kana.output.push(c);
                true
            }
            None => false,
        }
    }

    // ▽ -> ▼
    fn start_conversion(&mut self) {
        let input_mode = self.input_mode;
        let state = self.current_state();
        let rom_kana = self
            .rom_kana_converter
            .flush(state.rom_kana.clone(), input_mode);
        let okuri = state
            .okuri
            .clone()
            .map(|okuri| self.rom_kana_converter.flush(okuri, input_mode));
        let midasi = if state.abbrev {
            rom_kana.output.to_owned()
        } else {
            let mut midasi = self
                .rom_kana_converter
                .kana_form_changer()
                .to_hiragana(&rom_kana.output);
            if let Some(okuri_prefix) = state.okuri_prefix {
                midasi.push(okuri_prefix);
            }
            midasi
        };
        if midasi.is_empty() {
            return;
        }

        let is_okuri = state.okuri_prefix.is_some();
        let candidates = dictionary::get_all_candidates(
            &self.user_dictionary,
            &self.system_dictionaries,
            &midasi,
            is_okuri,
        );
        debug!("{} candidates for {}", candidates.len(), midasi);
        let state = self.current_state_mut();
        state.rom_kana = rom_kana;
        state.okuri = okuri;
        state.midasi = midasi;
        state.completion = None;
        state.conversion_mode = ConversionMode::Select;
        self.candidate_selector.set_candidates(candidates);
        if self.candidate_selector.next_candidate(true).is_none() {
            self.enter_dict_edit();
        }
    }

    fn complete(&mut self) {
        let input_mode = self.input_mode;
        let state = self.current_state();
        if state.okuri.is_some() {
            return;
        }
        let completion = match &state.completion {
            Some(Completion { words, index }) => Completion {
                words: words.to_owned(),
                index: (index + 1).min(words.len() - 1),
            },
            None => {
                let prefix = if state.abbrev {
                    state.rom_kana.output.to_owned()
                } else {
                    let rom_kana = self
                        .rom_kana_converter
                        .flush(state.rom_kana.clone(), input_mode);
                    self.rom_kana_converter
                        .kana_form_changer()
                        .to_hiragana(&rom_kana.output)
                };
                if prefix.is_empty() {
                    return;
                }
                let words = dictionary::complete(
                    &self.user_dictionary,
                    &self.system_dictionaries,
                    &prefix,
                );
                if words.is_empty() {
                    debug!("No completion for {}", prefix);
                    return;
                }
                Completion { words, index: 0 }
            }
        };

        let word = &completion.words[completion.index];
        let output = if state.abbrev {
            word.to_owned()
        } else {
            self.rom_kana_converter
                .kana_form_changer()
                .adjust_kana_string(input_mode, word)
        };
        let state = self.current_state_mut();
        state.rom_kana = RomKanaState {
            output,
            pending: String::new(),
        };
        state.completion = Some(completion);
    }

    fn handle_select(&mut self, key: &KeyToken, committed: &mut String) -> bool {
        if key.is_plain(KeySymbol::Char(' ')) {
            self.next_candidate();
            return true;
        }
        if key.is_plain(KeySymbol::Char('x')) {
            self.previous_candidate();
            return true;
        }
        if key.symbol() == KeySymbol::Char('x') && key.modifiers() == KeyModifier::SHIFT {
            self.purge_current_candidate();
            return true;
        }
        if is_kakutei_key(key) {
            self.kakutei_selection(committed);
            return true;
        }
        if key.is_ctrl_char('g') {
            self.back_to_start();
            return true;
        }
        if key.is_plain(KeySymbol::Escape) {
            self.current_state_mut().clear_composition();
            self.candidate_selector.clear();
            return true;
        }
        if key.is_plain(KeySymbol::Tab) {
            return true;
        }
        if let KeySymbol::Char(c) = key.symbol() {
            let in_page = self
                .candidate_selector
                .index()
                .map_or(false, |index| index >= self.candidate_selector.pagination_start());
            if key.modifiers().is_empty() && in_page {
                if let Some(position) = self.select_keys.iter().position(|k| *k == c) {
                    if self.candidate_selector.select_on_page(position).is_some() {
                        self.kakutei_selection(committed);
                    }
                    return true;
                }
            }
        }

        // 確定してから改めて入力として扱う
        self.kakutei_selection(committed);
        self.handle_key(key, committed);
        true
    }

    fn kakutei_selection(&mut self, committed: &mut String) {
        let candidate = self.candidate_selector.candidate();
        let state = self.current_state();
        let word = match &candidate {
            Some(candidate) => candidate.output.to_owned(),
            None => state.rom_kana.output.to_owned(),
        };
        let text = word + state.okuri_output() + &state.suffix;
        if let Some(candidate) = candidate.filter(|candidate| candidate.persistable) {
            if let Err(e) = dictionary::confirm_candidate(&self.user_dictionary, &candidate) {
                warn!("Failed to record selection of {}: {}", candidate.kouho_text, e);
            }
        }
        self.current_state_mut().clear_composition();
        self.candidate_selector.clear();
        self.emit(&text, committed);
    }

    fn purge_current_candidate(&mut self) {
        if let Some(candidate) = self.candidate_selector.candidate() {
            if let Err(e) = dictionary::purge_candidate(&self.user_dictionary, &candidate) {
                warn!("Failed to purge {}: {}", candidate.kouho_text, e);
            }
        }
        self.current_state_mut().clear_composition();
        self.candidate_selector.clear();
    }

    fn back_to_start(&mut self) {
        self.candidate_selector.clear();
        self.current_state_mut().fold_to_start();
    }

    fn handle_kuten(&mut self, key: &KeyToken, committed: &mut String) -> bool {
        if is_abort_key(key) {
            self.current_state_mut().kuten = None;
            return true;
        }
        if is_kakutei_key(key) {
            let code = self.current_state_mut().kuten.take().unwrap_or_default();
            match kuten_to_string(&code) {
                Some(text) => self.emit(&text, committed),
                None => debug!("Invalid kuten code: {}", code),
            }
            return true;
        }
        if let Some(c) = key.char_without_ctrl().filter(char::is_ascii_hexdigit) {
            let state = self.current_state_mut();
            if let Some(kuten) = &mut state.kuten {
                kuten.push(c.to_ascii_lowercase());
                if kuten.len() > 6 {
                    debug!("Kuten code too long: {}", kuten);
                    state.clear_composition();
                }
            }
        }
        true
    }

    fn enter_dict_edit(&mut self) {
        let snapshot = self.candidate_selector.candidates().to_vec();
        self.candidate_selector.clear();
        let state = self.current_state_mut();
        state.candidate_snapshot = snapshot;
        state.conversion_mode = ConversionMode::Select;
        debug!("Enter dict edit for {}", state.midasi);
        self.dict_edit_stack.push(SkkState::new());
    }

    // 入力された語を親の見出し語の先頭候補として登録して確定する
    fn leave_dict_edit(&mut self, committed: &mut String) {
        let word = match self.dict_edit_stack.pop() {
            Some(frame) => frame.dict_edit_output,
            None => return,
        };
        if word.is_empty() {
            self.restore_parent();
            return;
        }
        let parent = self.current_state();
        let (dict_key, output) = dictionary::registration(&parent.midasi, &word);
        let candidate = Candidate::new(
            dict_key,
            parent.okuri_prefix.is_some(),
            word.to_owned(),
            None,
            output.to_owned(),
        );
        if let Err(e) = dictionary::confirm_candidate(&self.user_dictionary, &candidate) {
            warn!("Failed to register {}: {}", word, e);
        }
        let text = output + parent.okuri_output() + &parent.suffix;
        self.current_state_mut().clear_composition();
        self.candidate_selector.clear();
        self.emit(&text, committed);
    }

    fn abort_dict_edit(&mut self) {
        if self.dict_edit_stack.pop().is_some() {
            self.restore_parent();
        }
    }

    // 辞書登録をやめて親の▼に戻す。候補がなかった場合は▽に戻す
    fn restore_parent(&mut self) {
        let parent = self.current_state_mut();
        let snapshot = std::mem::take(&mut parent.candidate_snapshot);
        if snapshot.is_empty() {
            parent.fold_to_start();
            self.candidate_selector.clear();
        } else {
            let last = snapshot.len() - 1;
            self.candidate_selector.set_candidates(snapshot);
            self.candidate_selector.set_index(last);
        }
    }

    // dict edit中はそのレベルのバッファへ
    fn emit(&mut self, text: &str, committed: &mut String) {
        if self.dict_edit_level() > 0 {
            self.current_state_mut().dict_edit_output.push_str(text);
        } else {
            committed.push_str(text);
        }
    }

    fn flush_pending(&mut self, committed: &mut String) {
        let rom_kana = std::mem::take(&mut self.current_state_mut().rom_kana);
        let flushed = self.rom_kana_converter.flush(rom_kana, self.input_mode);
        self.emit(&flushed.output, committed);
    }

    // 送り仮名を含む▽の読み。未確定のローマ字は解決する
    fn composed_kana(&self) -> String {
        let state = self.current_state();
        let rom_kana = self
            .rom_kana_converter
            .flush(state.rom_kana.clone(), self.input_mode);
        let okuri = state
            .okuri
            .clone()
            .map(|okuri| self.rom_kana_converter.flush(okuri, self.input_mode).output)
            .unwrap_or_default();
        rom_kana.output + &okuri
    }

    ///
    /// Delete one character, in this order:
    /// okuri, composing kana or pending romaji, the ▼ candidate (committing all but its last char),
    /// kuten digits, the empty ▽ itself, then the text typed in a dictionary edit.
    ///
    /// Returns if something was deleted, and the text to commit.
    ///
    pub fn delete_char(&mut self) -> (bool, String) {
        let mut committed = String::new();
        let deleted = self.delete_char_inner(&mut committed);
        (deleted, committed)
    }

    fn delete_char_inner(&mut self, committed: &mut String) -> bool {
        self.current_state_mut().completion = None;
        let conversion_mode = self.current_state().conversion_mode;

        if conversion_mode == ConversionMode::Select {
            let candidate = self.candidate_selector.candidate();
            let state = self.current_state();
            let word = match candidate {
                Some(candidate) => candidate.output,
                None => state.rom_kana.output.to_owned(),
            };
            let mut text = word + state.okuri_output() + &state.suffix;
            text.pop();
            self.current_state_mut().clear_composition();
            self.candidate_selector.clear();
            self.emit(&text, committed);
            return true;
        }

        if let Some(okuri) = &self.current_state().okuri {
            let okuri = self
                .rom_kana_converter
                .delete(okuri)
                .filter(|okuri| !okuri.is_empty());
            let state = self.current_state_mut();
            if okuri.is_none() {
                state.okuri_prefix = None;
            }
            state.okuri = okuri;
            return true;
        }
        if let Some(rom_kana) = self
            .rom_kana_converter
            .delete(&self.current_state().rom_kana)
        {
            self.current_state_mut().rom_kana = rom_kana;
            return true;
        }

        let state = self.current_state_mut();
        if let Some(kuten) = &mut state.kuten {
            if kuten.pop().is_none() {
                state.kuten = None;
            }
            return true;
        }
        if state.conversion_mode == ConversionMode::Start {
            state.clear_composition();
            return true;
        }
        state.dict_edit_output.pop().is_some()
    }

    ///
    /// Next candidate, skipping a page once the candidates are listed.
    /// Running past the last candidate starts a dictionary edit and gives None.
    ///
    pub fn next_candidate(&mut self) -> Option<Candidate> {
        if self.current_state().conversion_mode != ConversionMode::Select {
            return None;
        }
        let candidate = self.candidate_selector.next_candidate(true);
        if candidate.is_none() {
            self.enter_dict_edit();
        }
        candidate
    }

    /// Previous candidate. Running past the first candidate goes back to ▽ and gives None.
    pub fn previous_candidate(&mut self) -> Option<Candidate> {
        if self.current_state().conversion_mode != ConversionMode::Select {
            return None;
        }
        let candidate = self.candidate_selector.previous_candidate(true);
        if candidate.is_none() {
            self.back_to_start();
        }
        candidate
    }

    /// Commit the index-th candidate of [SkkContext::current_candidates].
    pub fn select_candidate(&mut self, index: usize) -> (bool, String) {
        if self.current_state().conversion_mode != ConversionMode::Select
            || index >= self.candidate_selector.candidates().len()
        {
            return (false, String::new());
        }
        self.candidate_selector.set_index(index);
        let mut committed = String::new();
        self.kakutei_selection(&mut committed);
        (true, committed)
    }

    /// Commit whatever is in composition and go back to ■.
    pub fn kakutei(&mut self) -> String {
        let mut committed = String::new();
        match self.current_state().conversion_mode {
            ConversionMode::None => {
                self.current_state_mut().kuten = None;
                self.flush_pending(&mut committed);
            }
            ConversionMode::Start => {
                let text = self.composed_kana();
                self.current_state_mut().clear_composition();
                self.emit(&text, &mut committed);
            }
            ConversionMode::Select => self.kakutei_selection(&mut committed),
        }
        committed
    }

    /// Drop everything including dictionary edits, back to ■ in the initial input mode.
    pub fn reset(&mut self) {
        self.base_state = SkkState::new();
        self.dict_edit_stack.clear();
        self.candidate_selector.clear();
        self.input_mode = self.initial_input_mode;
    }

    pub fn activate_input_mode(&mut self, input_mode: InputMode) {
        debug!("Input mode {} -> {}", self.input_mode, input_mode);
        self.input_mode = input_mode;
    }

    ///
    /// (prompt, prefix, word, suffix) to render.
    ///
    /// prompt: dictionary edit nesting and the text typed so far. e.g. "[[DictEdit]] かんが*え 考"
    /// prefix: "▽" "▼" or "JIS "
    /// word: kana or candidate in composition
    /// suffix: okuri and auto start henkan keyword after a candidate
    ///
    pub fn preedit_components(&self) -> (String, String, String, String) {
        let level = self.dict_edit_level();
        let prompt = match self.parent_state() {
            Some(parent) => format!(
                "{}DictEdit{} {} {}",
                "[".repeat(level),
                "]".repeat(level),
                parent.headword(),
                self.current_state().dict_edit_output
            ),
            None => String::new(),
        };
        let candidate = self.candidate_selector.candidate();
        let (prefix, word, suffix) = self
            .current_state()
            .preedit_components(candidate.as_ref());
        (prompt, prefix, word, suffix)
    }

    pub fn preedit(&self) -> String {
        let (prompt, prefix, word, suffix) = self.preedit_components();
        prompt + &prefix + &word + &suffix
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn conversion_mode(&self) -> ConversionMode {
        self.current_state().conversion_mode
    }

    pub fn dict_edit_level(&self) -> usize {
        self.dict_edit_stack.len()
    }

    pub fn current_candidates(&self) -> &[Candidate] {
        self.candidate_selector.candidates()
    }

    /// Candidates on the page listed. Empty while candidates are shown one by one.
    pub fn current_page(&self) -> &[Candidate] {
        self.candidate_selector.page()
    }

    pub fn candidate_index(&self) -> Option<usize> {
        self.candidate_selector.index()
    }

    /// Write the user dictionary if changed.
    pub fn save_dictionaries(&self) -> Result<bool, SkkError> {
        self.user_dictionary.save()
    }

    /// Reload every dictionary. Returns the first error after trying them all.
    pub fn reload_dictionaries(&self) -> Result<(), SkkError> {
        let mut result = Ok(());
        for dictionary in
            std::iter::once(&self.user_dictionary).chain(self.system_dictionaries.iter())
        {
            if let Err(e) = dictionary.reload() {
                warn!("Failed to reload dictionary: {}", e);
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }

    pub fn set_period_style(&mut self, period_style: PeriodStyle) {
        self.rom_kana_converter.set_period_style(period_style);
    }

    pub fn set_comma_style(&mut self, comma_style: CommaStyle) {
        self.rom_kana_converter.set_comma_style(comma_style);
    }

    fn current_state(&self) -> &SkkState {
        self.dict_edit_stack.last().unwrap_or(&self.base_state)
    }

    fn current_state_mut(&mut self) -> &mut SkkState {
        match self.dict_edit_stack.last_mut() {
            Some(state) => state,
            None => &mut self.base_state,
        }
    }

    fn parent_state(&self) -> Option<&SkkState> {
        match self.dict_edit_stack.len() {
            0 => None,
            1 => Some(&self.base_state),
            n => self.dict_edit_stack.get(n - 2),
        }
    }
}

impl Display for SkkContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} level: {} index: {:?} {}",
            self.input_mode,
            self.dict_edit_level(),
            self.candidate_selector.index(),
            self.current_state()
        )
    }
}

fn is_kakutei_key(key: &KeyToken) -> bool {
    key.is_plain(KeySymbol::Return) || key.is_ctrl_char('j')
}

fn is_abort_key(key: &KeyToken) -> bool {
    key.is_ctrl_char('g') || key.is_plain(KeySymbol::Escape)
}

///
/// 区点入力のコード。
/// 4 digits: JIS X 0208 "3021" -> "亜"
/// 6 digits: EUC-JP bytes as is, for JIS X 0212 "8fb0a1"
///
fn kuten_to_string(code: &str) -> Option<String> {
    if code.len() % 2 != 0 {
        return None;
    }
    let bytes = (0..code.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(code.get(i..i + 2)?, 16).ok())
        .collect::<Option<Vec<u8>>>()?;
    let bytes = match bytes.len() {
        2 => bytes.iter().map(|byte| byte | 0x80).collect(),
        3 => bytes,
        _ => return None,
    };
    decode_string(encoding_rs::EUC_JP, &bytes)
}
