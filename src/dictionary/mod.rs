pub(crate) mod candidate;
pub(crate) mod dictentry;
mod dictionary_parser;
pub(crate) mod empty_dict;
pub(crate) mod file_dictionary;
pub(crate) mod server_dict;
pub(crate) mod static_dict;
pub(crate) mod user_dictionary;

pub use candidate::{Candidate, DictionaryCandidate};

use crate::error::SkkError;
use crate::form_changer::NumeralForm;
use empty_dict::EmptyDictionary;
use log::*;
use regex::Regex;
use server_dict::ServerDictionary;
use static_dict::StaticFileDictionary;
use std::path::Path;
use std::sync::{Arc, Mutex};
use user_dictionary::UserDictionary;

/// Operations every dictionary backend supports.
pub(crate) trait Dictionary {
    /// midasiに完全一致するエントリの候補。見つからない場合やエラーの場合は空。
    fn lookup(&mut self, midasi: &str, okuri: bool) -> Vec<DictionaryCandidate>;

    ///
    /// prefixから始まる送りなしの見出し語。prefix自身は含まない。
    /// e.g.
    /// complete("あい") -> ["あいさつ", "あいだ"]
    ///
    fn complete(&mut self, _prefix: &str) -> Vec<String> {
        vec![]
    }

    fn reload(&mut self) -> Result<(), SkkError> {
        Ok(())
    }

    fn is_read_only(&self) -> bool {
        true
    }

    /// Returns true if saved, false if kindly ignored.
    /// Safe to call to read_only dictionary.
    fn save_dictionary(&mut self) -> Result<bool, SkkError> {
        Ok(false)
    }

    /// Select that candidate.
    /// Supporting dictionary will add and move that candidate to the first place so that next time it comes to candidate early.
    /// Safe to call to read_only dictionary.
    fn select_candidate(&mut self, _candidate: &Candidate) -> Result<bool, SkkError> {
        Ok(false)
    }

    /// Remove that candidate if dictionary supports editing.
    /// Safe to call to read_only dictionary
    fn purge_candidate(&mut self, _candidate: &Candidate) -> Result<bool, SkkError> {
        Ok(false)
    }
}

#[derive(Debug)]
pub(crate) enum SkkDictionaryType {
    StaticFile(StaticFileDictionary),
    UserFile(UserDictionary),
    Server(ServerDictionary),
    Empty(EmptyDictionary),
}

impl SkkDictionaryType {
    fn as_dictionary(&mut self) -> &mut dyn Dictionary {
        match self {
            SkkDictionaryType::StaticFile(dict) => dict,
            SkkDictionaryType::UserFile(dict) => dict,
            SkkDictionaryType::Server(dict) => dict,
            SkkDictionaryType::Empty(dict) => dict,
        }
    }
}

///
/// A dictionary shareable between contexts as `Arc<SkkDictionary>`.
///
#[derive(Debug)]
pub struct SkkDictionary {
    mutex: Mutex<SkkDictionaryType>,
}

impl SkkDictionary {
    fn from_type(dictionary: SkkDictionaryType) -> Self {
        Self {
            mutex: Mutex::new(dictionary),
        }
    }

    ///
    /// Read only SKK-JISYO file. `encode` is a label such as "euc-jp" or "utf-8".
    /// Errors only on an unknown encoding. Unreadable files give an empty dictionary.
    ///
    pub fn new_static_dict(file_path: &str, encode: &str) -> Result<Self, SkkError> {
        let dictionary = StaticFileDictionary::new(Path::new(file_path), encode)?;
        Ok(Self::from_type(SkkDictionaryType::StaticFile(dictionary)))
    }

    /// Writable dictionary. A corrupt file opens as read only.
    pub fn new_user_dict(file_path: &str, encode: &str) -> Result<Self, SkkError> {
        let dictionary = UserDictionary::new(Path::new(file_path), encode)?;
        Ok(Self::from_type(SkkDictionaryType::UserFile(dictionary)))
    }

    /// skkserv at host:port.
    pub fn new_server_dict(host: &str, port: u16, encode: &str) -> Result<Self, SkkError> {
        let dictionary = ServerDictionary::new(host, port, encode)?;
        Ok(Self::from_type(SkkDictionaryType::Server(dictionary)))
    }

    pub fn new_empty_dict() -> Self {
        Self::from_type(SkkDictionaryType::Empty(EmptyDictionary::default()))
    }

    fn with_dictionary<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut dyn Dictionary) -> R,
    {
        // A panic while holding the lock leaves the dictionary itself consistent enough to keep using.
        let mut guard = self
            .mutex
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(guard.as_dictionary())
    }

    pub fn lookup(&self, midasi: &str, okuri: bool) -> Vec<DictionaryCandidate> {
        self.with_dictionary(|dict| dict.lookup(midasi, okuri))
    }

    pub fn complete(&self, prefix: &str) -> Vec<String> {
        self.with_dictionary(|dict| dict.complete(prefix))
    }

    pub fn reload(&self) -> Result<(), SkkError> {
        self.with_dictionary(|dict| dict.reload())
    }

    pub fn is_read_only(&self) -> bool {
        self.with_dictionary(|dict| dict.is_read_only())
    }

    /// Returns true if written.
    pub fn save(&self) -> Result<bool, SkkError> {
        self.with_dictionary(|dict| dict.save_dictionary())
    }

    pub(crate) fn select_candidate(&self, candidate: &Candidate) -> Result<bool, SkkError> {
        self.with_dictionary(|dict| dict.select_candidate(candidate))
    }

    pub(crate) fn purge_candidate(&self, candidate: &Candidate) -> Result<bool, SkkError> {
        self.with_dictionary(|dict| dict.purge_candidate(candidate))
    }
}

/// confirm the candidate.
/// This updates the user dictionary candidate order or adds the new entry.
/// Returns true if updated the dictionary.
pub(crate) fn confirm_candidate(
    user_dictionary: &SkkDictionary,
    candidate: &Candidate,
) -> Result<bool, SkkError> {
    debug!("confirm: {:?}", candidate);
    user_dictionary.select_candidate(candidate)
}

/// purge the candidate from the user dictionary.
pub(crate) fn purge_candidate(
    user_dictionary: &SkkDictionary,
    candidate: &Candidate,
) -> Result<bool, SkkError> {
    debug!("purge: {:?}", candidate);
    user_dictionary.purge_candidate(candidate)
}

lazy_static! {
    static ref NUM_REGEX: Regex = Regex::new(r"[0-9]+").unwrap();
    static ref NUMERIC_ENTRY_REGEX: Regex = Regex::new(r"#([0-9])").unwrap();
}

///
/// ユーザー辞書の候補、続いてシステム辞書の候補を辞書の順に並べる。
/// Dedupは数字を置きかえた後のoutputで、先に出た候補が残る。
/// 見出し語に数字が含まれていた場合はそのままの見出し語、続いて#に置きかえた見出し語で引き、
/// 後者の候補の#0から#5を数字で置きかえる。
///
pub(crate) fn get_all_candidates(
    user_dictionary: &SkkDictionary,
    system_dictionaries: &[Arc<SkkDictionary>],
    midasi: &str,
    okuri: bool,
) -> Vec<Candidate> {
    let (dict_key, numbers) = to_numeric_dict_key(midasi);
    let lookup = |dictionary: &SkkDictionary| -> Vec<Candidate> {
        let mut candidates = vec![];
        if !numbers.is_empty() {
            candidates.extend(dictionary.lookup(midasi, okuri).iter().map(|dict_cand| {
                Candidate::from_dictionary_candidate(
                    midasi,
                    okuri,
                    dict_cand,
                    dict_cand.kouho_text.to_owned(),
                )
            }));
        }
        candidates.extend(
            dictionary
                .lookup(&dict_key, okuri)
                .iter()
                .filter_map(|dict_cand| {
                    let output = if numbers.is_empty() {
                        dict_cand.kouho_text.to_owned()
                    } else {
                        replace_numeric_string(&dict_cand.kouho_text, &numbers)?
                    };
                    Some(Candidate::from_dictionary_candidate(
                        &dict_key, okuri, dict_cand, output,
                    ))
                }),
        );
        candidates
    };

    let mut result = merge_candidates(vec![], lookup(user_dictionary));
    for system_dictionary in system_dictionaries {
        result = merge_candidates(result, lookup(system_dictionary));
    }
    result
}

/// Candidates already in the list first, then the new ones whose output is not in the list yet.
pub(crate) fn merge_candidates(mut user: Vec<Candidate>, system: Vec<Candidate>) -> Vec<Candidate> {
    for candidate in system {
        if !user.iter().any(|it| it.output == candidate.output) {
            user.push(candidate);
        }
    }
    user
}

///
/// 辞書登録で入力された語の登録先の見出し語と確定する文字列。
/// 語が#1のような数字変換を含む時だけ#の見出し語に登録し、確定する文字列は数字で置きかえる。
/// それ以外は見出し語そのままに登録する。
///
pub(crate) fn registration(midasi: &str, word: &str) -> (String, String) {
    let (dict_key, numbers) = to_numeric_dict_key(midasi);
    if numbers.is_empty() || !NUMERIC_ENTRY_REGEX.is_match(word) {
        return (midasi.to_owned(), word.to_owned());
    }
    match replace_numeric_string(word, &numbers) {
        Some(output) => (dict_key, output),
        None => (midasi.to_owned(), word.to_owned()),
    }
}

/// ユーザー辞書の選択履歴、続いてシステム辞書から補完候補を集める。
pub(crate) fn complete(
    user_dictionary: &SkkDictionary,
    system_dictionaries: &[Arc<SkkDictionary>],
    prefix: &str,
) -> Vec<String> {
    let mut result: Vec<String> = vec![];
    let completions = std::iter::once(user_dictionary.complete(prefix)).chain(
        system_dictionaries
            .iter()
            .map(|dictionary| dictionary.complete(prefix)),
    );
    for word in completions.flatten() {
        if word != prefix && !result.contains(&word) {
            result.push(word);
        }
    }
    result
}

///
/// 数字が含まれていた場合#に置きかえて数字と共にかえす。
/// 12がつ6にち -> (#がつ#にち, [12,6])
///
pub(crate) fn to_numeric_dict_key(midasi: &str) -> (String, Vec<String>) {
    let numbers = NUM_REGEX
        .find_iter(midasi)
        .map(|m| m.as_str().to_owned())
        .collect();
    (NUM_REGEX.replace_all(midasi, "#").into_owned(), numbers)
}

/// "#1月" -> "１２月" for ["12"]. None when the placeholders are more than the numbers or unknown.
pub(crate) fn replace_numeric_string(kouho_text: &str, numbers: &[String]) -> Option<String> {
    let mut result = String::new();
    let mut last = 0;
    for (n, captures) in NUMERIC_ENTRY_REGEX.captures_iter(kouho_text).enumerate() {
        let whole = captures.get(0)?;
        let form = NumeralForm::from_index(captures[1].chars().next()?)?;
        let number = numbers.get(n)?;
        result.push_str(&kouho_text[last..whole.start()]);
        result.push_str(&form.render(number));
        last = whole.end();
    }
    result.push_str(&kouho_text[last..]);
    Some(result)
}
