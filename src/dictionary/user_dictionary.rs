use crate::dictionary::candidate::{Candidate, DictionaryCandidate};
use crate::dictionary::dictentry::DictEntry;
use crate::dictionary::file_dictionary::{
    decode_string, encode_string, encoding_from_label, DictionaryLoadMode, OKURI_ARI_MARKER,
    OKURI_NASI_MARKER,
};
use crate::dictionary::Dictionary;
use crate::error::SkkError;
use encoding_rs::Encoding;
use log::*;
use regex::Regex;
use std::collections::{BTreeMap, VecDeque};
use std::fs::{rename, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

const HISTORY_CAPACITY: usize = 100;

/// Most recently selected midasi first.
#[derive(Debug, Clone)]
pub(crate) struct SelectionHistory {
    capacity: usize,
    entries: VecDeque<String>,
}

impl SelectionHistory {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, midasi: &str) {
        self.entries.retain(|it| it != midasi);
        self.entries.push_front(midasi.to_owned());
        self.entries.truncate(self.capacity);
    }

    pub(crate) fn complete(&self, prefix: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|it| it.starts_with(prefix) && it.as_str() != prefix)
            .cloned()
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

///
/// User dictionary that can load from file and save entries to file.
///
/// Selecting a candidate moves it to the top of its entry and the midasi to the top of the selection history.
///
#[derive(Debug)]
pub(crate) struct UserDictionary {
    file_path: PathBuf,
    encoding: &'static Encoding,
    // Midasi -> DictEntry map
    okuri_ari_dictionary: BTreeMap<String, DictEntry>,
    okuri_nasi_dictionary: BTreeMap<String, DictEntry>,
    history: SelectionHistory,
    // Just bool, because we know this is under mutex.
    has_change: bool,
    read_only: bool,
}

impl UserDictionary {
    ///
    /// encode: encoding used when the file has no coding cookie, and for a new file.
    /// Fails only on unknown encoding. A corrupt file makes a read only empty dictionary.
    ///
    pub(crate) fn new(file_path: &Path, encode: &str) -> Result<Self, SkkError> {
        let encoding = encoding_from_label(encode)?;
        let mut dictionary = UserDictionary {
            file_path: file_path.to_path_buf(),
            encoding,
            okuri_ari_dictionary: BTreeMap::new(),
            okuri_nasi_dictionary: BTreeMap::new(),
            history: SelectionHistory::new(HISTORY_CAPACITY),
            has_change: false,
            read_only: false,
        };
        dictionary.load();
        Ok(dictionary)
    }

    fn load(&mut self) {
        self.okuri_ari_dictionary.clear();
        self.okuri_nasi_dictionary.clear();
        self.history = SelectionHistory::new(HISTORY_CAPACITY);
        self.has_change = false;
        self.read_only = false;

        let mut bytes = vec![];
        match File::open(&self.file_path) {
            Ok(mut file) => {
                if let Err(e) = file.read_to_end(&mut bytes) {
                    warn!("Failed to read {:?}: {}. Opened read only.", self.file_path, e);
                    self.read_only = true;
                    return;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("New user dictionary {:?}", self.file_path);
                return;
            }
            Err(e) => {
                warn!("Failed to open {:?}: {}. Opened read only.", self.file_path, e);
                self.read_only = true;
                return;
            }
        }

        if let Some(encoding) = coding_cookie(&bytes) {
            self.encoding = encoding;
        }
        let contents = match decode_string(self.encoding, &bytes) {
            Some(contents) => contents,
            None => {
                warn!(
                    "{:?} is not valid {}. Opened read only.",
                    self.file_path,
                    self.encoding.name()
                );
                self.read_only = true;
                return;
            }
        };
        self.load_entries(&contents);
    }

    fn load_entries(&mut self, contents: &str) {
        let mut mode = DictionaryLoadMode::Header;
        let mut nasi_in_file_order = vec![];
        for line in contents.lines() {
            let is_comment = line.starts_with(';');
            if !is_comment && line.trim().is_empty() {
                continue;
            }
            mode = mode.next(is_comment, is_comment && line.contains("okuri-nasi"));
            if is_comment {
                continue;
            }
            let parsed = match DictEntry::from_skkjisyo_line(line) {
                Ok(parsed) => parsed,
                Err(_) => {
                    warn!("Dict is ill formatted. Ignored line {}", line);
                    continue;
                }
            };
            // 送りありの区分でも見た目が送りなしのエントリは送りなしとして扱う
            if mode == DictionaryLoadMode::OkuriAri && looks_okuri_ari(&parsed.midasi) {
                self.okuri_ari_dictionary
                    .insert(parsed.midasi.to_owned(), parsed);
            } else {
                nasi_in_file_order.push(parsed.midasi.to_owned());
                self.okuri_nasi_dictionary
                    .insert(parsed.midasi.to_owned(), parsed);
            }
        }
        for midasi in nasi_in_file_order.iter().rev() {
            self.history.push(midasi);
        }
    }

    fn dictionary_for(&mut self, okuri: bool) -> &mut BTreeMap<String, DictEntry> {
        if okuri {
            &mut self.okuri_ari_dictionary
        } else {
            &mut self.okuri_nasi_dictionary
        }
    }

    /// Whole file in the dictionary encoding. Fails when an entry is not mappable.
    fn encode_all(&self) -> Result<Vec<u8>, SkkError> {
        let mut lines = vec![
            format!(";;; -*- coding: {} -*-", cookie_name(self.encoding)),
            OKURI_ARI_MARKER.to_owned(),
        ];
        lines.extend(
            self.okuri_ari_dictionary
                .values()
                .rev()
                .map(|dict_entry| dict_entry.to_string()),
        );
        lines.push(OKURI_NASI_MARKER.to_owned());
        lines.extend(
            self.okuri_nasi_dictionary
                .values()
                .map(|dict_entry| dict_entry.to_string()),
        );

        let mut encoded = vec![];
        for line in lines {
            encoded.extend(encode_string(self.encoding, &format!("{}\n", line))?);
        }
        Ok(encoded)
    }

    fn write_all(&self, encoded: &[u8]) -> Result<(), SkkError> {
        let dict_file = File::create(&self.file_path)?;
        let mut stream = BufWriter::new(dict_file);
        stream.write_all(encoded)?;
        stream.flush()?;
        Ok(())
    }
}

impl Dictionary for UserDictionary {
    fn lookup(&mut self, midasi: &str, okuri: bool) -> Vec<DictionaryCandidate> {
        self.dictionary_for(okuri)
            .get(midasi)
            .map(|entry| entry.get_candidates().to_vec())
            .unwrap_or_default()
    }

    /// Selection history only.
    fn complete(&mut self, prefix: &str) -> Vec<String> {
        self.history.complete(prefix)
    }

    fn reload(&mut self) -> Result<(), SkkError> {
        self.load();
        Ok(())
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// {file_path}.BAK に退避してからfile_pathに保存する
    /// 辞書ファイルのフォーマットは SKK 16.2 user manual 5.10.7 辞書の書式 に依る
    fn save_dictionary(&mut self) -> Result<bool, SkkError> {
        if !self.has_change || self.read_only {
            return Ok(false);
        }
        // 書けない語があれば元のファイルには触らない
        let encoded = self.encode_all()?;
        if self.file_path.exists() {
            let mut backup = self.file_path.clone().into_os_string();
            backup.push(".BAK");
            rename(&self.file_path, &backup)?;
        }
        self.write_all(&encoded)?;
        self.has_change = false;
        Ok(true)
    }

    fn select_candidate(&mut self, candidate: &Candidate) -> Result<bool, SkkError> {
        if self.read_only {
            return Ok(false);
        }
        debug!("Select midasi: {:?} {:?}", candidate.midasi, candidate.kouho_text);
        let dictionary = self.dictionary_for(candidate.okuri);
        match dictionary.get_mut(&candidate.midasi) {
            Some(dict_entry) => dict_entry.prioritize_candidate(candidate),
            None => {
                dictionary.insert(
                    candidate.midasi.to_owned(),
                    DictEntry::new(&candidate.midasi, candidate),
                );
            }
        }
        if !candidate.okuri {
            self.history.push(&candidate.midasi);
        }
        self.has_change = true;
        Ok(true)
    }

    fn purge_candidate(&mut self, candidate: &Candidate) -> Result<bool, SkkError> {
        if self.read_only {
            return Ok(false);
        }
        let dictionary = self.dictionary_for(candidate.okuri);
        let (removed, now_empty) = match dictionary.get_mut(&candidate.midasi) {
            Some(dict_entry) => (
                dict_entry.remove_matching_candidate(candidate),
                dict_entry.is_empty(),
            ),
            None => (false, false),
        };
        if now_empty {
            dictionary.remove(&candidate.midasi);
        }
        self.has_change |= removed;
        Ok(removed)
    }
}

/// "-*- coding: euc-jp -*-" on the first line
fn coding_cookie(bytes: &[u8]) -> Option<&'static Encoding> {
    lazy_static! {
        static ref COOKIE_REGEX: Regex = Regex::new(r"-\*-.*coding:\s*([\w-]+).*-\*-").unwrap();
    }
    let first_line_end = bytes.iter().position(|b| *b == b'\n').unwrap_or(bytes.len());
    let first_line = String::from_utf8_lossy(&bytes[..first_line_end]);
    let label = COOKIE_REGEX.captures(&first_line)?.get(1)?.as_str().to_owned();
    match encoding_from_label(&label) {
        Ok(encoding) => Some(encoding),
        Err(e) => {
            warn!("Ignored coding cookie: {}", e);
            None
        }
    }
}

fn cookie_name(encoding: &'static Encoding) -> String {
    encoding.name().to_ascii_lowercase()
}

/// "おくr" のように見出し語がかなで始まりアルファベットで終わる
fn looks_okuri_ari(midasi: &str) -> bool {
    let mut chars = midasi.chars();
    match (chars.next(), midasi.chars().last()) {
        (Some(first), Some(last)) => !first.is_ascii_alphabetic() && last.is_ascii_lowercase(),
        _ => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testhelper::init_test_logger;
    use encoding_rs::EUC_JP;
    use std::fs;

    fn candidate(midasi: &str, okuri: bool, kouho: &str) -> Candidate {
        Candidate::new(
            midasi.to_string(),
            okuri,
            kouho.to_string(),
            None,
            kouho.to_string(),
        )
    }

    fn kouho_texts(candidates: Vec<DictionaryCandidate>) -> Vec<String> {
        candidates.into_iter().map(|c| c.kouho_text).collect()
    }

    #[test]
    fn select_save_and_reload() -> Result<(), SkkError> {
        init_test_logger();
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("user.dict");
        let mut user_dictionary = UserDictionary::new(&path, "utf-8")?;
        user_dictionary.select_candidate(&candidate("あい", false, "哀"))?;
        user_dictionary.select_candidate(&candidate("あい", false, "愛"))?;
        user_dictionary.select_candidate(&candidate("あい", false, "哀"))?;
        user_dictionary.select_candidate(&candidate("かんがe", true, "考"))?;
        assert!(user_dictionary.save_dictionary()?);
        assert!(!user_dictionary.save_dictionary()?);

        let saved = fs::read_to_string(&path)?;
        assert_eq!(
            ";;; -*- coding: utf-8 -*-\n;; okuri-ari entries.\nかんがe /考/\n;; okuri-nasi entries.\nあい /哀/愛/\n",
            saved
        );

        let mut reloaded = UserDictionary::new(&path, "euc-jp")?;
        assert_eq!(vec!["哀", "愛"], kouho_texts(reloaded.lookup("あい", false)));
        assert_eq!(vec!["考"], kouho_texts(reloaded.lookup("かんがe", true)));
        assert_eq!(vec!["あい"], reloaded.complete("あ"));
        Ok(())
    }

    #[test]
    fn backup_on_save() -> Result<(), SkkError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("user.dict");
        fs::write(&path, ";; okuri-nasi entries.\nいぬ /犬/\n")?;
        let mut user_dictionary = UserDictionary::new(&path, "utf-8")?;
        user_dictionary.select_candidate(&candidate("ねこ", false, "猫"))?;
        user_dictionary.save_dictionary()?;
        let backup = fs::read_to_string(dir.path().join("user.dict.BAK"))?;
        assert_eq!(";; okuri-nasi entries.\nいぬ /犬/\n", backup);
        Ok(())
    }

    #[test]
    fn unmappable_entry_keeps_file() -> Result<(), SkkError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("user.dict");
        let contents = ";;; -*- coding: euc-jp -*-\n;; okuri-nasi entries.\nいぬ /犬/\n";
        fs::write(&path, encode_string(EUC_JP, contents)?)?;
        let mut user_dictionary = UserDictionary::new(&path, "utf-8")?;
        user_dictionary.select_candidate(&candidate("えもじ", false, "😀"))?;
        assert!(matches!(
            user_dictionary.save_dictionary(),
            Err(SkkError::EncodingError(_))
        ));
        assert!(!dir.path().join("user.dict.BAK").exists());
        let mut reloaded = UserDictionary::new(&path, "utf-8")?;
        assert_eq!(vec!["犬"], kouho_texts(reloaded.lookup("いぬ", false)));

        user_dictionary.purge_candidate(&candidate("えもじ", false, "😀"))?;
        assert!(user_dictionary.save_dictionary()?);
        Ok(())
    }

    #[test]
    fn cookie_selects_encoding() -> Result<(), SkkError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("user.dict");
        let contents = ";;; -*- coding: euc-jp -*-\n;; okuri-nasi entries.\nいぬ /犬/\n";
        fs::write(&path, encode_string(EUC_JP, contents)?)?;
        let mut user_dictionary = UserDictionary::new(&path, "utf-8")?;
        assert!(!user_dictionary.is_read_only());
        assert_eq!(vec!["犬"], kouho_texts(user_dictionary.lookup("いぬ", false)));
        Ok(())
    }

    #[test]
    fn corrupt_file_is_read_only() -> Result<(), SkkError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("user.dict");
        fs::write(&path, [0x3b, 0x3b, 0x0a, 0xff, 0xfe, 0x20, 0x2f, 0x0a])?;
        let mut user_dictionary = UserDictionary::new(&path, "utf-8")?;
        assert!(user_dictionary.is_read_only());
        assert!(!user_dictionary.select_candidate(&candidate("いぬ", false, "犬"))?);
        assert!(!user_dictionary.save_dictionary()?);
        assert!(user_dictionary.lookup("いぬ", false).is_empty());
        Ok(())
    }

    #[test]
    fn purge() -> Result<(), SkkError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("user.dict");
        fs::write(&path, ";; okuri-nasi entries.\nいぬ /犬/戌/\n")?;
        let mut user_dictionary = UserDictionary::new(&path, "utf-8")?;
        assert!(user_dictionary.purge_candidate(&candidate("いぬ", false, "犬"))?);
        assert_eq!(vec!["戌"], kouho_texts(user_dictionary.lookup("いぬ", false)));
        assert!(user_dictionary.purge_candidate(&candidate("いぬ", false, "戌"))?);
        assert!(user_dictionary.lookup("いぬ", false).is_empty());
        assert!(!user_dictionary.purge_candidate(&candidate("いぬ", false, "戌"))?);
        Ok(())
    }

    #[test]
    fn history_is_bounded() {
        let mut history = SelectionHistory::new(3);
        for midasi in ["あ", "あい", "あいう", "あいうえ"] {
            history.push(midasi);
        }
        assert_eq!(3, history.len());
        assert_eq!(vec!["あいうえ", "あいう", "あい"], history.complete("あ"));
        history.push("あい");
        assert_eq!(vec!["あい", "あいうえ", "あいう"], history.complete("あ"));
        assert_eq!(vec!["あいうえ", "あいう"], history.complete("あい"));
    }

    #[test]
    fn okuri_ari_guess() {
        assert!(looks_okuri_ari("おくr"));
        assert!(!looks_okuri_ari("あい"));
        assert!(!looks_okuri_ari("http"));
    }
}
