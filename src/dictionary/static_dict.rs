use crate::dictionary::candidate::DictionaryCandidate;
use crate::dictionary::dictentry::DictEntry;
use crate::dictionary::file_dictionary::{
    decode_string, encode_string, encoding_from_label, DictionaryLoadMode,
};
use crate::dictionary::Dictionary;
use crate::error::SkkError;
use encoding_rs::Encoding;
use log::*;
use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

///
/// Read only SKK-JISYO file.
///
/// Only the byte offsets of the entries are kept in memory. Lookup is a binary search over the file
/// comparing the encoded midasi, so the file must be sorted in its own encoding:
/// okuri-ari entries in descending order, then okuri-nasi entries in ascending order.
///
#[derive(Debug)]
pub(crate) struct StaticFileDictionary {
    file_path: PathBuf,
    encoding: &'static Encoding,
    file: Option<File>,
    // ascending order of midasi
    okuri_ari_offsets: Vec<u64>,
    okuri_nasi_offsets: Vec<u64>,
    modified: Option<SystemTime>,
}

impl StaticFileDictionary {
    /// Fails only on unknown encoding. A file that can't be read is an empty dictionary.
    pub(crate) fn new(file_path: &Path, encode: &str) -> Result<Self, SkkError> {
        let encoding = encoding_from_label(encode)?;
        let mut dictionary = StaticFileDictionary {
            file_path: file_path.to_path_buf(),
            encoding,
            file: None,
            okuri_ari_offsets: vec![],
            okuri_nasi_offsets: vec![],
            modified: None,
        };
        dictionary.load();
        Ok(dictionary)
    }

    fn load(&mut self) {
        if let Err(e) = self.load_offsets() {
            warn!("Failed to load dictionary {:?}: {}", self.file_path, e);
            self.file = None;
            self.okuri_ari_offsets.clear();
            self.okuri_nasi_offsets.clear();
        }
    }

    fn load_offsets(&mut self) -> Result<(), SkkError> {
        let file = File::open(&self.file_path)?;
        let modified = file.metadata().and_then(|m| m.modified()).ok();
        let mut reader = BufReader::new(file.try_clone()?);
        let mut okuri_ari_offsets = vec![];
        let mut okuri_nasi_offsets = vec![];
        let mut mode = DictionaryLoadMode::Header;
        let mut offset = 0u64;
        let mut line = Vec::new();
        loop {
            line.clear();
            let read = reader.read_until(b'\n', &mut line)?;
            if read == 0 {
                break;
            }
            let line_offset = offset;
            offset += read as u64;
            let is_comment = line.starts_with(b";");
            if !is_comment && line.iter().all(|b| b.is_ascii_whitespace()) {
                continue;
            }
            mode = mode.next(is_comment, is_comment && contains(&line, b"okuri-nasi"));
            if is_comment {
                continue;
            }
            match mode {
                DictionaryLoadMode::OkuriAri => okuri_ari_offsets.push(line_offset),
                DictionaryLoadMode::OkuriNasi => okuri_nasi_offsets.push(line_offset),
                DictionaryLoadMode::Header => {}
            }
        }
        okuri_ari_offsets.reverse();
        debug!(
            "Loaded {:?}: {} okuri-ari, {} okuri-nasi entries",
            self.file_path,
            okuri_ari_offsets.len(),
            okuri_nasi_offsets.len()
        );

        self.file = Some(file);
        self.okuri_ari_offsets = okuri_ari_offsets;
        self.okuri_nasi_offsets = okuri_nasi_offsets;
        self.modified = modified;
        Ok(())
    }

    fn offsets(&self, okuri: bool) -> &[u64] {
        if okuri {
            &self.okuri_ari_offsets
        } else {
            &self.okuri_nasi_offsets
        }
    }

    /// Index of the first entry whose midasi is not less than key, and whether it is an exact match.
    fn lower_bound(&mut self, key: &[u8], okuri: bool) -> Result<(usize, bool), SkkError> {
        let mut low = 0;
        let mut high = self.offsets(okuri).len();
        let mut found = false;
        while low < high {
            let mid = (low + high) / 2;
            let line = self.read_line_at(self.offsets(okuri)[mid])?;
            match midasi_bytes(&line).cmp(key) {
                Ordering::Less => low = mid + 1,
                Ordering::Equal => {
                    found = true;
                    high = mid;
                }
                Ordering::Greater => high = mid,
            }
        }
        Ok((low, found))
    }

    fn read_line_at(&mut self, offset: u64) -> Result<Vec<u8>, SkkError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| SkkError::Error("Dictionary file is not open".to_string()))?;
        file.seek(SeekFrom::Start(offset))?;
        let mut line = Vec::new();
        BufReader::new(file).read_until(b'\n', &mut line)?;
        Ok(line)
    }

    fn lookup_inner(&mut self, midasi: &str, okuri: bool) -> Result<Vec<DictionaryCandidate>, SkkError> {
        if self.file.is_none() {
            return Ok(vec![]);
        }
        let key = encode_string(self.encoding, midasi)?;
        let (index, found) = self.lower_bound(&key, okuri)?;
        if !found {
            return Ok(vec![]);
        }
        let line = self.read_line_at(self.offsets(okuri)[index])?;
        let decoded = decode_string(self.encoding, &line).ok_or_else(|| {
            SkkError::EncodingError(format!("Ill encoded line for {}", midasi))
        })?;
        Ok(DictEntry::from_skkjisyo_line(&decoded)?.candidates)
    }

    fn complete_inner(&mut self, prefix: &str) -> Result<Vec<String>, SkkError> {
        if self.file.is_none() || prefix.is_empty() {
            return Ok(vec![]);
        }
        let key = encode_string(self.encoding, prefix)?;
        let (mut index, _) = self.lower_bound(&key, false)?;
        let mut result = vec![];
        while index < self.okuri_nasi_offsets.len() {
            let line = self.read_line_at(self.okuri_nasi_offsets[index])?;
            let word = midasi_bytes(&line);
            if !word.starts_with(&key) {
                break;
            }
            if word != key.as_slice() {
                if let Some(decoded) = decode_string(self.encoding, word) {
                    result.push(decoded);
                }
            }
            index += 1;
        }
        Ok(result)
    }
}

impl Dictionary for StaticFileDictionary {
    fn lookup(&mut self, midasi: &str, okuri: bool) -> Vec<DictionaryCandidate> {
        self.lookup_inner(midasi, okuri).unwrap_or_else(|e| {
            warn!("Lookup of {} in {:?} failed: {}", midasi, self.file_path, e);
            vec![]
        })
    }

    fn complete(&mut self, prefix: &str) -> Vec<String> {
        self.complete_inner(prefix).unwrap_or_else(|e| {
            warn!("Completion of {} in {:?} failed: {}", prefix, self.file_path, e);
            vec![]
        })
    }

    /// Reload only when the file is newer than the loaded one.
    fn reload(&mut self) -> Result<(), SkkError> {
        let modified = std::fs::metadata(&self.file_path)
            .and_then(|m| m.modified())
            .ok();
        let is_newer = match (self.modified, modified) {
            (Some(loaded), Some(current)) => current > loaded,
            (None, Some(_)) => true,
            _ => false,
        };
        if is_newer || self.file.is_none() {
            self.load();
        }
        Ok(())
    }
}

fn midasi_bytes(line: &[u8]) -> &[u8] {
    match line.iter().position(|b| *b == b' ') {
        Some(space) => &line[..space],
        None => line,
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testhelper::init_test_logger;
    use std::io::Write;

    fn write_dictionary(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn kouho_texts(candidates: Vec<DictionaryCandidate>) -> Vec<String> {
        candidates.into_iter().map(|c| c.kouho_text).collect()
    }

    const SMALL: &str = ";; -*- coding: utf-8 -*-
;; okuri-ari entries.
わすr /忘/
かんがe /考/勘/
;; okuri-nasi entries.
あ /亜/阿/
あい /愛/哀/
あいさつ /挨拶/
あいだ /間/
かんじ /漢字/感じ/
";

    #[test]
    fn lookup() {
        init_test_logger();
        let file = write_dictionary(SMALL);
        let mut dictionary = StaticFileDictionary::new(file.path(), "utf-8").unwrap();
        assert_eq!(vec!["愛", "哀"], kouho_texts(dictionary.lookup("あい", false)));
        assert_eq!(vec!["亜", "阿"], kouho_texts(dictionary.lookup("あ", false)));
        assert_eq!(vec!["漢字", "感じ"], kouho_texts(dictionary.lookup("かんじ", false)));
        assert_eq!(vec!["考", "勘"], kouho_texts(dictionary.lookup("かんがe", true)));
        assert_eq!(vec!["忘"], kouho_texts(dictionary.lookup("わすr", true)));
        assert!(dictionary.lookup("かんがe", false).is_empty());
        assert!(dictionary.lookup("いぬ", false).is_empty());
    }

    #[test]
    fn complete() {
        let file = write_dictionary(SMALL);
        let mut dictionary = StaticFileDictionary::new(file.path(), "utf-8").unwrap();
        assert_eq!(vec!["あいさつ", "あいだ"], dictionary.complete("あい"));
        assert_eq!(vec!["あい", "あいさつ", "あいだ"], dictionary.complete("あ"));
        assert!(dictionary.complete("ん").is_empty());
    }

    #[test]
    fn missing_file_is_empty() {
        let mut dictionary =
            StaticFileDictionary::new(Path::new("/nonexistent/SKK-JISYO.X"), "euc-jp").unwrap();
        assert!(dictionary.lookup("あい", false).is_empty());
        assert!(dictionary.reload().is_ok());
    }

    #[test]
    fn unknown_encoding() {
        assert!(StaticFileDictionary::new(Path::new("/nonexistent"), "klingon").is_err());
    }

    #[test]
    fn separator_comment_without_marker() {
        let file = write_dictionary(";; header\nわすr /忘/\n;\nあい /愛/\n");
        let mut dictionary = StaticFileDictionary::new(file.path(), "utf-8").unwrap();
        assert_eq!(vec!["忘"], kouho_texts(dictionary.lookup("わすr", true)));
        assert_eq!(vec!["愛"], kouho_texts(dictionary.lookup("あい", false)));
    }
}
