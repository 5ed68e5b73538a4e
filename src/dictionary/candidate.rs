use crate::dictionary::dictentry::DictEntry;
use crate::dictionary::dictionary_parser::CandidatePrototype;
use std::fmt::{Display, Formatter};

/// 候補リストに並ぶ候補。
#[derive(Debug, Clone)]
pub struct Candidate {
    // 数字が#に置きかえられた辞書の見出し語
    pub(crate) midasi: String,
    pub(crate) okuri: bool,
    // Raw kouho_text that might include "#0回" etc
    pub(crate) kouho_text: String,
    pub(crate) annotation: Option<String>,
    // "第#1回" が "第１回" のように後処理されたもの
    pub(crate) output: String,
    pub(crate) persistable: bool,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.midasi == other.midasi
            && self.okuri == other.okuri
            && self.kouho_text == other.kouho_text
    }
}

impl Candidate {
    pub(crate) fn new(
        midasi: String,
        okuri: bool,
        kouho_text: String,
        annotation: Option<String>,
        output: String,
    ) -> Self {
        Candidate {
            midasi,
            okuri,
            kouho_text,
            annotation,
            output,
            persistable: false,
        }
    }

    pub(in crate::dictionary) fn from_dictionary_candidate(
        midasi: &str,
        okuri: bool,
        dictionary_cand: &DictionaryCandidate,
        output: String,
    ) -> Self {
        Candidate::new(
            midasi.to_owned(),
            okuri,
            dictionary_cand.kouho_text.to_owned(),
            dictionary_cand.annotation.to_owned(),
            output,
        )
    }

    /// Text to commit.
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }

    pub fn midasi(&self) -> &str {
        &self.midasi
    }

    pub fn kouho_text(&self) -> &str {
        &self.kouho_text
    }

    pub fn is_okuri(&self) -> bool {
        self.okuri
    }

    /// True when committing this candidate is recorded to the user dictionary.
    pub fn is_persistable(&self) -> bool {
        self.persistable
    }
}

// Candidateの辞書内のデータ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryCandidate {
    pub(in crate::dictionary) kouho_text: String,
    pub(in crate::dictionary) annotation: Option<String>,
}

impl DictionaryCandidate {
    pub(crate) fn new(kouho_text: &str, annotation: Option<&str>) -> Self {
        Self {
            kouho_text: kouho_text.to_owned(),
            annotation: annotation.map(str::to_owned),
        }
    }

    pub(in crate::dictionary) fn from_candidate_prototype(
        candidate_prototype: &CandidatePrototype,
    ) -> Self {
        let kouho_text = DictEntry::process_lisp_fun(candidate_prototype.kouho);
        let annotation = candidate_prototype
            .annotation
            .map(DictEntry::process_lisp_fun);

        Self {
            kouho_text,
            annotation,
        }
    }

    pub(in crate::dictionary) fn from_candidate(candidate: &Candidate) -> Self {
        Self {
            kouho_text: candidate.kouho_text.to_owned(),
            annotation: candidate.annotation.to_owned(),
        }
    }

    pub fn kouho_text(&self) -> &str {
        &self.kouho_text
    }

    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }
}

impl Display for DictionaryCandidate {
    /// 辞書の一行中の "候補;注釈"
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", DictEntry::escape_dictionary_string(&self.kouho_text))?;
        if let Some(annotation) = &self.annotation {
            write!(f, ";{}", DictEntry::escape_dictionary_string(annotation))?;
        }
        Ok(())
    }
}
