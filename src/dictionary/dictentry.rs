use crate::dictionary::candidate::{Candidate, DictionaryCandidate};
use crate::dictionary::dictionary_parser::{entry, DictEntryPrototype};
use crate::error::SkkError;
use anyhow::bail;
use nom::Finish;
use regex::{Captures, Regex};
use std::fmt::{Display, Formatter};

/// 辞書の一行分
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DictEntry {
    pub(in crate::dictionary) midasi: String,
    pub(in crate::dictionary) candidates: Vec<DictionaryCandidate>,
}

impl DictEntry {
    /// Entry with a single candidate, for registration of a new word.
    pub(in crate::dictionary) fn new(midasi: &str, candidate: &Candidate) -> Self {
        Self {
            midasi: midasi.to_string(),
            candidates: vec![DictionaryCandidate::from_candidate(candidate)],
        }
    }

    pub(crate) fn from_skkjisyo_line(line: &str) -> Result<Self, SkkError> {
        match entry(line.trim_end()).finish() {
            Ok((_, prototype)) => Ok(DictEntry::from_dict_entry_prototype(prototype)),
            Err(_) => Err(SkkError::ParseError(format!("failed to parse {}", line))),
        }
    }

    fn from_dict_entry_prototype(prototype: DictEntryPrototype) -> Self {
        Self {
            midasi: DictEntry::process_lisp_fun(prototype.midasi),
            candidates: prototype
                .candidates
                .iter()
                .map(DictionaryCandidate::from_candidate_prototype)
                .collect(),
        }
    }

    /// candidateが含まれる場合は先頭に移し、含まれない場合は先頭に追加する。
    /// 他の候補の順序は変えない。
    pub(in crate::dictionary) fn prioritize_candidate(&mut self, candidate: &Candidate) {
        let new_candidate = match self
            .candidates
            .iter()
            .position(|it| it.kouho_text == candidate.kouho_text)
        {
            Some(index) => self.candidates.remove(index),
            None => DictionaryCandidate::from_candidate(candidate),
        };
        self.candidates.insert(0, new_candidate);
    }

    /// Returns true if removed.
    pub(in crate::dictionary) fn remove_matching_candidate(&mut self, candidate: &Candidate) -> bool {
        let before = self.candidates.len();
        self.candidates
            .retain(|it| it.kouho_text != candidate.kouho_text);
        before != self.candidates.len()
    }

    pub(in crate::dictionary) fn get_candidates(&self) -> &[DictionaryCandidate] {
        &self.candidates
    }

    pub(in crate::dictionary) fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    ///
    /// 互換性のためLisp関数を適用する。
    /// 入れ子ではない単項concatのみ、さらに旧辞書に含まれていたoctal形式のみ対応する。
    /// See https://www.gnu.org/software/emacs/manual/html_node/elisp/General-Escape-Syntax.html
    ///
    /// なんらかの理由で変換できなかった場合、元の文字列のまま返す。
    ///
    pub(crate) fn process_lisp_fun(entry: &str) -> String {
        DictEntry::process_lisp_fun_inner(entry).unwrap_or_else(|_| entry.to_owned())
    }

    fn process_lisp_fun_inner(entry: &str) -> anyhow::Result<String> {
        lazy_static! {
            static ref CONCAT_REGEX: Regex = Regex::new(r#"\(concat .*\)"#).unwrap();
            // An octal code followed by [0-7] is closed with a backslash.
            static ref OCTAL_REGEX: Regex = Regex::new(r#"\\[01234567]{1,3}\\?"#).unwrap();
            static ref ESCAPE_REGEX: Regex = Regex::new(r#"\\([^0-7])"#).unwrap();
        }

        let mut replace_string = entry.to_owned();
        for concat_match in CONCAT_REGEX.find_iter(entry) {
            let body = concat_match
                .as_str()
                .trim_start_matches("(concat")
                .trim_start_matches(' ')
                .trim_end_matches(')')
                .trim_end_matches(' ');
            let body = body.strip_prefix('"').unwrap_or(body);
            let body = body.strip_suffix('"').unwrap_or(body);
            if body.is_empty() {
                bail!("regex matched to empty concat.");
            }
            let mut decoded = body.to_owned();
            for octal_match in OCTAL_REGEX.find_iter(body) {
                let octal = octal_match
                    .as_str()
                    .trim_start_matches('\\')
                    .trim_end_matches('\\');
                let num = u32::from_str_radix(octal, 8)?;
                match char::from_u32(num) {
                    Some(ch) => decoded = decoded.replacen(octal_match.as_str(), &ch.to_string(), 1),
                    None => bail!("octal {} is not a char.", octal),
                }
            }
            let decoded = ESCAPE_REGEX
                .replace_all(&decoded, |cap: &Captures| cap[1].to_string())
                .to_string();
            replace_string = replace_string.replacen(concat_match.as_str(), &decoded, 1);
        }

        Ok(replace_string)
    }

    /// escape entry using (concat) if needed
    pub(crate) fn escape_dictionary_string(entry: &str) -> String {
        if entry.contains(';') || entry.contains('/') {
            let escaped = entry
                .replace('"', "\\\"")
                .replace('/', "\\057")
                .replace(';', "\\073");
            return format!(r#"(concat "{}")"#, escaped);
        }

        entry.to_owned()
    }
}

impl Display for DictEntry {
    ///
    /// skk辞書内の一行
    ///
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ", DictEntry::escape_dictionary_string(&self.midasi))?;
        for cand in &self.candidates {
            write!(f, "/{}", cand)?;
        }
        write!(f, "/")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testhelper::init_test_logger;

    const AI: &str = "あい /愛/相/藍/間/合/亜衣;人名/哀;悲哀/埃;(ほこり)塵埃/挨;挨拶/曖;曖昧/瞹;「曖」の異体字/靉/噫;ああ/欸/隘;狭隘/娃/藹;和気藹々/阨;≒隘/穢;(慣用音)/姶;姶良町/会;?/饗;?/";

    fn candidate(midasi: &str, kouho: &str) -> Candidate {
        Candidate::new(
            midasi.to_string(),
            false,
            kouho.to_string(),
            None,
            kouho.to_string(),
        )
    }

    #[test]
    fn split_candidate_okuri_nasi() {
        let result = DictEntry::from_skkjisyo_line(AI).unwrap();
        assert_eq!("あい", result.midasi);
        assert_eq!("愛", result.candidates[0].kouho_text);
        assert_eq!(None, result.candidates[0].annotation);
        assert_eq!("亜衣", result.candidates[5].kouho_text);
        assert_eq!(Some("人名"), result.candidates[5].annotation());
    }

    #[test]
    fn split_candidate_okuri_ari() {
        let result = DictEntry::from_skkjisyo_line("おどr /踊;dance/躍;jump/踴;「踊」の異体字/\n")
            .unwrap();
        assert_eq!("おどr", result.midasi);
        assert_eq!("踊", result.candidates[0].kouho_text);
        assert_eq!(Some("dance"), result.candidates[0].annotation());
        assert_eq!("躍", result.candidates[1].kouho_text);
        assert_eq!(Some("jump"), result.candidates[1].annotation());
    }

    #[test]
    fn split_candidate_with_space_in_annotation() {
        init_test_logger();
        let jisyo = "おくr /送;(send)/贈;(present) 賞を贈る/遅/後;気後れ/遲;「遅」の旧字/";
        let result = DictEntry::from_skkjisyo_line(jisyo).unwrap();
        assert_eq!("送", result.candidates[0].kouho_text);
        assert_eq!("遅", result.candidates[2].kouho_text);
    }

    #[test]
    fn to_string() {
        let dict_entry = DictEntry::from_skkjisyo_line(AI).unwrap();
        assert_eq!(AI, &dict_entry.to_string());
    }

    #[test]
    fn prioritize_keeps_others_in_order() {
        let mut dict_entry = DictEntry::from_skkjisyo_line("あい /愛/相/藍/間/").unwrap();
        dict_entry.prioritize_candidate(&candidate("あい", "藍"));
        assert_eq!("あい /藍/愛/相/間/", dict_entry.to_string());
        dict_entry.prioritize_candidate(&candidate("あい", "哀"));
        assert_eq!("あい /哀/藍/愛/相/間/", dict_entry.to_string());
    }

    #[test]
    fn remove() {
        let mut dict_entry = DictEntry::from_skkjisyo_line(AI).unwrap();
        assert!(dict_entry.remove_matching_candidate(&candidate("あい", "愛")));
        assert_eq!("相", dict_entry.candidates[0].kouho_text);
        assert!(!dict_entry.remove_matching_candidate(&candidate("あい", "愛")));
    }

    #[test]
    fn lisp_entry_slash() {
        let result = DictEntry::process_lisp_fun(r#"(concat "DOS\057V")"#);
        assert_eq!(r#"DOS/V"#, result);
    }

    #[test]
    fn lisp_entry_semicolon() {
        let result = DictEntry::process_lisp_fun(r#"(concat "M\073tG")"#);
        assert_eq!(r#"M;tG"#, result);
    }

    #[test]
    fn lisp_entry_dquote() {
        let result = DictEntry::process_lisp_fun(r#"(concat "\"it\"")"#);
        assert_eq!(r#""it""#, result);
    }

    #[test]
    fn escape_dictionary() {
        assert_eq!("Nothing", DictEntry::escape_dictionary_string("Nothing"));
        assert_eq!(
            r#"(concat "(\073\073\057)")"#,
            DictEntry::escape_dictionary_string("(;;/)")
        );
    }

    #[test]
    fn escaped_candidate_survives_write_and_read() {
        let mut dict_entry = DictEntry::from_skkjisyo_line("でぃーえす /DS/").unwrap();
        dict_entry.prioritize_candidate(&candidate("でぃーえす", "DOS/V"));
        let line = dict_entry.to_string();
        assert_eq!(r#"でぃーえす /(concat "DOS\057V")/DS/"#, line);
        let reread = DictEntry::from_skkjisyo_line(&line).unwrap();
        assert_eq!("DOS/V", reread.candidates[0].kouho_text);
    }
}
