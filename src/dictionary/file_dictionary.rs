//! Shared pieces of the file backed dictionaries: encodings and the okuri-ari/okuri-nasi layout.
use crate::error::SkkError;
use encoding_rs::{EncoderResult, Encoding, EUC_JP, ISO_2022_JP, SHIFT_JIS, UTF_8};

const BUF_SIZE: usize = 1024;

pub(in crate::dictionary) const OKURI_ARI_MARKER: &str = ";; okuri-ari entries.";
pub(in crate::dictionary) const OKURI_NASI_MARKER: &str = ";; okuri-nasi entries.";

/// Which part of an SKK-JISYO file a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(in crate::dictionary) enum DictionaryLoadMode {
    /// Leading comments before any entry
    Header,
    OkuriAri,
    OkuriNasi,
}

impl DictionaryLoadMode {
    ///
    /// 次の行の区分。
    /// 先頭のコメントは読み飛ばし、エントリの後の最初のコメント行で送りなしに切りかわる。
    /// ";; okuri-nasi entries." があればその時点で送りなし。
    ///
    pub(in crate::dictionary) fn next(self, is_comment: bool, has_nasi_marker: bool) -> Self {
        match (self, is_comment) {
            (_, true) if has_nasi_marker => DictionaryLoadMode::OkuriNasi,
            (DictionaryLoadMode::OkuriAri, true) => DictionaryLoadMode::OkuriNasi,
            (DictionaryLoadMode::Header, false) => DictionaryLoadMode::OkuriAri,
            (mode, _) => mode,
        }
    }
}

///
/// Encoding from a label.
/// Emacs coding system names such as "euc-japan" and "japanese-shift-jis-unix" are accepted along with the
/// labels encoding_rs knows.
///
pub(crate) fn encoding_from_label(label: &str) -> Result<&'static Encoding, SkkError> {
    let lowered = label.trim().to_ascii_lowercase();
    let name = lowered
        .trim_end_matches("-unix")
        .trim_end_matches("-dos")
        .trim_end_matches("-mac");
    let emacs_alias = match name {
        "euc-japan" | "japanese-iso-8bit" | "euc-jis-2004" | "euc-japan-1990" => Some(EUC_JP),
        "shift-jis" | "japanese-shift-jis" | "sjis" | "cp932" => Some(SHIFT_JIS),
        "junet" | "iso-2022-jp" | "iso-2022-7bit" => Some(ISO_2022_JP),
        "utf-8" | "utf8" | "mule-utf-8" | "prefer-utf-8" => Some(UTF_8),
        _ => None,
    };
    emacs_alias
        .or_else(|| Encoding::for_label_no_replacement(name.as_bytes()))
        .ok_or_else(|| SkkError::EncodingError(format!("Unknown encoding: {}", label)))
}

/// Encode whole string or fail. Unmappable chars are not replaced.
pub(crate) fn encode_string(encoding: &'static Encoding, to_encode: &str) -> Result<Vec<u8>, SkkError> {
    let mut encoder = encoding.new_encoder();
    let mut encoded_vec = Vec::with_capacity(BUF_SIZE);
    let mut source = to_encode;
    let mut tmp_buf = Vec::with_capacity(BUF_SIZE);
    loop {
        let (result, read) =
            encoder.encode_from_utf8_to_vec_without_replacement(source, &mut tmp_buf, true);
        match result {
            EncoderResult::Unmappable(c) => {
                return Err(SkkError::EncodingError(format!(
                    "{} is not mappable in {}",
                    c,
                    encoding.name()
                )));
            }
            EncoderResult::InputEmpty => {
                encoded_vec.append(&mut tmp_buf);
                break;
            }
            EncoderResult::OutputFull => {
                if read == 0 && tmp_buf.is_empty() {
                    tmp_buf.reserve(BUF_SIZE);
                    continue;
                }
                encoded_vec.append(&mut tmp_buf);
                source = &source[read..];
            }
        }
    }
    Ok(encoded_vec)
}

/// None when bytes are malformed in the encoding.
pub(crate) fn decode_string(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|decoded| decoded.into_owned())
}
