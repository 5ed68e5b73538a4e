use crate::error::SkkError;
use std::fmt::Display;
use std::str::FromStr;

/// SKKの入力モード
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Deserialize, Serialize, Display)]
pub enum InputMode {
    // かなモード
    Hiragana,
    // カナモード
    Katakana,
    // JIS X 0201 カナ
    HalfWidthKatakana,
    // アスキーモード
    Latin,
    // 全英モード
    WideLatin,
}

impl Default for InputMode {
    fn default() -> Self {
        InputMode::Hiragana
    }
}

impl InputMode {
    /// Modes whose letters go through the romaji to kana conversion.
    pub fn is_kana(&self) -> bool {
        matches!(
            self,
            InputMode::Hiragana | InputMode::Katakana | InputMode::HalfWidthKatakana
        )
    }
}

impl FromStr for InputMode {
    type Err = SkkError;

    fn from_str(s: &str) -> Result<InputMode, SkkError> {
        match s {
            "Hiragana" => Ok(InputMode::Hiragana),
            "Katakana" => Ok(InputMode::Katakana),
            "HalfWidthKatakana" => Ok(InputMode::HalfWidthKatakana),
            "Latin" => Ok(InputMode::Latin),
            "WideLatin" => Ok(InputMode::WideLatin),
            s => Err(SkkError::ParseError(s.to_string())),
        }
    }
}

/// SKKの変換モード
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Deserialize, Serialize, Display)]
pub enum ConversionMode {
    // ■モード
    None,
    // ▽モード
    Start,
    // ▼モード
    Select,
}

impl Default for ConversionMode {
    fn default() -> Self {
        ConversionMode::None
    }
}

impl FromStr for ConversionMode {
    type Err = SkkError;

    fn from_str(s: &str) -> Result<ConversionMode, SkkError> {
        match s {
            "None" => Ok(ConversionMode::None),
            "Start" => Ok(ConversionMode::Start),
            "Select" => Ok(ConversionMode::Select),
            s => Err(SkkError::ParseError(s.to_string())),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
pub enum PeriodStyle {
    /// Use "。"  for "."
    PeriodJa,
    /// Use "．"  for "."
    PeriodEn,
}

impl PeriodStyle {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            PeriodStyle::PeriodJa => "。",
            PeriodStyle::PeriodEn => "．",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
pub enum CommaStyle {
    /// Use "、" for ","
    CommaJa,
    /// Use "，" for ","
    CommaEn,
}

impl CommaStyle {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            CommaStyle::CommaJa => "、",
            CommaStyle::CommaEn => "，",
        }
    }
}
