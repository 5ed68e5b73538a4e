//! Renderers for the numeral placeholders "#0" to "#5" in dictionary candidates.

static DIGIT_CHARACTER_ZENKAKU_STRINGS: [&str; 10] =
    ["０", "１", "２", "３", "４", "５", "６", "７", "８", "９"];
static DIGIT_CHARACTER_KANJI_STRINGS: [&str; 10] =
    ["〇", "一", "二", "三", "四", "五", "六", "七", "八", "九"];
static DIGIT_CHARACTER_DAIJI_STRINGS: [&str; 10] =
    ["零", "壱", "弐", "参", "四", "伍", "六", "七", "八", "九"];

static NUMERIC_KURAI_KANJI_STRINGS: [&str; 5] = ["", "万", "億", "兆", "京"];
static NUMERIC_KURAI_DAIJI_STRINGS: [&str; 5] = ["", "萬", "億", "兆", "京"];

// 十, 百, 千
static NUMERIC_KETA_KANJI_STRINGS: [&str; 3] = ["十", "百", "千"];
static NUMERIC_KETA_DAIJI_STRINGS: [&str; 3] = ["拾", "百", "阡"];

const MAX_KETA: usize = 20;

/// Which numeral renderer a "#n" placeholder asks for.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum NumeralForm {
    /// #0 and #4: as typed
    Ascii,
    /// #1: 全角数字
    Zenkaku,
    /// #2: 一二三
    KanjiEach,
    /// #3: 位取りのある漢数字 千二百三十四
    KanjiWithPlace,
    /// #5: 大字 阡弐百参拾四
    Daiji,
}

impl NumeralForm {
    pub(crate) fn from_index(index: char) -> Option<Self> {
        match index {
            '0' | '4' => Some(NumeralForm::Ascii),
            '1' => Some(NumeralForm::Zenkaku),
            '2' => Some(NumeralForm::KanjiEach),
            '3' => Some(NumeralForm::KanjiWithPlace),
            '5' => Some(NumeralForm::Daiji),
            _ => None,
        }
    }

    /// digits: ASCII digit string as typed by the user.
    pub(crate) fn render(&self, digits: &str) -> String {
        match self {
            NumeralForm::Ascii => digits.to_string(),
            NumeralForm::Zenkaku => replace_each_digit(digits, &DIGIT_CHARACTER_ZENKAKU_STRINGS),
            NumeralForm::KanjiEach => replace_each_digit(digits, &DIGIT_CHARACTER_KANJI_STRINGS),
            NumeralForm::KanjiWithPlace => match digits.parse::<u64>() {
                Ok(num) => format_number_with_place(num, false),
                Err(_) => replace_each_digit(digits, &DIGIT_CHARACTER_KANJI_STRINGS),
            },
            NumeralForm::Daiji => match digits.parse::<u64>() {
                Ok(num) => format_number_with_place(num, true),
                Err(_) => replace_each_digit(digits, &DIGIT_CHARACTER_DAIJI_STRINGS),
            },
        }
    }
}

fn replace_each_digit(digits: &str, table: &[&str; 10]) -> String {
    digits
        .chars()
        .map(|c| match c.to_digit(10) {
            Some(d) => table[d as usize].to_string(),
            None => c.to_string(),
        })
        .collect()
}

///
/// 数字を位取りのある漢数字で表記する。
/// daijiがtrueの時は大字を用い、一千,一百,一十のように1を省略しない。
///
fn format_number_with_place(num: u64, daiji: bool) -> String {
    let (digit_strings, keta_strings, kurai_strings) = if daiji {
        (
            &DIGIT_CHARACTER_DAIJI_STRINGS,
            &NUMERIC_KETA_DAIJI_STRINGS,
            &NUMERIC_KURAI_DAIJI_STRINGS,
        )
    } else {
        (
            &DIGIT_CHARACTER_KANJI_STRINGS,
            &NUMERIC_KETA_KANJI_STRINGS,
            &NUMERIC_KURAI_KANJI_STRINGS,
        )
    };

    if num == 0 {
        return digit_strings[0].to_owned();
    }

    let mut current = num;
    let mut keta: [u8; MAX_KETA] = [0; MAX_KETA];
    for i in keta.iter_mut() {
        *i = (current % 10) as u8;
        current /= 10;
    }

    let mut result = String::new();
    for kurai in (0..MAX_KETA / 4).rev() {
        let group = &keta[kurai * 4..kurai * 4 + 4];
        if group.iter().all(|n| *n == 0) {
            continue;
        }
        for position in (1..4).rev() {
            let n = group[position];
            if n != 0 {
                if n != 1 || daiji {
                    result.push_str(digit_strings[n as usize]);
                }
                result.push_str(keta_strings[position - 1]);
            }
        }
        if group[0] != 0 {
            result.push_str(digit_strings[group[0] as usize]);
        }
        result.push_str(kurai_strings[kurai]);
    }
    result
}
