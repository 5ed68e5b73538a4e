//! NICOLA thumb shift layout for the tokens [super::ChordDisambiguator] outputs.
use std::collections::HashMap;

lazy_static! {
    // key -> [unshifted, right thumb, left thumb]. Empty means nothing assigned.
    static ref NICOLA_RULE: HashMap<&'static str, [&'static str; 3]> = {
        let mut m = HashMap::new();
        m.insert("q", ["。", "", "ぁ"]);
        m.insert("w", ["か", "が", "え"]);
        m.insert("e", ["た", "だ", "り"]);
        m.insert("r", ["こ", "ご", "ゃ"]);
        m.insert("t", ["さ", "ざ", "れ"]);

        m.insert("y", ["ら", "よ", "ぱ"]);
        m.insert("u", ["ち", "に", "ぢ"]);
        m.insert("i", ["く", "る", "ぐ"]);
        m.insert("o", ["つ", "ま", "づ"]);
        m.insert("p", ["，", "ぇ", "ぴ"]);
        m.insert("@", ["、", "", ""]);
        m.insert("[", ["゛", "゜", ""]);

        m.insert("a", ["う", "", "を"]);
        m.insert("s", ["し", "じ", "あ"]);
        m.insert("d", ["て", "で", "な"]);
        m.insert("f", ["け", "げ", "ゅ"]);
        m.insert("g", ["せ", "ぜ", "も"]);

        m.insert("h", ["は", "み", "ば"]);
        m.insert("j", ["と", "お", "ど"]);
        m.insert("k", ["き", "の", "ぎ"]);
        m.insert("l", ["い", "ょ", "ぽ"]);
        m.insert(";", ["ん", "っ", ""]);

        m.insert("z", ["．", "", "ぅ"]);
        m.insert("x", ["ひ", "び", "ー"]);
        m.insert("c", ["す", "ず", "ろ"]);
        m.insert("v", ["ふ", "ぶ", "や"]);
        m.insert("b", ["へ", "べ", "ぃ"]);

        m.insert("n", ["め", "ぬ", "ぷ"]);
        m.insert("m", ["そ", "ゆ", "ぞ"]);
        m.insert(",", ["ね", "む", "ぺ"]);
        m.insert(".", ["ほ", "わ", "ぼ"]);
        m.insert("/", ["・", "ぉ", ""]);

        m.insert("1", ["1", "", "？"]);
        m.insert("2", ["2", "", "／"]);
        m.insert("4", ["4", "", "「"]);
        m.insert("5", ["5", "", "」"]);

        m.insert("6", ["6", "［", ""]);
        m.insert("7", ["7", "］", ""]);
        m.insert("8", ["8", "（", ""]);
        m.insert("9", ["9", "）", ""]);
        m.insert("\\", ["￥", "", ""]);
        m
    };
}

///
/// Kana for a chord token.
/// "k" -> "き", "rshift+k" -> "の", "lshift+k" -> "ぎ".
/// Pairs like "[fj]" and unassigned keys give None.
///
pub fn decode(token: &str) -> Option<&'static str> {
    let (key, index) = if let Some(key) = token.strip_prefix("rshift+") {
        (key, 1)
    } else if let Some(key) = token.strip_prefix("lshift+") {
        (key, 2)
    } else {
        (token, 0)
    };
    NICOLA_RULE
        .get(key)
        .map(|kana| kana[index])
        .filter(|kana| !kana.is_empty())
}
