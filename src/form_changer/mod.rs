pub(crate) mod ascii_form_changer;
pub(crate) mod kana_form_changer;
pub(crate) mod numeric_form_changer;
pub(crate) use ascii_form_changer::AsciiFormChanger;
pub(crate) use kana_form_changer::KanaFormChanger;
pub(crate) use numeric_form_changer::NumeralForm;
