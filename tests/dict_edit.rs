//!
//! 辞書登録モード
//!
extern crate skkcore;

mod utils;

use skkcore::skk_modes::{ConversionMode, InputMode};
use tempfile::tempdir;
use utils::{default_test_context, test_context_with_user_dictionary, transition_check};

#[test]
fn register_word() {
    let mut context = default_test_context();
    transition_check(&mut context, InputMode::Hiragana, "shift+k a p a space", "[DictEdit] かぱ ", "", InputMode::Hiragana);
    assert_eq!(1, context.dict_edit_level());
    transition_check(&mut context, InputMode::Hiragana, "k a", "[DictEdit] かぱ か", "", InputMode::Hiragana);
    transition_check(&mut context, InputMode::Hiragana, "return", "", "か", InputMode::Hiragana);
    assert_eq!(0, context.dict_edit_level());
    assert_eq!(ConversionMode::None, context.conversion_mode());
}

#[test]
fn registered_word_is_first_candidate() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("user.dict");
    let (mut context, user_dictionary) = test_context_with_user_dictionary(path.to_str().unwrap());
    context.press_keys("shift+k a p a space k a p p a return");
    transition_check(&mut context, InputMode::Hiragana, "shift+k a p a space", "▼かっぱ", "", InputMode::Hiragana);
    assert_eq!(1, user_dictionary.lookup("かぱ", false).len());
}

#[test]
fn register_latin() {
    let mut context = default_test_context();
    transition_check(
        &mut context,
        InputMode::Hiragana,
        "shift+k a p a space l shift+x return",
        "",
        "X",
        InputMode::Latin,
    );
}

#[test]
fn register_converted_word() {
    let mut context = default_test_context();
    transition_check(
        &mut context,
        InputMode::Hiragana,
        "shift+k a p a space shift+a i space return",
        "[DictEdit] かぱ 愛",
        "",
        InputMode::Hiragana,
    );
    transition_check(&mut context, InputMode::Hiragana, "shift+a i space ctrl+g", "[DictEdit] かぱ 愛▽あい", "", InputMode::Hiragana);
    transition_check(&mut context, InputMode::Hiragana, "ctrl+j", "[DictEdit] かぱ 愛あい", "", InputMode::Hiragana);
    transition_check(&mut context, InputMode::Hiragana, "ctrl+j", "", "愛あい", InputMode::Hiragana);
}

#[test]
fn register_with_okuri() {
    let mut context = default_test_context();
    transition_check(&mut context, InputMode::Hiragana, "shift+k a shift+k u", "[DictEdit] か*く ", "", InputMode::Hiragana);
    transition_check(&mut context, InputMode::Hiragana, "k a return", "", "かく", InputMode::Hiragana);
}

#[test]
fn register_with_auto_start_keyword() {
    let mut context = default_test_context();
    transition_check(&mut context, InputMode::Hiragana, "shift+k a p a ,", "[DictEdit] かぱ ", "", InputMode::Hiragana);
    transition_check(&mut context, InputMode::Hiragana, "k a return", "", "か、", InputMode::Hiragana);
}

#[test]
fn candidates_exhausted() {
    let mut context = default_test_context();
    transition_check(&mut context, InputMode::Hiragana, "shift+a space space", "▼阿", "", InputMode::Hiragana);
    transition_check(&mut context, InputMode::Hiragana, "space", "[DictEdit] あ ", "", InputMode::Hiragana);
    assert!(context.current_candidates().is_empty());
    transition_check(&mut context, InputMode::Hiragana, "ctrl+g", "▼阿", "", InputMode::Hiragana);
    assert_eq!(2, context.current_candidates().len());
    assert_eq!(Some(1), context.candidate_index());
    transition_check(&mut context, InputMode::Hiragana, "x", "▼亜", "", InputMode::Hiragana);
    transition_check(&mut context, InputMode::Hiragana, "return", "", "亜", InputMode::Hiragana);
}

#[test]
fn candidates_exhausted_then_empty_return() {
    let mut context = default_test_context();
    transition_check(&mut context, InputMode::Hiragana, "shift+a space space space return", "▼阿", "", InputMode::Hiragana);
}

#[test]
fn nested() {
    let mut context = default_test_context();
    context.press_keys("shift+k a p a space shift+k a p a space");
    assert_eq!(2, context.dict_edit_level());
    assert_eq!("[[DictEdit]] かぱ ", context.preedit());
    transition_check(&mut context, InputMode::Hiragana, "k a return", "[DictEdit] かぱ か", "", InputMode::Hiragana);
    assert_eq!(1, context.dict_edit_level());
    transition_check(&mut context, InputMode::Hiragana, "return", "", "か", InputMode::Hiragana);
    assert_eq!(0, context.dict_edit_level());
}

#[test]
fn cancel() {
    let mut context = default_test_context();
    transition_check(&mut context, InputMode::Hiragana, "shift+k a p a space return", "▽かぱ", "", InputMode::Hiragana);
    assert_eq!(0, context.dict_edit_level());
    context.reset();
    transition_check(&mut context, InputMode::Hiragana, "shift+k a p a space k a escape", "▽かぱ", "", InputMode::Hiragana);
    context.reset();
    transition_check(
        &mut context,
        InputMode::Hiragana,
        "shift+k a n g a shift+e space ctrl+g",
        "▼考え",
        "",
        InputMode::Hiragana,
    );
}

#[test]
fn cancel_restores_okuri() {
    let mut context = default_test_context();
    transition_check(&mut context, InputMode::Hiragana, "shift+k a shift+k u ctrl+g", "▽かく", "", InputMode::Hiragana);
    assert_eq!(ConversionMode::Start, context.conversion_mode());
}

#[test]
fn pending_romaji_in_edit() {
    let mut context = default_test_context();
    context.press_keys("shift+k a p a space k");
    assert_eq!("[DictEdit] かぱ k", context.preedit());
    context.press_key("ctrl+g");
    assert_eq!(0, context.dict_edit_level());
    assert_eq!("▽かぱ", context.preedit());
    context.reset();
    transition_check(&mut context, InputMode::Hiragana, "shift+k a p a space k a n return", "", "かん", InputMode::Hiragana);
}

#[test]
fn delete_in_edit_buffer() {
    let mut context = default_test_context();
    context.press_keys("shift+k a p a space k a p a");
    assert_eq!((true, "".to_string()), context.press_key("backspace"));
    assert_eq!("[DictEdit] かぱ か", context.preedit());
    assert_eq!((true, "".to_string()), context.press_key("backspace"));
    assert_eq!("[DictEdit] かぱ ", context.preedit());
    assert_eq!((false, "".to_string()), context.press_key("backspace"));
    assert_eq!(1, context.dict_edit_level());
}

#[test]
fn reset_leaves_edit() {
    let mut context = default_test_context();
    context.press_keys("shift+k a p a space k a");
    context.reset();
    assert_eq!(0, context.dict_edit_level());
    assert_eq!("", context.preedit());
    transition_check(&mut context, InputMode::Hiragana, "a", "", "あ", InputMode::Hiragana);
}

#[test]
fn register_number() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("user.dict");
    let (mut context, user_dictionary) = test_context_with_user_dictionary(path.to_str().unwrap());
    transition_check(&mut context, InputMode::Hiragana, "shift+q 1 k a i space", "[DictEdit] 1かい ", "", InputMode::Hiragana);
    transition_check(&mut context, InputMode::Hiragana, "# 1 k a i", "[DictEdit] 1かい #1かい", "", InputMode::Hiragana);
    transition_check(&mut context, InputMode::Hiragana, "return", "", "１かい", InputMode::Hiragana);
    assert_eq!(1, user_dictionary.lookup("#かい", false).len());
    transition_check(&mut context, InputMode::Hiragana, "shift+q 2 k a i space", "▼２かい", "", InputMode::Hiragana);
    transition_check(&mut context, InputMode::Hiragana, "return", "", "２かい", InputMode::Hiragana);
}

#[test]
fn register_literal_for_number() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("user.dict");
    let (mut context, user_dictionary) = test_context_with_user_dictionary(path.to_str().unwrap());
    context.press_keys("shift+q 3 k a i space");
    transition_check(&mut context, InputMode::Hiragana, "3 k a i return", "", "3かい", InputMode::Hiragana);
    assert_eq!(1, user_dictionary.lookup("3かい", false).len());
    assert!(user_dictionary.lookup("#かい", false).is_empty());
    transition_check(&mut context, InputMode::Hiragana, "shift+q 3 k a i space", "▼3かい", "", InputMode::Hiragana);
    context.reset();
    transition_check(&mut context, InputMode::Hiragana, "shift+q 4 k a i space", "[DictEdit] 4かい ", "", InputMode::Hiragana);
}
