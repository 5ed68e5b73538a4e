#![allow(dead_code)]

use skkcore::dictionary::SkkDictionary;
use skkcore::skk_modes::InputMode;
use skkcore::SkkContext;
use std::io::Write;
use std::sync::{Arc, Once};
use tempfile::NamedTempFile;

static INIT_SYNC: Once = Once::new();

pub fn init_test_logger() {
    INIT_SYNC.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub fn transition_check(
    context: &mut SkkContext,
    initial_input_mode: InputMode,
    key_inputs: &str,
    expected_preedit: &str,
    expected_output: &str,
    expected_input_mode: InputMode,
) {
    context.activate_input_mode(initial_input_mode);
    let output = context.press_keys(key_inputs);
    let preedit = context.preedit();
    let input_mode = context.input_mode();
    assert_eq!(
        output, expected_output,
        "(output == expected) failed for '{}'",
        key_inputs
    );
    assert_eq!(
        preedit, expected_preedit,
        "(preedit == expected) failed for '{}'",
        key_inputs
    );
    assert_eq!(
        input_mode, expected_input_mode,
        "(input_mode == expected) failed for '{}'",
        key_inputs
    );
}

pub fn system_dictionary() -> Arc<SkkDictionary> {
    Arc::new(SkkDictionary::new_static_dict("tests/data/SKK-JISYO.S", "euc-jp").unwrap())
}

/// Context on the small test dictionary with an empty user dictionary in memory only.
pub fn default_test_context() -> SkkContext {
    init_test_logger();
    SkkContext::new(
        Arc::new(SkkDictionary::new_empty_dict()),
        vec![system_dictionary()],
    )
    .unwrap()
}

/// Context with a user dictionary at the path given.
pub fn test_context_with_user_dictionary(path: &str) -> (SkkContext, Arc<SkkDictionary>) {
    init_test_logger();
    let user_dictionary = Arc::new(SkkDictionary::new_user_dict(path, "utf-8").unwrap());
    let context = SkkContext::new(user_dictionary.clone(), vec![system_dictionary()]).unwrap();
    (context, user_dictionary)
}

pub fn make_temp_file(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents).unwrap();
    file.flush().unwrap();
    file
}
