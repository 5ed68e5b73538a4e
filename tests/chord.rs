extern crate skkcore;

use skkcore::chord::layout::decode;
use skkcore::chord::{ChordConfig, ChordDisambiguator};
use std::time::{Duration, Instant};

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Press keys at the offsets given and collect the kana, flushing at the end.
fn type_nicola(keys: &[(&str, u64)]) -> String {
    let mut chord = ChordDisambiguator::new(&ChordConfig::default()).unwrap();
    let t0 = Instant::now();
    let mut tokens = vec![];
    for (key, offset) in keys {
        tokens.extend(chord.press(key, t0 + ms(*offset)).output);
    }
    let last = keys.last().map(|(_, offset)| *offset).unwrap_or(0);
    tokens.extend(chord.dispatch(t0 + ms(last + 1000)).output);
    assert!(!chord.has_pending());
    tokens.iter().filter_map(|token| decode(token)).collect()
}

#[test]
fn thumb_shifted_kana() {
    assert_eq!(
        "きのぎ",
        type_nicola(&[
            ("k", 0),
            ("rshift", 300),
            ("k", 310),
            ("lshift", 600),
            ("k", 610),
        ])
    );
}

#[test]
fn separate_keys() {
    assert_eq!("はい", type_nicola(&[("h", 0), ("l", 200)]));
}

#[test]
fn key_released_early() {
    let mut chord = ChordDisambiguator::new(&ChordConfig::default()).unwrap();
    let t0 = Instant::now();
    assert!(chord.press("h", t0).output.is_empty());
    assert_eq!(vec!["h"], chord.press("release+h", t0 + ms(20)).output);
    assert!(!chord.has_pending());
}

#[test]
fn special_double_is_not_kana() {
    let mut chord = ChordDisambiguator::new(&ChordConfig::default()).unwrap();
    let t0 = Instant::now();
    chord.press("f", t0);
    let result = chord.press("j", t0 + ms(10));
    assert_eq!(vec!["[fj]"], result.output);
    assert_eq!(None, decode(&result.output[0]));
}

#[test]
fn config_from_toml() {
    let config: ChordConfig = toml::from_str("timeout_ms = 80\noverlap_ms = 80\n").unwrap();
    assert!(ChordDisambiguator::new(&config).is_err());
    let config: ChordConfig = toml::from_str("timeout_ms = 80\n").unwrap();
    assert_eq!(50, config.overlap_ms);
    assert!(ChordDisambiguator::new(&config).is_ok());
}
