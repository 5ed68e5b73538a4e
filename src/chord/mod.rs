//!
//! Decoder for keys pressed at the same time, as thumb shift keyboards need.
//!
//! The decoder never reads the clock itself. Every call takes `now`, and every [ChordResult] tells how long the
//! caller may wait before it has to call [ChordDisambiguator::dispatch] again to flush expired keys.
//!
//! Key names are the tokens the host uses, with "lshift" and "rshift" for the thumb keys.
//! Outputs are single keys ("k"), a thumb shifted key ("lshift+k"), or a pair of keys in brackets ("[fj]", "[LR]").
//!
pub mod layout;

use crate::error::SkkError;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

const LSHIFT: &str = "lshift";
const RSHIFT: &str = "rshift";
const RELEASE_PREFIX: &str = "release+";
const MAX_PENDING: usize = 3;

/// Timings in milliseconds.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ChordConfig {
    /// A lone key is emitted after this.
    pub timeout_ms: u64,
    /// Two keys pressed within this are a chord.
    pub overlap_ms: u64,
    /// Wait reported when nothing is pending.
    pub maxwait_ms: u64,
    /// Pairs of normal keys, or both thumb keys, that form a chord.
    pub special_doubles: Vec<String>,
}

impl Default for ChordConfig {
    fn default() -> Self {
        ChordConfig {
            timeout_ms: 100,
            overlap_ms: 50,
            maxwait_ms: 10000,
            special_doubles: ["[fj]", "[gh]", "[dk]", "[LR]"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct KeyEvent {
    key: String,
    time: Instant,
}

impl KeyEvent {
    fn is_shift(&self) -> bool {
        self.key == LSHIFT || self.key == RSHIFT
    }
}

/// Keys decided by a dispatch, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordResult {
    pub output: Vec<String>,
    /// Call dispatch again after this even without new keys.
    pub wait: Duration,
}

#[derive(Debug, Clone)]
pub struct ChordDisambiguator {
    timeout: Duration,
    overlap: Duration,
    maxwait: Duration,
    special_doubles: Vec<String>,
    // newest first
    pending: VecDeque<KeyEvent>,
    // decided on queue, handed out by the next dispatch
    ready: Option<ChordResult>,
}

impl ChordDisambiguator {
    /// timeout must be longer than overlap.
    pub fn new(config: &ChordConfig) -> Result<Self, SkkError> {
        if config.timeout_ms <= config.overlap_ms {
            return Err(SkkError::Error(format!(
                "chord timeout {}ms must be longer than overlap {}ms",
                config.timeout_ms, config.overlap_ms
            )));
        }
        Ok(ChordDisambiguator {
            timeout: Duration::from_millis(config.timeout_ms),
            overlap: Duration::from_millis(config.overlap_ms),
            maxwait: Duration::from_millis(config.maxwait_ms),
            special_doubles: config.special_doubles.clone(),
            pending: VecDeque::with_capacity(MAX_PENDING + 1),
            ready: None,
        })
    }

    /// True while some key is waiting to be decided.
    pub fn has_pending(&self) -> bool {
        self.ready.is_some() || !self.pending.is_empty()
    }

    ///
    /// Queue a key press or release.
    ///
    /// Pressing the newest pending key again is a key repeat, decided as that single key right away.
    /// "release+k" while k is the only pending key decides k. Other releases are ignored.
    ///
    pub fn queue(&mut self, key: &str, now: Instant) {
        if let Some(released) = key.strip_prefix(RELEASE_PREFIX) {
            if self.pending.len() == 1 && self.pending[0].key == released {
                self.pending.clear();
                self.ready = Some(self.make_result(vec![released.to_string()], now));
            }
            return;
        }
        if self.pending.front().map(|event| event.key == key) == Some(true) {
            self.pending[0].time = now;
            self.ready = Some(self.make_result(vec![key.to_string()], now));
            return;
        }
        self.pending.push_front(KeyEvent {
            key: key.to_string(),
            time: now,
        });
    }

    /// Queue then dispatch.
    pub fn press(&mut self, key: &str, now: Instant) -> ChordResult {
        self.queue(key, now);
        self.dispatch(now)
    }

    /// Decide what can be decided at `now`.
    pub fn dispatch(&mut self, now: Instant) -> ChordResult {
        if let Some(result) = self.ready.take() {
            return result;
        }

        // abandon events older than the first 3 events
        self.pending.truncate(MAX_PENDING);
        match self.pending.len() {
            3 => self.dispatch_triple(now),
            2 => self.dispatch_double(now),
            1 => self.dispatch_single(now),
            _ => self.make_result(vec![], now),
        }
    }

    // http://nicola.sunicom.co.jp/spec/kikaku.htm#04070402
    // b: newest, s: middle, a: oldest
    fn dispatch_triple(&mut self, now: Instant) -> ChordResult {
        let b = self.pending[0].clone();
        let s = self.pending[1].clone();
        let a = self.pending[2].clone();
        let t1 = s.time.saturating_duration_since(a.time);
        let t2 = b.time.saturating_duration_since(s.time);
        if t1 <= t2 {
            self.pending.truncate(1);
            let mut output = vec![format_double(&s, &a)];
            // b may be expired
            output.extend(self.dispatch_single(now).output);
            self.make_result(output, now)
        } else {
            self.pending.clear();
            self.make_result(vec![a.key, format_double(&s, &b)], now)
        }
    }

    fn dispatch_double(&mut self, now: Instant) -> ChordResult {
        let b = self.pending[0].clone();
        let a = self.pending[1].clone();
        if b.time.saturating_duration_since(a.time) > self.overlap {
            return self.dispatch_older_then_single(a, now);
        }
        if b.is_shift() == a.is_shift() {
            let double = format_double(&b, &a);
            if self.special_doubles.contains(&double) {
                self.pending.clear();
                return self.make_result(vec![double], now);
            }
            return self.dispatch_older_then_single(a, now);
        }
        if now.saturating_duration_since(a.time) > self.timeout {
            self.pending.clear();
            let double = if b.is_shift() {
                format_double(&b, &a)
            } else {
                format_double(&a, &b)
            };
            return self.make_result(vec![double], now);
        }
        self.make_result(vec![], now)
    }

    fn dispatch_older_then_single(&mut self, older: KeyEvent, now: Instant) -> ChordResult {
        self.pending.truncate(1);
        let mut output = vec![older.key];
        // the newer one may be expired
        output.extend(self.dispatch_single(now).output);
        self.make_result(output, now)
    }

    fn dispatch_single(&mut self, now: Instant) -> ChordResult {
        let expired = match self.pending.front() {
            Some(event) if now.saturating_duration_since(event.time) > self.timeout => {
                Some(event.key.to_owned())
            }
            _ => None,
        };
        match expired {
            Some(key) => {
                self.pending.clear();
                self.make_result(vec![key], now)
            }
            None => self.make_result(vec![], now),
        }
    }

    fn make_result(&mut self, output: Vec<String>, now: Instant) -> ChordResult {
        let timeout = self.timeout;
        self.pending
            .retain(|event| now.saturating_duration_since(event.time) <= timeout);
        let wait = match self.pending.back() {
            Some(oldest) => timeout.saturating_sub(now.saturating_duration_since(oldest.time)),
            None => self.maxwait,
        };
        ChordResult { output, wait }
    }
}

fn format_double(a: &KeyEvent, b: &KeyEvent) -> String {
    match (a.is_shift(), b.is_shift()) {
        (true, true) => "[LR]".to_string(),
        (true, false) => format!("{}+{}", a.key, b.key),
        (false, true) => format!("{}+{}", b.key, a.key),
        (false, false) => {
            let mut keys = [a.key.as_str(), b.key.as_str()];
            keys.sort_unstable();
            format!("[{}{}]", keys[0], keys[1])
        }
    }
}
