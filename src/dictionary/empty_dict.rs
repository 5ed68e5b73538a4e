use crate::dictionary::candidate::DictionaryCandidate;
use crate::dictionary::Dictionary;

///
/// Empty dictionary
///
#[derive(Debug, Default)]
pub(crate) struct EmptyDictionary {}

impl Dictionary for EmptyDictionary {
    fn lookup(&mut self, _midasi: &str, _okuri: bool) -> Vec<DictionaryCandidate> {
        vec![]
    }
}
