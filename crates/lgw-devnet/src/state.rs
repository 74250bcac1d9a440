use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Version of a key: the block that last wrote it.
pub type Version = u64;

#[derive(Clone, Debug, PartialEq, Eq)]
struct Entry {
    value: Vec<u8>,
    version: Version,
}

/// Committed key/value state of the channel.
#[derive(Clone, Debug, Default)]
pub struct WorldState {
    entries: BTreeMap<String, Entry>,
}

impl WorldState {
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(|e| e.value.as_slice())
    }

    pub fn version(&self, key: &str) -> Option<Version> {
        self.entries.get(key).map(|e| e.version)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether every key the transaction read is still at the version it
    /// saw.
    pub fn validate(&self, rw: &RwSet) -> bool {
        rw.reads
            .iter()
            .all(|(key, seen)| self.version(key) == *seen)
    }

    pub fn apply(&mut self, rw: &RwSet, version: Version) {
        for (key, write) in &rw.writes {
            match write {
                Some(value) => {
                    self.entries.insert(
                        key.clone(),
                        Entry {
                            value: value.clone(),
                            version,
                        },
                    );
                }
                None => {
                    self.entries.remove(key);
                }
            }
        }
    }
}

/// Keys a simulated transaction read (with the versions seen) and wrote.
/// A `None` write deletes the key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RwSet {
    pub reads: BTreeMap<String, Option<Version>>,
    pub writes: BTreeMap<String, Option<Vec<u8>>>,
}

impl RwSet {
    pub fn is_read_only(&self) -> bool {
        self.writes.is_empty()
    }
}

/// State access for a contract function during simulation.
///
/// Reads go to committed state and are recorded once; reads of a key the
/// transaction already wrote see the pending write. Nothing touches the
/// world state until the read/write set is validated at commit.
pub struct TxContext<'a> {
    state: &'a WorldState,
    rw: RwSet,
}

impl<'a> TxContext<'a> {
    pub fn new(state: &'a WorldState) -> Self {
        Self {
            state,
            rw: RwSet::default(),
        }
    }

    pub fn get_state(&mut self, key: &str) -> Option<Vec<u8>> {
        if let Some(pending) = self.rw.writes.get(key) {
            return pending.clone();
        }
        let version = self.state.version(key);
        self.rw.reads.entry(key.to_string()).or_insert(version);
        self.state.get(key).map(<[u8]>::to_vec)
    }

    pub fn put_state(&mut self, key: &str, value: Vec<u8>) {
        self.rw.writes.insert(key.to_string(), Some(value));
    }

    pub fn del_state(&mut self, key: &str) {
        self.rw.writes.insert(key.to_string(), None);
    }

    /// Every committed key/value pair in key order, recording each read.
    pub fn all_states(&mut self) -> Vec<(String, Vec<u8>)> {
        let state = self.state;
        state
            .entries
            .iter()
            .map(|(key, entry)| {
                self.rw
                    .reads
                    .entry(key.clone())
                    .or_insert(Some(entry.version));
                (key.clone(), entry.value.clone())
            })
            .collect()
    }

    pub fn into_rw_set(self) -> RwSet {
        self.rw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn committed(pairs: &[(&str, &str)], version: Version) -> WorldState {
        let mut state = WorldState::default();
        let empty = WorldState::default();
        let mut ctx = TxContext::new(&empty);
        for (k, v) in pairs {
            ctx.put_state(k, v.as_bytes().to_vec());
        }
        state.apply(&ctx.into_rw_set(), version);
        state
    }

    #[test]
    fn reads_record_versions_and_see_own_writes() {
        let state = committed(&[("asset1", "v1")], 1);
        let mut ctx = TxContext::new(&state);
        assert_eq!(ctx.get_state("asset1").unwrap(), b"v1");
        assert_eq!(ctx.get_state("missing"), None);
        ctx.put_state("asset2", b"new".to_vec());
        assert_eq!(ctx.get_state("asset2").unwrap(), b"new");
        ctx.del_state("asset1");
        assert_eq!(ctx.get_state("asset1"), None);

        let rw = ctx.into_rw_set();
        assert_eq!(rw.reads.get("asset1"), Some(&Some(1)));
        assert_eq!(rw.reads.get("missing"), Some(&None));
        assert!(!rw.reads.contains_key("asset2"));
        assert_eq!(rw.writes.get("asset1"), Some(&None));
    }

    #[test]
    fn stale_read_fails_validation() {
        let mut state = committed(&[("asset1", "v1")], 1);
        let mut first = TxContext::new(&state);
        first.get_state("asset1");
        first.put_state("asset1", b"a".to_vec());
        let first = first.into_rw_set();

        let mut second = TxContext::new(&state);
        second.get_state("asset1");
        second.put_state("asset1", b"b".to_vec());
        let second = second.into_rw_set();

        assert!(state.validate(&first));
        state.apply(&first, 2);
        assert!(!state.validate(&second));
        assert_eq!(state.get("asset1").unwrap(), b"a");
        assert_eq!(state.version("asset1"), Some(2));
    }

    #[test]
    fn creating_an_existing_key_conflicts() {
        let empty = WorldState::default();
        let mut ctx = TxContext::new(&empty);
        assert!(ctx.get_state("asset9").is_none());
        ctx.put_state("asset9", b"x".to_vec());
        let rw = ctx.into_rw_set();

        let state = committed(&[("asset9", "y")], 3);
        assert!(!state.validate(&rw));
    }

    #[test]
    fn all_states_in_key_order() {
        let state = committed(&[("b", "2"), ("a", "1")], 1);
        let mut ctx = TxContext::new(&state);
        let keys: Vec<_> = ctx.all_states().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert!(ctx.into_rw_set().is_read_only());
    }
}
