//! Persistent key/value storage collaborator

use std::collections::{BTreeMap, HashMap};

use kiln_primitives::{Address, Word};

/// Word-to-word storage keyed by account
pub trait Storage {
    /// Value at `key`, zero if unset
    fn get(&self, address: &Address, key: &Word) -> Word;

    /// Set `key` to `value`; writing zero clears the slot
    fn set(&mut self, address: Address, key: Word, value: Word);

    /// All non-zero slots of one account, ordered by key
    fn entries(&self, address: &Address) -> BTreeMap<Word, Word>;
}

/// In-memory [`Storage`]
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    accounts: HashMap<Address, BTreeMap<Word, Word>>,
}

impl MemoryStorage {
    /// Create empty storage
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, address: &Address, key: &Word) -> Word {
        self.accounts
            .get(address)
            .and_then(|slots| slots.get(key))
            .copied()
            .unwrap_or_default()
    }

    fn set(&mut self, address: Address, key: Word, value: Word) {
        if value.is_zero() {
            if let Some(slots) = self.accounts.get_mut(&address) {
                slots.remove(&key);
                if slots.is_empty() {
                    self.accounts.remove(&address);
                }
            }
            return;
        }
        self.accounts.entry(address).or_default().insert(key, value);
    }

    fn entries(&self, address: &Address) -> BTreeMap<Word, Word> {
        self.accounts.get(address).cloned().unwrap_or_default()
    }
}
