use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::ziplist::ZipList;

type Key = String;

/// The Store maps keys to lists kept in the compact ziplist encoding. It is shared between
/// connections and cloned cheaply using reference counting; every command runs under one lock, so
/// a list is never observed mid-mutation.
///
/// A list that becomes empty is removed, the same way Redis drops empty lists.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<Mutex<State>>,
}

#[derive(Default)]
pub struct State {
    keys: HashMap<Key, ZipList>,
}

impl Store {
    pub fn new() -> Store {
        Store::default()
    }

    pub fn lock(&self) -> StoreLocked<'_> {
        // A panic while holding the lock leaves at worst a list whose last mutation did not
        // finish; the buffer itself is still owned and valid to drop or overwrite.
        let state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        StoreLocked { state }
    }
}

pub struct StoreLocked<'a> {
    state: MutexGuard<'a, State>,
}

impl<'a> StoreLocked<'a> {
    pub fn get(&self, key: &str) -> Option<&ZipList> {
        self.state.keys.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ZipList> {
        self.state.keys.get_mut(key)
    }

    /// The list at `key`, created empty when missing.
    pub fn list_mut(&mut self, key: &str) -> &mut ZipList {
        self.state.keys.entry(key.to_string()).or_default()
    }

    pub fn set(&mut self, key: String, list: ZipList) {
        self.state.keys.insert(key, list);
    }

    pub fn remove(&mut self, key: &str) -> Option<ZipList> {
        self.state.keys.remove(key)
    }

    /// Drops the list at `key` if it no longer holds any entries.
    pub fn remove_if_empty(&mut self, key: &str) {
        if self.get(key).is_some_and(ZipList::is_empty) {
            self.state.keys.remove(key);
        }
    }

    pub fn exists(&self, key: &str) -> bool {
        self.state.keys.contains_key(key)
    }

    pub fn size(&self) -> usize {
        self.state.keys.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.state.keys.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ZipList)> {
        self.state.keys.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_are_created_on_demand() {
        let store = Store::new();

        {
            let mut state = store.lock();
            state.list_mut("key1").push_tail(b"a").unwrap();
            state.list_mut("key1").push_tail(b"b").unwrap();
        }

        let state = store.lock();
        assert!(state.exists("key1"));
        assert_eq!(state.get("key1").unwrap().len().unwrap(), 2);
        assert_eq!(state.size(), 1);
    }

    #[test]
    fn empty_lists_are_removed() {
        let store = Store::new();
        let mut state = store.lock();

        state.list_mut("key1").push_tail(b"a").unwrap();
        state.remove_if_empty("key1");
        assert!(state.exists("key1"));

        state.get_mut("key1").unwrap().pop_head().unwrap();
        state.remove_if_empty("key1");
        assert!(!state.exists("key1"));
        assert_eq!(state.keys().count(), 0);
    }

    #[test]
    fn clones_share_state() {
        let store = Store::new();
        let other = store.clone();

        store.lock().list_mut("key1").push_head(b"1").unwrap();

        assert!(other.lock().exists("key1"));
        assert!(other.lock().remove("key1").is_some());
        assert!(!store.lock().exists("key1"));
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let store = Store::new();
        store.lock().list_mut("key1").push_head(b"1").unwrap();

        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _state = poisoner.lock();
            panic!("poison the lock");
        })
        .join();

        assert!(store.lock().exists("key1"));
    }
}
