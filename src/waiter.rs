//! A monitor-protected mapping that lets one thread block waiting for
//! another thread to `put` a particular key.
//!
//! This generalises the listener bookkeeping in a hand-rolled resolution
//! table: instead of keeping a `Vec` of one-shot channels per key, every
//! waiter blocks on the same `Condvar` and re-checks the map on each wake.
//! Spurious wakeups are tolerated by construction (`Condvar::wait_timeout_while`
//! loops on the predicate itself).

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

pub struct BlockingKeyedWaiter<K, V> {
    map: Mutex<HashMap<K, V>>,
    condvar: Condvar,
}

impl<K, V> BlockingKeyedWaiter<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> BlockingKeyedWaiter<K, V> {
        BlockingKeyedWaiter { map: Mutex::new(HashMap::new()), condvar: Condvar::new() }
    }

    /// Stores `value` under `key` and wakes every thread currently blocked
    /// in `get`.
    pub fn put(&self, key: K, value: V) {
        let mut map = self.map.lock().expect("BlockingKeyedWaiter mutex poisoned");
        map.insert(key, value);
        self.condvar.notify_all();
    }

    /// Blocks until `key` is present or `timeout` elapses, whichever comes
    /// first. Returns the value if it became present in time, `None`
    /// otherwise.
    pub fn get(&self, key: &K, timeout: Duration) -> Option<V> {
        let map = self.map.lock().expect("BlockingKeyedWaiter mutex poisoned");
        let (map, _timeout_result) = self
            .condvar
            .wait_timeout_while(map, timeout, |m| !m.contains_key(key))
            .expect("BlockingKeyedWaiter mutex poisoned");
        map.get(key).cloned()
    }

    /// Non-blocking read, used when the caller already expects the value to
    /// be present (e.g. a resolution cache hit).
    pub fn peek(&self, key: &K) -> Option<V> {
        let map = self.map.lock().expect("BlockingKeyedWaiter mutex poisoned");
        map.get(key).cloned()
    }
}

impl<K, V> Default for BlockingKeyedWaiter<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
