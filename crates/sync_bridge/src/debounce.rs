//! Keyed trailing-edge debounce.
//!
//! One timer per key: every [`KeyedDebounce::arm`] call restarts that key's
//! delay, and the value fires once the key has been quiet for the full delay.
//! Values for the same key are replaced (or merged via
//! [`KeyedDebounce::arm_merge`]) while pending, so a burst of updates
//! collapses into one emission carrying the final value.

use std::collections::HashMap;
use std::hash::Hash;

/// Per-key trailing-edge debouncer, polled with the host clock.
#[derive(Debug, Clone)]
pub struct KeyedDebounce<K, V> {
    delay_ms: u64,
    pending: HashMap<K, (u64, V)>,
}

impl<K: Eq + Hash + Ord + Clone, V> KeyedDebounce<K, V> {
    /// Creates a debouncer where each key fires `delay_ms` after its last arm.
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: HashMap::new(),
        }
    }

    /// Returns `true` when no key is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Arms (or re-arms) `key` with `value`, replacing any pending value and
    /// restarting the delay.
    pub fn arm(&mut self, key: K, value: V, now_ms: u64) {
        self.pending
            .insert(key, (now_ms.saturating_add(self.delay_ms), value));
    }

    /// Arms `key`, merging `value` into any pending value instead of
    /// replacing it. The delay still restarts.
    pub fn arm_merge(&mut self, key: K, value: V, now_ms: u64, merge: impl FnOnce(&mut V, V)) {
        let due_at = now_ms.saturating_add(self.delay_ms);
        match self.pending.get_mut(&key) {
            Some((due, pending)) => {
                *due = due_at;
                merge(pending, value);
            }
            None => {
                self.pending.insert(key, (due_at, value));
            }
        }
    }

    /// Drops any pending value for `key` without firing it.
    pub fn cancel(&mut self, key: &K) -> Option<V> {
        self.pending.remove(key).map(|(_, value)| value)
    }

    /// Removes and returns every entry due at `now_ms`, ordered by key for
    /// deterministic emission.
    pub fn poll(&mut self, now_ms: u64) -> Vec<(K, V)> {
        let mut due: Vec<K> = self
            .pending
            .iter()
            .filter(|(_, (due_at, _))| *due_at <= now_ms)
            .map(|(key, _)| key.clone())
            .collect();
        due.sort();
        due.into_iter()
            .filter_map(|key| self.pending.remove(&key).map(|(_, value)| (key, value)))
            .collect()
    }

    /// Removes and returns every pending entry regardless of delay, ordered by
    /// key. Used on shutdown.
    pub fn flush(&mut self) -> Vec<(K, V)> {
        let mut keys: Vec<K> = self.pending.keys().cloned().collect();
        keys.sort();
        keys.into_iter()
            .filter_map(|key| self.pending.remove(&key).map(|(_, value)| (key, value)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn burst_collapses_to_one_trailing_value() {
        let mut debounce: KeyedDebounce<&str, i32> = KeyedDebounce::new(500);
        debounce.arm("a", 1, 0);
        debounce.arm("a", 2, 100);
        debounce.arm("a", 3, 200);

        // The delay restarted at 200; nothing is due at 500.
        assert_eq!(debounce.poll(500), Vec::<(&str, i32)>::new());
        assert_eq!(debounce.poll(700), vec![("a", 3)]);
        assert!(debounce.is_empty());
    }

    #[test]
    fn independent_keys_fire_independently() {
        let mut debounce: KeyedDebounce<&str, i32> = KeyedDebounce::new(500);
        debounce.arm("a", 1, 0);
        debounce.arm("b", 2, 300);

        assert_eq!(debounce.poll(500), vec![("a", 1)]);
        assert_eq!(debounce.poll(800), vec![("b", 2)]);
    }

    #[test]
    fn arm_merge_accumulates_instead_of_replacing() {
        let mut debounce: KeyedDebounce<&str, Vec<i32>> = KeyedDebounce::new(500);
        debounce.arm_merge("a", vec![1], 0, |pending, extra| pending.extend(extra));
        debounce.arm_merge("a", vec![2], 100, |pending, extra| pending.extend(extra));

        assert_eq!(debounce.poll(600), vec![("a", vec![1, 2])]);
    }

    #[test]
    fn cancel_drops_the_pending_value() {
        let mut debounce: KeyedDebounce<&str, i32> = KeyedDebounce::new(500);
        debounce.arm("a", 1, 0);
        assert_eq!(debounce.cancel(&"a"), Some(1));
        assert_eq!(debounce.poll(1_000), Vec::<(&str, i32)>::new());
    }

    #[test]
    fn flush_emits_everything_immediately() {
        let mut debounce: KeyedDebounce<&str, i32> = KeyedDebounce::new(500);
        debounce.arm("b", 2, 0);
        debounce.arm("a", 1, 0);
        assert_eq!(debounce.flush(), vec![("a", 1), ("b", 2)]);
        assert!(debounce.is_empty());
    }
}
