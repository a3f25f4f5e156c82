// src/records.rs

//! Thread-safe append-only list.
//!
//! Vertices append to it concurrently; readers get a snapshot `Vec` that is
//! independent of later appends.

use std::sync::Arc;

use parking_lot::RwLock;

#[derive(Debug)]
pub struct RecordList<T> {
    inner: Arc<RwLock<Vec<T>>>,
}

// Manual impls: a shared handle is cloneable and defaultable whatever `T` is.
impl<T> Clone for RecordList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for RecordList<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl<T: Clone> RecordList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, value: T) {
        self.inner.write().push(value);
    }

    /// Snapshot of everything appended so far, in append order.
    pub fn get(&self) -> Vec<T> {
        self.inner.read().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn concurrent_appends_are_all_kept() {
        let list = RecordList::new();
        let mut handles = Vec::new();
        for i in 0..16 {
            let list = list.clone();
            handles.push(tokio::spawn(async move { list.add(i) }));
        }
        for h in handles {
            h.await.expect("append task");
        }

        let mut seen = list.get();
        seen.sort();
        assert_eq!(seen, (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn snapshot_does_not_see_later_appends() {
        let list = RecordList::new();
        list.add("a");
        let snapshot = list.get();
        list.add("b");
        assert_eq!(snapshot, vec!["a"]);
        assert_eq!(list.len(), 2);
    }
}
