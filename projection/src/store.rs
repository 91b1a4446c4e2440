use anyhow::Result;
use chainfold_types::{Key, Value};
use std::future::Future;

#[cfg(any(test, feature = "mocks"))]
use commonware_codec::Encode;
#[cfg(any(test, feature = "mocks"))]
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

/// Entity store contract: load by key plus idempotent upsert.
///
/// Implementations hand out cheap clones of one underlying store and serialize
/// concurrent writers to the same key. The projection additionally routes all events
/// for one identity through a single worker, so an upsert never races a conflicting
/// write for its key.
pub trait Store: Clone + Send + Sync + 'static {
    fn get(&self, key: &Key) -> impl Future<Output = Result<Option<Value>>> + Send;
    fn upsert(&self, key: Key, value: Value) -> impl Future<Output = Result<()>> + Send;

    /// Persist a change set produced by [`crate::Projection::commit`].
    fn apply(&self, changes: Vec<(Key, Value)>) -> impl Future<Output = Result<()>> + Send {
        async {
            for (key, value) in changes {
                self.upsert(key, value).await?;
            }
            Ok(())
        }
    }
}

/// In-memory store for tests.
///
/// Rows live in a `BTreeMap` so [`Memory::dump`] renders the table in key order;
/// replay tests compare dumps byte for byte.
#[cfg(any(test, feature = "mocks"))]
#[derive(Clone, Default)]
pub struct Memory {
    table: Arc<Mutex<BTreeMap<Key, Value>>>,
}

#[cfg(any(test, feature = "mocks"))]
impl Memory {
    /// Snapshot of every row, in key order.
    pub fn rows(&self) -> Vec<(Key, Value)> {
        let table = self.table.lock().unwrap();
        table.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Deterministic encoding of the whole table.
    pub fn dump(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (key, value) in self.rows() {
            out.extend_from_slice(key.encode().as_ref());
            out.extend_from_slice(value.encode().as_ref());
        }
        out
    }
}

#[cfg(any(test, feature = "mocks"))]
impl Store for Memory {
    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(self.table.lock().unwrap().get(key).cloned())
    }

    async fn upsert(&self, key: Key, value: Value) -> Result<()> {
        self.table.lock().unwrap().insert(key, value);
        Ok(())
    }
}
