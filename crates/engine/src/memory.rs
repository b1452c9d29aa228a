//! In-memory engine.
//!
//! Every transaction works on a snapshot of the stores taken when it began.
//! Persistent maps make the snapshot a constant-time clone. A writable
//! transaction publishes its snapshot on commit, provided no other transaction
//! committed in the meantime.

use crate::error::{EngineError, Result};
use crate::transaction::{Engine, Transaction, TransactionState, Visitor};
use core::ops::{Bound, ControlFlow};
use im::OrdMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{trace, warn};

type Store = OrdMap<Vec<u8>, Vec<u8>>;
type Stores = OrdMap<String, Store>;

#[derive(Default)]
struct Shared {
    /// Incremented by every successful write commit.
    version: u64,
    stores: Stores,
}

/// An in-memory storage engine.
///
/// Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryEngine {
    shared: Arc<Mutex<Shared>>,
}

impl MemoryEngine {
    /// Creates an empty engine.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Engine for MemoryEngine {
    fn begin(&self, writable: bool) -> Result<Box<dyn Transaction>> {
        let shared = self.shared.lock();
        trace!(writable, version = shared.version, "begin transaction");
        Ok(Box::new(MemoryTransaction {
            shared: Arc::clone(&self.shared),
            base_version: shared.version,
            stores: shared.stores.clone(),
            writable,
            dirty: false,
            state: TransactionState::Active,
        }))
    }
}

struct MemoryTransaction {
    shared: Arc<Mutex<Shared>>,
    base_version: u64,
    stores: Stores,
    writable: bool,
    dirty: bool,
    state: TransactionState,
}

impl MemoryTransaction {
    fn check_active(&self) -> Result<()> {
        if self.state != TransactionState::Active {
            return Err(EngineError::TransactionClosed);
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<()> {
        self.check_active()?;
        if !self.writable {
            return Err(EngineError::ReadOnly);
        }
        Ok(())
    }

    fn store(&self, name: &str) -> Result<&Store> {
        self.check_active()?;
        self.stores
            .get(name)
            .ok_or_else(|| EngineError::store_not_found(name))
    }

    fn store_mut(&mut self, name: &str) -> Result<&mut Store> {
        self.check_writable()?;
        self.dirty = true;
        self.stores
            .get_mut(name)
            .ok_or_else(|| EngineError::store_not_found(name))
    }
}

impl Transaction for MemoryTransaction {
    fn state(&self) -> TransactionState {
        self.state
    }

    fn is_writable(&self) -> bool {
        self.writable
    }

    fn create_store(&mut self, name: &str) -> Result<()> {
        self.check_writable()?;
        if self.stores.contains_key(name) {
            return Err(EngineError::StoreAlreadyExists(name.into()));
        }
        self.stores.insert(name.into(), Store::new());
        self.dirty = true;
        Ok(())
    }

    fn drop_store(&mut self, name: &str) -> Result<()> {
        self.check_writable()?;
        if self.stores.remove(name).is_none() {
            return Err(EngineError::store_not_found(name));
        }
        self.dirty = true;
        Ok(())
    }

    fn store_exists(&self, name: &str) -> Result<bool> {
        self.check_active()?;
        Ok(self.stores.contains_key(name))
    }

    fn get(&self, store: &str, key: &[u8]) -> Result<Vec<u8>> {
        self.store(store)?
            .get(key)
            .cloned()
            .ok_or(EngineError::NotFound)
    }

    fn put(&mut self, store: &str, key: &[u8], value: &[u8]) -> Result<()> {
        self.store_mut(store)?.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, store: &str, key: &[u8]) -> Result<()> {
        self.store_mut(store)?
            .remove(key)
            .map(|_| ())
            .ok_or(EngineError::NotFound)
    }

    fn truncate(&mut self, store: &str) -> Result<()> {
        *self.store_mut(store)? = Store::new();
        Ok(())
    }

    fn ascend_greater_or_equal(
        &self,
        store: &str,
        start: &[u8],
        visit: &mut Visitor<'_>,
    ) -> Result<()> {
        let range = (Bound::Included(start.to_vec()), Bound::Unbounded);
        for (k, v) in self.store(store)?.range(range) {
            if visit(k.as_slice(), v.as_slice()).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn descend_less_or_equal(
        &self,
        store: &str,
        start: Option<&[u8]>,
        visit: &mut Visitor<'_>,
    ) -> Result<()> {
        let upper = match start {
            Some(start) => Bound::Included(start.to_vec()),
            None => Bound::Unbounded,
        };
        for (k, v) in self.store(store)?.range((Bound::Unbounded, upper)).rev() {
            if let ControlFlow::Break(()) = visit(k.as_slice(), v.as_slice()) {
                break;
            }
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.check_active()?;
        if self.writable && self.dirty {
            let mut shared = self.shared.lock();
            if shared.version != self.base_version {
                warn!(
                    base = self.base_version,
                    current = shared.version,
                    "commit rejected: another transaction committed first"
                );
                self.state = TransactionState::RolledBack;
                return Err(EngineError::Conflict);
            }
            shared.stores = std::mem::take(&mut self.stores);
            shared.version += 1;
            trace!(version = shared.version, "commit");
        }
        self.state = TransactionState::Committed;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.check_active()?;
        self.stores = Stores::new();
        self.state = TransactionState::RolledBack;
        trace!("rollback");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_ascend(tx: &dyn Transaction, store: &str, start: &[u8]) -> Vec<Vec<u8>> {
        let mut keys = Vec::new();
        tx.ascend_greater_or_equal(store, start, &mut |k, _| {
            keys.push(k.to_vec());
            ControlFlow::Continue(())
        })
        .unwrap();
        keys
    }

    fn collect_descend(tx: &dyn Transaction, store: &str, start: Option<&[u8]>) -> Vec<Vec<u8>> {
        let mut keys = Vec::new();
        tx.descend_less_or_equal(store, start, &mut |k, _| {
            keys.push(k.to_vec());
            ControlFlow::Continue(())
        })
        .unwrap();
        keys
    }

    fn seeded() -> MemoryEngine {
        let engine = MemoryEngine::new();
        let mut tx = engine.begin(true).unwrap();
        tx.create_store("s").unwrap();
        for k in [b"a", b"c", b"e"] {
            tx.put("s", k, b"v").unwrap();
        }
        tx.commit().unwrap();
        engine
    }

    #[test]
    fn test_get_put_delete() {
        let engine = seeded();
        let mut tx = engine.begin(true).unwrap();
        assert_eq!(tx.get("s", b"a").unwrap(), b"v".to_vec());
        assert_eq!(tx.get("s", b"b"), Err(EngineError::NotFound));
        tx.delete("s", b"a").unwrap();
        assert_eq!(tx.delete("s", b"a"), Err(EngineError::NotFound));
        assert_eq!(tx.get("x", b"a"), Err(EngineError::StoreNotFound("x".into())));
    }

    #[test]
    fn test_range_scans() {
        let engine = seeded();
        let tx = engine.begin(false).unwrap();
        assert_eq!(collect_ascend(tx.as_ref(), "s", b"b"), vec![b"c".to_vec(), b"e".to_vec()]);
        assert_eq!(collect_ascend(tx.as_ref(), "s", b""), vec![b"a".to_vec(), b"c".to_vec(), b"e".to_vec()]);
        assert_eq!(collect_descend(tx.as_ref(), "s", Some(b"c")), vec![b"c".to_vec(), b"a".to_vec()]);
        assert_eq!(collect_descend(tx.as_ref(), "s", None), vec![b"e".to_vec(), b"c".to_vec(), b"a".to_vec()]);
    }

    #[test]
    fn test_scan_stops_on_break() {
        let engine = seeded();
        let tx = engine.begin(false).unwrap();
        let mut seen = 0;
        tx.ascend_greater_or_equal("s", b"", &mut |_, _| {
            seen += 1;
            ControlFlow::Break(())
        })
        .unwrap();
        assert_eq!(seen, 1);
    }

    #[test]
    fn test_rollback_discards_writes() {
        let engine = seeded();
        let mut tx = engine.begin(true).unwrap();
        tx.put("s", b"z", b"1").unwrap();
        tx.rollback().unwrap();
        assert_eq!(tx.state(), TransactionState::RolledBack);

        let tx = engine.begin(false).unwrap();
        assert_eq!(tx.get("s", b"z"), Err(EngineError::NotFound));
    }

    #[test]
    fn test_snapshot_isolation() {
        let engine = seeded();
        let reader = engine.begin(false).unwrap();
        let mut writer = engine.begin(true).unwrap();
        writer.put("s", b"z", b"1").unwrap();
        writer.commit().unwrap();
        assert_eq!(reader.get("s", b"z"), Err(EngineError::NotFound));
        assert!(engine.begin(false).unwrap().get("s", b"z").is_ok());
    }

    #[test]
    fn test_read_only() {
        let engine = seeded();
        let mut tx = engine.begin(false).unwrap();
        assert_eq!(tx.put("s", b"z", b"1"), Err(EngineError::ReadOnly));
        assert_eq!(tx.create_store("t"), Err(EngineError::ReadOnly));
    }

    #[test]
    fn test_closed_transaction() {
        let engine = seeded();
        let mut tx = engine.begin(true).unwrap();
        tx.commit().unwrap();
        assert_eq!(tx.get("s", b"a"), Err(EngineError::TransactionClosed));
        assert_eq!(tx.commit(), Err(EngineError::TransactionClosed));
        assert_eq!(tx.rollback(), Err(EngineError::TransactionClosed));
    }

    #[test]
    fn test_conflicting_commit() {
        let engine = seeded();
        let mut first = engine.begin(true).unwrap();
        let mut second = engine.begin(true).unwrap();
        first.put("s", b"x", b"1").unwrap();
        second.put("s", b"y", b"1").unwrap();
        first.commit().unwrap();
        assert_eq!(second.commit(), Err(EngineError::Conflict));
        assert_eq!(second.state(), TransactionState::RolledBack);
    }

    #[test]
    fn test_stores() {
        let engine = MemoryEngine::new();
        let mut tx = engine.begin(true).unwrap();
        tx.create_store("a").unwrap();
        assert_eq!(tx.create_store("a"), Err(EngineError::StoreAlreadyExists("a".into())));
        assert!(tx.store_exists("a").unwrap());
        tx.put("a", b"k", b"v").unwrap();
        tx.truncate("a").unwrap();
        assert_eq!(collect_ascend(tx.as_ref(), "a", b""), Vec::<Vec<u8>>::new());
        tx.drop_store("a").unwrap();
        assert!(!tx.store_exists("a").unwrap());
        assert_eq!(tx.drop_store("a"), Err(EngineError::StoreNotFound("a".into())));
    }
}
