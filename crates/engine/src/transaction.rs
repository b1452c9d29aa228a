//! The engine contract.

use crate::error::Result;
use core::ops::ControlFlow;

/// Callback invoked for each key-value pair of a range scan.
///
/// Returning `ControlFlow::Break` stops the scan.
pub type Visitor<'a> = dyn FnMut(&[u8], &[u8]) -> ControlFlow<()> + 'a;

/// Transaction state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can perform operations.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been rolled back.
    RolledBack,
}

/// A storage engine.
pub trait Engine: Send + Sync {
    /// Starts a transaction. Writes are only allowed when `writable` is true.
    fn begin(&self, writable: bool) -> Result<Box<dyn Transaction>>;
}

/// A transaction over the stores of an engine.
///
/// Every method fails with `TransactionClosed` once the transaction has been
/// committed or rolled back, and every write fails with `ReadOnly` in a
/// read-only transaction.
pub trait Transaction {
    /// Returns the current state.
    fn state(&self) -> TransactionState;

    /// Returns true if the transaction may write.
    fn is_writable(&self) -> bool;

    /// Creates an empty store.
    fn create_store(&mut self, name: &str) -> Result<()>;

    /// Drops a store and all its keys.
    fn drop_store(&mut self, name: &str) -> Result<()>;

    /// Returns true if the store exists.
    fn store_exists(&self, name: &str) -> Result<bool>;

    /// Returns the value stored under `key`, or `NotFound`.
    fn get(&self, store: &str, key: &[u8]) -> Result<Vec<u8>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn put(&mut self, store: &str, key: &[u8], value: &[u8]) -> Result<()>;

    /// Removes `key`, or fails with `NotFound`.
    fn delete(&mut self, store: &str, key: &[u8]) -> Result<()>;

    /// Removes every key of the store.
    fn truncate(&mut self, store: &str) -> Result<()>;

    /// Visits keys greater than or equal to `start` in ascending order.
    fn ascend_greater_or_equal(
        &self,
        store: &str,
        start: &[u8],
        visit: &mut Visitor<'_>,
    ) -> Result<()>;

    /// Visits keys less than or equal to `start` in descending order. With no
    /// start the scan begins at the last key.
    fn descend_less_or_equal(
        &self,
        store: &str,
        start: Option<&[u8]>,
        visit: &mut Visitor<'_>,
    ) -> Result<()>;

    /// Makes the transaction's writes visible to later transactions.
    fn commit(&mut self) -> Result<()>;

    /// Discards the transaction's writes.
    fn rollback(&mut self) -> Result<()>;
}
