//! Document key generation.
//!
//! A table with a primary key stores each document under the order-preserving
//! encoding of its primary key value. Any other table draws keys from a
//! counter kept in its `TableInfo`, so the sequence carries on when the
//! database is opened again.

use crate::catalog::{self, TableInfo};
use crate::database::Tx;
use crate::error::{Error, Result};
use core::ops::ControlFlow;
use strata_core::{Document, Value};
use strata_encoding::{key, uint};
use strata_engine::Transaction;
use tracing::warn;

/// Returns the key of a validated document.
pub(crate) fn generate_key(tx: &Tx, info: &TableInfo, doc: &Document) -> Result<Vec<u8>> {
    match info.primary_key() {
        Some(pk) => {
            let not_found = || Error::PrimaryKeyNotFound {
                path: pk.path.to_string(),
            };
            let value = match pk.path.get_value(doc) {
                Ok(v) => v,
                Err(e) if e.is_not_found() => return Err(not_found()),
                Err(e) => return Err(e.into()),
            };
            if is_empty(value) {
                return Err(not_found());
            }
            Ok(key::encode_value(value))
        }
        None => {
            let seq = tx.write(|engine| next_sequence(engine, &info.table_name))?;
            Ok(uint::encode_uint(seq))
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Blob(b) => b.is_empty(),
        Value::Text(s) => s.is_empty(),
        _ => false,
    }
}

/// Increments and persists the table's key counter.
fn next_sequence(engine: &mut dyn Transaction, table_name: &str) -> Result<u64> {
    let mut info = catalog::get_table_info(engine, table_name)?;
    if info.last_key == 0 {
        info.last_key = last_stored_key(engine, table_name)?;
    }
    info.last_key = info
        .last_key
        .checked_add(1)
        .ok_or_else(|| Error::InvalidTableInfo(format!("key sequence of {} exhausted", table_name)))?;
    catalog::put_table_info(engine, &info)?;
    Ok(info.last_key)
}

/// Reads the largest generated key of a table whose counter was not recorded.
fn last_stored_key(engine: &dyn Transaction, table_name: &str) -> Result<u64> {
    let mut last = None;
    engine.descend_less_or_equal(&catalog::table_store(table_name), None, &mut |k, _| {
        last = Some(k.to_vec());
        ControlFlow::Break(())
    })?;
    match last {
        None => Ok(0),
        Some(k) => {
            let seq = uint::decode_uint(&k)?;
            warn!(table = table_name, seq, "key counter missing, recovered from stored keys");
            Ok(seq)
        }
    }
}
