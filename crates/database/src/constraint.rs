//! Field constraint enforcement.
//!
//! Every document goes through `validate_and_convert` before it is stored.
//! Type constraints run first, in declaration order, and write converted
//! values into a copy of the document. Not-null constraints then run against
//! the converted copy. The first failing constraint is reported.

use crate::catalog::FieldConstraint;
use crate::error::{Error, Result};
use strata_core::{Document, Value};

/// Checks a document against a table's constraints and returns the converted
/// document. The input is left untouched.
pub fn validate_and_convert(doc: &Document, constraints: &[FieldConstraint]) -> Result<Document> {
    let mut out = doc.clone();

    for constraint in constraints {
        let Some(target) = constraint.value_type else {
            continue;
        };
        let current = match resolve(&out, constraint)? {
            Some(v) => v,
            None => continue,
        };
        let from = current.value_type();
        let converted = current
            .convert_to(target)
            .map_err(|_| Error::IncompatibleType {
                path: constraint.path.to_string(),
                from,
                to: target,
            })?;
        if converted.value_type() != from {
            constraint.path.set_value(&mut out, converted)?;
        }
    }

    for constraint in constraints {
        if !constraint.is_not_null && !constraint.is_primary_key {
            continue;
        }
        let present = matches!(resolve(&out, constraint)?, Some(v) if !v.is_null());
        if present {
            continue;
        }
        let path = constraint.path.to_string();
        return Err(if constraint.is_primary_key {
            Error::PrimaryKeyNotFound { path }
        } else {
            Error::NotNullConstraintViolation { path }
        });
    }

    Ok(out)
}

/// Resolves a constraint's path. A path that does not lead to a value is `None`.
fn resolve<'a>(doc: &'a Document, constraint: &FieldConstraint) -> Result<Option<&'a Value>> {
    match constraint.path.get_value(doc) {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}
