//! Patch application.
//!
//! Operations are applied strictly in order to a private working copy. The
//! caller's tree is only replaced by the result once every operation
//! succeeded, so a failing patch never leaves a partially modified document.

use serde_json::Value;

use super::errors::PatchError;
use super::operation::PatchOperation;
use super::pointer::{APPEND_TOKEN, Pointer, parse_index};

/// Failure of a single operation, before it is tagged with its index.
#[derive(Debug)]
pub(crate) enum Fault {
    NotFound(Pointer),
    Mismatch(Pointer, String),
    TestFailed(Pointer),
}

impl Fault {
    pub(crate) fn at(self, index: usize) -> PatchError {
        match self {
            Fault::NotFound(path) => PatchError::PathNotFound { index, path },
            Fault::Mismatch(path, reason) => PatchError::TypeMismatch {
                index,
                path,
                reason,
            },
            Fault::TestFailed(path) => PatchError::TestFailed { index, path },
        }
    }
}

pub(crate) const REMOVE_ROOT: &str = "the document root cannot be removed";

pub(crate) fn into_descendant(op: &str) -> String {
    format!("cannot {op} a value into its own descendant")
}

/// Apply `operations` to `doc`, returning the resulting tree.
pub fn apply(doc: &Value, operations: &[PatchOperation]) -> Result<Value, PatchError> {
    let mut working = doc.clone();
    for (index, operation) in operations.iter().enumerate() {
        apply_operation(&mut working, operation).map_err(|fault| fault.at(index))?;
    }
    Ok(working)
}

/// Dry run of [`apply`]: reports the error a real application would raise.
pub fn check(doc: &Value, operations: &[PatchOperation]) -> Result<(), PatchError> {
    apply(doc, operations).map(|_| ())
}

fn apply_operation(doc: &mut Value, operation: &PatchOperation) -> Result<(), Fault> {
    match operation {
        PatchOperation::Add { path, value } => apply_add(doc, path, value.clone()),
        PatchOperation::Remove { path } => apply_remove(doc, path).map(|_| ()),
        PatchOperation::Replace { path, value } => apply_replace(doc, path, value.clone()),
        PatchOperation::Move { from, path } => apply_move(doc, from, path),
        PatchOperation::Copy { from, path } => apply_copy(doc, from, path),
        PatchOperation::Test { path, value } => apply_test(doc, path, value),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn descend_error(target: &Pointer, depth: usize, node: &Value) -> Fault {
    let prefix = Pointer::from_tokens(target.tokens()[..depth].iter().cloned());
    Fault::Mismatch(
        target.clone(),
        format!("cannot descend into {} at '{prefix}'", kind(node)),
    )
}

pub(crate) fn resolve<'a>(doc: &'a Value, path: &Pointer) -> Result<&'a Value, Fault> {
    let mut node = doc;
    for (depth, token) in path.tokens().iter().enumerate() {
        node = match node {
            Value::Object(map) => map.get(token),
            Value::Array(items) => parse_index(token).and_then(|i| items.get(i)),
            scalar => return Err(descend_error(path, depth, scalar)),
        }
        .ok_or_else(|| Fault::NotFound(path.clone()))?;
    }
    Ok(node)
}

fn resolve_mut<'a>(doc: &'a mut Value, path: &Pointer) -> Result<&'a mut Value, Fault> {
    let mut node = doc;
    for (depth, token) in path.tokens().iter().enumerate() {
        node = match node {
            Value::Object(map) => map.get_mut(token),
            Value::Array(items) => parse_index(token).and_then(|i| items.get_mut(i)),
            scalar => return Err(descend_error(path, depth, scalar)),
        }
        .ok_or_else(|| Fault::NotFound(path.clone()))?;
    }
    Ok(node)
}

/// Resolve the container holding `path`'s last token.
///
/// Errors are reported against `path` itself, not the parent pointer.
fn parent_mut<'a>(doc: &'a mut Value, parent: &Pointer, path: &Pointer) -> Result<&'a mut Value, Fault> {
    resolve_mut(doc, parent).map_err(|fault| match fault {
        Fault::NotFound(_) => Fault::NotFound(path.clone()),
        Fault::Mismatch(_, reason) => Fault::Mismatch(path.clone(), reason),
        other => other,
    })
}

fn apply_add(doc: &mut Value, path: &Pointer, value: Value) -> Result<(), Fault> {
    let Some((parent, key)) = path.split_last() else {
        *doc = value;
        return Ok(());
    };
    match parent_mut(doc, &parent, path)? {
        Value::Object(map) => {
            map.insert(key.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            let index = if key == APPEND_TOKEN {
                items.len()
            } else {
                parse_index(key)
                    .filter(|i| *i <= items.len())
                    .ok_or_else(|| Fault::NotFound(path.clone()))?
            };
            items.insert(index, value);
            Ok(())
        }
        scalar => Err(Fault::Mismatch(
            path.clone(),
            format!("cannot add a member to a {}", kind(scalar)),
        )),
    }
}

fn apply_remove(doc: &mut Value, path: &Pointer) -> Result<Value, Fault> {
    let Some((parent, key)) = path.split_last() else {
        return Err(Fault::Mismatch(path.clone(), REMOVE_ROOT.to_string()));
    };
    match parent_mut(doc, &parent, path)? {
        Value::Object(map) => map
            .shift_remove(key)
            .ok_or_else(|| Fault::NotFound(path.clone())),
        Value::Array(items) => {
            let index = parse_index(key)
                .filter(|i| *i < items.len())
                .ok_or_else(|| Fault::NotFound(path.clone()))?;
            Ok(items.remove(index))
        }
        scalar => Err(Fault::Mismatch(
            path.clone(),
            format!("cannot remove a member from a {}", kind(scalar)),
        )),
    }
}

fn apply_replace(doc: &mut Value, path: &Pointer, value: Value) -> Result<(), Fault> {
    let target = resolve_mut(doc, path)?;
    *target = value;
    Ok(())
}

fn apply_move(doc: &mut Value, from: &Pointer, path: &Pointer) -> Result<(), Fault> {
    if path.is_descendant_of(from) {
        return Err(Fault::Mismatch(path.clone(), into_descendant("move")));
    }
    if from == path {
        return resolve(doc, from).map(|_| ());
    }
    let value = apply_remove(doc, from)?;
    apply_add(doc, path, value)
}

fn apply_copy(doc: &mut Value, from: &Pointer, path: &Pointer) -> Result<(), Fault> {
    if path.is_descendant_of(from) {
        return Err(Fault::Mismatch(path.clone(), into_descendant("copy")));
    }
    let value = resolve(doc, from)?.clone();
    apply_add(doc, path, value)
}

fn apply_test(doc: &Value, path: &Pointer, expected: &Value) -> Result<(), Fault> {
    if resolve(doc, path)? == expected {
        Ok(())
    } else {
        Err(Fault::TestFailed(path.clone()))
    }
}
