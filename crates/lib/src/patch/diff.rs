//! Structural diff between two document trees.
//!
//! The produced operations are applied in order against the old tree, so
//! every pointer refers to the state left by the operations before it.
//!
//! Objects are compared key by key: keys missing from the new tree are
//! removed first (in old key order), then new keys are added and shared keys
//! recursed into (in new key order). Values that change kind are replaced.
//!
//! Arrays are compared positionally against a working copy that mirrors
//! what application will do. A single-element lookahead turns an insertion
//! or deletion in the middle of an array into one `add` or `remove` instead
//! of a cascade of replacements. With [`DiffOptions::detect_moves`] an
//! element found further along the working copy is relocated with one
//! `move`. Surplus trailing elements are removed from the end backwards.

use serde_json::{Map, Value};

use super::operation::PatchOperation;
use super::pointer::Pointer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    /// Emit `move` for array elements that were relocated.
    pub detect_moves: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self { detect_moves: true }
    }
}

impl DiffOptions {
    /// Only `add`, `remove` and `replace` operations.
    pub fn without_moves() -> Self {
        Self {
            detect_moves: false,
        }
    }
}

/// Diff with [`DiffOptions::default`].
pub fn diff(old: &Value, new: &Value) -> Vec<PatchOperation> {
    diff_with(old, new, &DiffOptions::default())
}

pub fn diff_with(old: &Value, new: &Value, options: &DiffOptions) -> Vec<PatchOperation> {
    let mut operations = Vec::new();
    diff_at(&Pointer::root(), old, new, options, &mut operations);
    operations
}

fn diff_at(
    path: &Pointer,
    old: &Value,
    new: &Value,
    options: &DiffOptions,
    out: &mut Vec<PatchOperation>,
) {
    if old == new {
        return;
    }
    match (old, new) {
        (Value::Object(old), Value::Object(new)) => diff_objects(path, old, new, options, out),
        (Value::Array(old), Value::Array(new)) => diff_arrays(path, old, new, options, out),
        _ => out.push(PatchOperation::replace(path.clone(), new.clone())),
    }
}

fn diff_objects(
    path: &Pointer,
    old: &Map<String, Value>,
    new: &Map<String, Value>,
    options: &DiffOptions,
    out: &mut Vec<PatchOperation>,
) {
    for key in old.keys() {
        if !new.contains_key(key) {
            out.push(PatchOperation::remove(path.child(key.as_str())));
        }
    }
    for (key, value) in new {
        let child = path.child(key.as_str());
        match old.get(key) {
            Some(previous) => diff_at(&child, previous, value, options, out),
            None => out.push(PatchOperation::add(child, value.clone())),
        }
    }
}

fn diff_arrays(
    path: &Pointer,
    old: &[Value],
    new: &[Value],
    options: &DiffOptions,
    out: &mut Vec<PatchOperation>,
) {
    let mut work = old.to_vec();

    for (i, target) in new.iter().enumerate() {
        if work.get(i) == Some(target) {
            continue;
        }

        if i < work.len() {
            let current = &work[i];
            let needed_later = new[i + 1..].contains(current);

            // Deleted element: the next one already matches.
            if !needed_later && work.get(i + 1) == Some(target) {
                out.push(PatchOperation::remove(path.index(i)));
                work.remove(i);
                continue;
            }

            // Inserted element: the current one matches the next target.
            if new.get(i + 1) == Some(current) && !work[i..].contains(target) {
                out.push(PatchOperation::add(path.index(i), target.clone()));
                work.insert(i, target.clone());
                continue;
            }

            if options.detect_moves
                && let Some(j) = (i + 1..work.len()).find(|&j| work[j] == *target)
            {
                out.push(PatchOperation::move_from(path.index(j), path.index(i)));
                let moved = work.remove(j);
                work.insert(i, moved);
                continue;
            }

            diff_at(&path.index(i), &work[i], target, options, out);
            work[i] = target.clone();
        } else {
            out.push(PatchOperation::add(path.index(i), target.clone()));
            work.push(target.clone());
        }
    }

    for i in (new.len()..work.len()).rev() {
        out.push(PatchOperation::remove(path.index(i)));
    }
}
