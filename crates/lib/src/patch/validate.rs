//! Patch validation without committing.

use serde_json::Value;

use super::apply::{REMOVE_ROOT, check, into_descendant};
use super::errors::PatchError;
use super::operation::PatchOperation;

/// Structural checks that need no document.
///
/// Reports every operation that could never succeed regardless of the tree
/// it is applied to: removing the root, or moving/copying a value into its
/// own descendant.
pub fn validate(operations: &[PatchOperation]) -> Result<(), Vec<PatchError>> {
    let issues: Vec<PatchError> = operations
        .iter()
        .enumerate()
        .filter_map(|(index, operation)| structural_issue(index, operation))
        .collect();
    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Structural checks followed by a dry run against `doc`.
///
/// A dry run stops at the first failing operation since later operations
/// depend on the state it would have produced.
pub fn validate_against(doc: &Value, operations: &[PatchOperation]) -> Result<(), Vec<PatchError>> {
    validate(operations)?;
    check(doc, operations).map_err(|err| vec![err])
}

fn structural_issue(index: usize, operation: &PatchOperation) -> Option<PatchError> {
    match operation {
        PatchOperation::Remove { path } if path.is_root() => Some(PatchError::TypeMismatch {
            index,
            path: path.clone(),
            reason: REMOVE_ROOT.to_string(),
        }),
        PatchOperation::Move { from, path } | PatchOperation::Copy { from, path }
            if path.is_descendant_of(from) =>
        {
            Some(PatchError::TypeMismatch {
                index,
                path: path.clone(),
                reason: into_descendant(operation.name()),
            })
        }
        _ => None,
    }
}
