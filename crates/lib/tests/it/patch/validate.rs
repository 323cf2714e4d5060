use dossier::patch::{PatchError, PatchOperation, validate, validate_against};
use serde_json::json;

use crate::helpers::ptr;

#[test]
fn valid_patch_passes_both_checks() {
    let ops = vec![
        PatchOperation::test(ptr("/a"), json!(1)),
        PatchOperation::replace(ptr("/a"), json!(2)),
    ];
    assert!(validate(&ops).is_ok());
    assert!(validate_against(&json!({"a": 1}), &ops).is_ok());
}

#[test]
fn static_issues_are_reported_before_the_dry_run() {
    let ops = vec![
        PatchOperation::remove(ptr("/missing")),
        PatchOperation::move_from(ptr("/a"), ptr("/a/inner")),
    ];
    // Only the structural issue is reported; the dry run never runs.
    let errors = validate_against(&json!({"a": {}}), &ops).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].operation_index(), Some(1));
    assert!(errors[0].is_type_mismatch());
}

#[test]
fn dry_run_reports_first_failure() {
    let ops = vec![
        PatchOperation::add(ptr("/b"), json!(1)),
        PatchOperation::test(ptr("/b"), json!(2)),
        PatchOperation::remove(ptr("/nope")),
    ];
    let errors = validate_against(&json!({}), &ops).unwrap_err();
    assert_eq!(
        errors,
        vec![PatchError::TestFailed {
            index: 1,
            path: ptr("/b"),
        }]
    );
}
