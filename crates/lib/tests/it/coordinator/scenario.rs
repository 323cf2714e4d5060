use dossier::{PatchOperation, PatchSet, coordinator::CoordinatorError};
use serde_json::json;

use crate::helpers::{doc_id, ptr, test_coordinator};

#[tokio::test]
async fn create_diff_commit_then_conflict() {
    let coordinator = test_coordinator().await;
    let id = doc_id("e2e");

    let created = coordinator
        .begin_mutation_or_create(&id, json!({"a": 1}))
        .await
        .unwrap();
    assert!(created.created());
    assert_eq!(created.base().version(), 0);
    coordinator.abort(&id, created.lease()).await.unwrap();

    let mutation = coordinator.begin_mutation(&id).await.unwrap();
    let patch = PatchSet::from_diff(
        mutation.base().version(),
        mutation.base().content(),
        &json!({"a": 2, "b": 3}),
    );
    assert_eq!(
        patch.operations,
        vec![
            PatchOperation::replace(ptr("/a"), json!(2)),
            PatchOperation::add(ptr("/b"), json!(3)),
        ]
    );

    let revision = coordinator.commit(&id, mutation.lease(), &patch).await.unwrap();
    assert_eq!(revision.version(), 1);
    assert_eq!(revision.previous_version(), Some(0));
    assert_eq!(revision.content(), &json!({"a": 2, "b": 3}));
    assert_eq!(revision.forward_patch(), patch.operations.as_slice());
    assert!(revision.verify_etag());

    // The same stale patch a second time.
    let retry = coordinator.begin_mutation(&id).await.unwrap();
    let err = coordinator.commit(&id, retry.lease(), &patch).await.unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(err.current_version(), Some(1));
    assert!(matches!(
        err,
        dossier::Error::Coordinator(CoordinatorError::Conflict {
            expected: Some(0),
            current_version: 1,
            ..
        })
    ));
}

#[tokio::test]
async fn conflict_leaves_stored_revision_identical() {
    let coordinator = test_coordinator().await;
    let id = doc_id("stale");
    let m = coordinator.begin_mutation_or_create(&id, json!({"x": [1, 2]})).await.unwrap();
    coordinator
        .commit_content(&id, m.lease(), 0, json!({"x": [1, 2, 3]}))
        .await
        .unwrap();
    let before = coordinator.store().get(&id, None).await.unwrap();
    let before_bytes = serde_json::to_vec(&before).unwrap();

    let m = coordinator.begin_mutation(&id).await.unwrap();
    let stale = PatchSet::new(0, vec![PatchOperation::remove(ptr("/x"))]);
    assert!(coordinator.commit(&id, m.lease(), &stale).await.unwrap_err().is_conflict());

    let after = coordinator.store().get(&id, None).await.unwrap();
    assert_eq!(serde_json::to_vec(&after).unwrap(), before_bytes);
    assert_eq!(coordinator.store().versions(&id).await.unwrap(), vec![0, 1]);
}

#[tokio::test]
async fn failed_patch_is_never_persisted() {
    let coordinator = test_coordinator().await;
    let id = doc_id("atomic");
    let m = coordinator.begin_mutation_or_create(&id, json!({"a": 1})).await.unwrap();
    coordinator.abort(&id, m.lease()).await.unwrap();

    let m = coordinator.begin_mutation(&id).await.unwrap();
    let patch = PatchSet::new(
        0,
        vec![
            PatchOperation::replace(ptr("/a"), json!(100)),
            PatchOperation::remove(ptr("/does/not/exist")),
        ],
    );
    let err = coordinator.commit(&id, m.lease(), &patch).await.unwrap_err();
    assert!(err.is_path_not_found());

    let latest = coordinator.store().get(&id, None).await.unwrap();
    assert_eq!(latest.version(), 0);
    assert_eq!(latest.content(), &json!({"a": 1}));

    // The failed commit released the lease.
    let next = coordinator.begin_mutation(&id).await.unwrap();
    assert_eq!(next.base().version(), 0);
}

#[tokio::test]
async fn content_commits_record_both_patch_directions() {
    let coordinator = test_coordinator().await;
    let id = doc_id("directions");
    let old = json!({"items": [1, 2, 3], "title": "x"});
    let new = json!({"items": [3, 1, 2], "title": "y"});

    let m = coordinator.begin_mutation_or_create(&id, old.clone()).await.unwrap();
    let revision = coordinator
        .commit_content(&id, m.lease(), 0, new.clone())
        .await
        .unwrap();

    assert_eq!(dossier::patch::apply(&old, revision.forward_patch()).unwrap(), new);
    assert_eq!(dossier::patch::apply(&new, revision.backward_patch()).unwrap(), old);
}

#[tokio::test]
async fn tombstone_then_revive() {
    let coordinator = test_coordinator().await;
    let id = doc_id("lazarus");
    let m = coordinator.begin_mutation_or_create(&id, json!({"alive": true})).await.unwrap();
    coordinator.abort(&id, m.lease()).await.unwrap();

    let m = coordinator.begin_mutation(&id).await.unwrap();
    let tombstone = coordinator.commit_tombstone(&id, m.lease(), 0).await.unwrap();
    assert!(tombstone.is_deleted());
    assert_eq!(
        dossier::patch::apply(tombstone.content(), tombstone.backward_patch()).unwrap(),
        json!({"alive": true})
    );

    // Patching a tombstone is refused, replacing its content is not.
    let m = coordinator.begin_mutation(&id).await.unwrap();
    let patch = PatchSet::new(1, vec![PatchOperation::add(ptr("/alive"), json!(false))]);
    assert!(coordinator.commit(&id, m.lease(), &patch).await.unwrap_err().is_not_found());

    let m = coordinator.begin_mutation(&id).await.unwrap();
    let revived = coordinator
        .commit_content(&id, m.lease(), 1, json!({"alive": "again"}))
        .await
        .unwrap();
    assert_eq!(revived.version(), 2);
    assert!(!revived.is_deleted());
}

#[tokio::test]
async fn begin_mutation_on_missing_document() {
    let coordinator = test_coordinator().await;
    let err = coordinator.begin_mutation(&doc_id("missing")).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn empty_patch_still_advances_version() {
    let coordinator = test_coordinator().await;
    let id = doc_id("touch");
    let m = coordinator.begin_mutation_or_create(&id, json!(1)).await.unwrap();
    let revision = coordinator
        .commit(&id, m.lease(), &PatchSet::new(0, vec![]))
        .await
        .unwrap();
    assert_eq!(revision.version(), 1);
    assert_eq!(revision.content(), &json!(1));
}
