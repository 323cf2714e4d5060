use dossier::{DocumentStore, Revision, patch::DiffOptions};
use serde_json::json;

use crate::helpers::{all_backends, doc_id, test_store};

#[tokio::test]
async fn store_contract_holds_on_every_backend() {
    for (label, backend) in all_backends().await {
        let store = DocumentStore::new(backend);
        let id = doc_id("contract");

        let first = store.create(&id, json!({"a": 1})).await.unwrap();
        assert_eq!(first.version(), 0, "{label}");
        assert_eq!(first.previous_version(), None, "{label}");
        assert!(first.verify_etag(), "{label}");

        let second = Revision::successor(&first, json!({"a": 2}), vec![], vec![], "t1".into());
        store.put(second.clone()).await.unwrap();

        assert_eq!(store.get(&id, None).await.unwrap(), second, "{label}");
        assert_eq!(store.get(&id, Some(0)).await.unwrap(), first, "{label}");
        assert_eq!(store.versions(&id).await.unwrap(), vec![0, 1], "{label}");
        assert_eq!(store.documents().await.unwrap(), vec![id.clone()], "{label}");
        assert_eq!(store.backend().kind(), label);
    }
}

#[tokio::test]
async fn revisions_are_never_rewritten() {
    let store = test_store().await;
    let id = doc_id("immutable");
    let first = store.create(&id, json!([1])).await.unwrap();

    let forged = Revision::initial(id.clone(), json!([2]), "t".into());
    assert!(store.put(forged).await.unwrap_err().is_conflict());
    assert_eq!(store.get(&id, Some(0)).await.unwrap(), first);
}

#[tokio::test]
async fn tombstones_are_versioned_revisions() {
    let store = test_store().await;
    let id = doc_id("gone");
    let first = store.create(&id, json!({"keep": true})).await.unwrap();
    let tombstone = Revision::tombstone(&first, "t".into());
    store.put(tombstone).await.unwrap();

    let latest = store.latest(&id).await.unwrap();
    assert!(latest.is_deleted());
    assert_eq!(latest.version(), 1);
    assert!(latest.content().is_null());
    // History survives deletion.
    assert_eq!(store.get(&id, Some(0)).await.unwrap(), first);
}

#[tokio::test]
async fn diff_between_stored_versions() {
    let store = test_store().await;
    let id = doc_id("diffed");
    let first = store.create(&id, json!({"a": 1})).await.unwrap();
    let second = Revision::successor(&first, json!({"a": 2, "b": 3}), vec![], vec![], "t".into());
    store.put(second).await.unwrap();

    let patch = store
        .diff_versions(&id, 0, 1, &DiffOptions::default())
        .await
        .unwrap();
    assert_eq!(patch.base_version, 0);
    assert_eq!(patch.len(), 2);

    let reverse = store
        .diff_versions(&id, 1, 0, &DiffOptions::default())
        .await
        .unwrap();
    assert_eq!(reverse.base_version, 1);
    assert_eq!(reverse.len(), 2);

    assert!(
        store
            .diff_versions(&id, 0, 9, &DiffOptions::default())
            .await
            .unwrap_err()
            .is_not_found()
    );
}

#[tokio::test]
async fn unknown_documents_are_not_found() {
    let store = test_store().await;
    let id = doc_id("nobody");
    assert!(store.get(&id, None).await.unwrap_err().is_not_found());
    assert!(store.get(&id, Some(0)).await.unwrap_err().is_not_found());
    assert!(store.versions(&id).await.unwrap_err().is_not_found());
    assert!(store.try_latest(&id).await.unwrap().is_none());
}
