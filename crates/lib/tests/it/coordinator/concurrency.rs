use std::sync::Arc;

use dossier::{PatchSet, VersionCoordinator};
use serde_json::{Value, json};

use crate::helpers::{doc_id, test_coordinator};

/// Read the base, then race to commit a patch computed from it.
async fn optimistic_update(
    coordinator: Arc<VersionCoordinator>,
    id: &str,
    target: Value,
) -> dossier::Result<u64> {
    let id = doc_id(id);
    let base = coordinator.store().get(&id, None).await?;
    let patch = PatchSet::from_diff(base.version(), base.content(), &target);
    tokio::task::yield_now().await;

    let mutation = coordinator.begin_mutation(&id).await?;
    let revision = coordinator.commit(&id, mutation.lease(), &patch).await?;
    Ok(revision.version())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simultaneous_writers_never_share_a_version() {
    let coordinator = Arc::new(test_coordinator().await);
    let id = doc_id("race");
    let m = coordinator.begin_mutation_or_create(&id, json!({"n": 0})).await.unwrap();
    coordinator.abort(&id, m.lease()).await.unwrap();

    // Both read version 0 before either commits.
    let base = coordinator.store().get(&id, None).await.unwrap();
    let patches: Vec<PatchSet> = [1, 2]
        .iter()
        .map(|n| PatchSet::from_diff(0, base.content(), &json!({"n": n})))
        .collect();

    let tasks: Vec<_> = patches
        .into_iter()
        .map(|patch| {
            let coordinator = Arc::clone(&coordinator);
            let id = id.clone();
            tokio::spawn(async move {
                let mutation = coordinator.begin_mutation(&id).await?;
                coordinator.commit(&id, mutation.lease(), &patch).await
            })
        })
        .collect();

    let mut successes = 0;
    let mut conflicts = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(revision) => {
                assert_eq!(revision.version(), 1);
                successes += 1;
            }
            Err(err) => {
                assert!(err.is_conflict(), "{err}");
                assert_eq!(err.current_version(), Some(1));
                conflicts += 1;
            }
        }
    }
    assert_eq!((successes, conflicts), (1, 1));
    assert_eq!(coordinator.store().versions(&id).await.unwrap(), vec![0, 1]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_writers_produce_a_gapless_history() {
    let coordinator = Arc::new(test_coordinator().await);
    let id = doc_id("counter");
    let m = coordinator.begin_mutation_or_create(&id, json!(0)).await.unwrap();
    coordinator.abort(&id, m.lease()).await.unwrap();

    let writers = 16;
    let tasks: Vec<_> = (1..=writers)
        .map(|n| {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { optimistic_update(coordinator, "counter", json!(n)).await })
        })
        .collect();

    let mut committed: Vec<u64> = Vec::new();
    for task in tasks {
        match task.await.unwrap() {
            Ok(version) => committed.push(version),
            Err(err) => assert!(err.is_conflict(), "{err}"),
        }
    }

    committed.sort_unstable();
    let expected: Vec<u64> = (1..=committed.len() as u64).collect();
    assert!(!committed.is_empty());
    assert_eq!(committed, expected, "every success got a distinct version");

    let versions = coordinator.store().versions(&id).await.unwrap();
    assert_eq!(versions, (0..=committed.len() as u64).collect::<Vec<_>>());
}

#[tokio::test]
async fn documents_do_not_block_each_other() {
    let coordinator = test_coordinator().await;
    let a = doc_id("left");
    let b = doc_id("right");
    let held = coordinator.begin_mutation_or_create(&a, json!(0)).await.unwrap();

    // Completes while "left" is still leased.
    let other = coordinator.begin_mutation_or_create(&b, json!(0)).await.unwrap();
    coordinator.abort(&b, other.lease()).await.unwrap();
    coordinator.abort(&a, held.lease()).await.unwrap();
}
