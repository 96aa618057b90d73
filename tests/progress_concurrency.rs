//! Concurrent progress store behavior
//!
//! Many tasks hammering the same and different users must never lose writes
//! or observe a half-built record.

use scholar::progress::ProgressStore;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_updates_across_users_all_land() {
    let store = Arc::new(ProgressStore::new());
    let mut handles = Vec::new();

    for worker in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let user = format!("user-{}", worker % 4);
            for i in 0..100 {
                store.mark_completed(&user, &format!("section-{worker}-{i}"));
                store.toggle_pinned(&user, "shared-section");
                store.record_score(&user, &format!("quiz-{worker}"), i as u32);
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for u in 0..4 {
        let user = format!("user-{u}");
        // 4 workers per user, 100 unique sections each.
        assert_eq!(store.completed(&user).len(), 400);
        assert_eq!(store.scores(&user).len(), 4);
        for score in store.scores(&user).values() {
            assert_eq!(*score, 99);
        }
        // 400 toggles of the same section per user: back where it started.
        assert!(!store.is_pinned(&user, "shared-section"));
        assert!(store.last_updated(&user).is_some());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_see_consistent_snapshots_during_writes() {
    let store = Arc::new(ProgressStore::new());

    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            for i in 0..500 {
                store.mark_completed("reader-target", &format!("s-{i}"));
            }
        })
    };
    let reader = {
        let store = store.clone();
        tokio::spawn(async move {
            for _ in 0..500 {
                let snapshot = store.snapshot("reader-target");
                // A record with completions always carries a timestamp.
                if !snapshot.completed.is_empty() {
                    assert!(snapshot.last_updated.is_some());
                }
            }
        })
    };

    writer.await.unwrap();
    reader.await.unwrap();
    assert_eq!(store.completed("reader-target").len(), 500);
}
