//! End-to-end tests for group rendezvous and barrier synchronization.
//!
//! Each test simulates a group of worker processes as tokio tasks sharing
//! one in-memory store, the same shape a deployment has with a real store:
//! every worker holds its own registry/barrier handles and talks only to
//! the store.

use std::sync::Arc;

use muster::{
    BarrierCounter, CoordinationError, DeterministicCoordinationStore, NameRegistry, NameTable,
    PrefixStore, StoreError, TimeoutConfig, TimeoutStore,
};

#[tokio::test]
async fn test_fixed_group_rendezvous_then_barrier() {
    let _ = tracing_subscriber::fmt().with_env_filter("muster=debug").try_init();
    let store = Arc::new(DeterministicCoordinationStore::new());

    let mut workers = Vec::new();
    for (id, name) in [(0u32, "a"), (1, "b"), (2, "c")] {
        let store = store.clone();
        workers.push(tokio::spawn(async move {
            let registry = NameRegistry::new(store.clone());
            let roster = registry.collect_names(id, name, 3).await?;

            // Every worker contributes its id + 1; the group total is 6.
            let barrier = BarrierCounter::new(store);
            let total = barrier.sync_call_count(3, i64::from(id) + 1).await?;
            Ok::<_, CoordinationError>((roster, total))
        }));
    }

    let expected: NameTable = [("a".to_string(), 0), ("b".to_string(), 1), ("c".to_string(), 2)]
        .into_iter()
        .collect();

    for worker in workers {
        let (roster, total) = worker.await.unwrap().unwrap();
        assert_eq!(roster, expected);
        assert_eq!(total, 6);
    }
}

#[tokio::test]
async fn test_dynamic_group_grows_one_join_at_a_time() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt().with_env_filter("muster=debug").try_init();
    let store = Arc::new(DeterministicCoordinationStore::new());
    let registry = NameRegistry::new(store);

    let mut expected = NameTable::new();
    for (id, name) in [(0u32, "trainer"), (1, "evaluator"), (2, "logger")] {
        let roster = registry.collect_current_names(id, name).await?;
        expected.insert(name.to_string(), id);
        assert_eq!(roster, expected, "each join sees all earlier members plus itself");
    }
    Ok(())
}

#[tokio::test]
async fn test_two_groups_isolated_by_prefix() {
    let backing = Arc::new(DeterministicCoordinationStore::new());

    // Both groups use the same worker ids and the same (first) barrier
    // epoch; only the key prefixes keep them apart.
    let mut workers = Vec::new();
    for (prefix, contribution) in [("alpha/", 10i64), ("beta/", 1000)] {
        for id in 0u32..2 {
            let backing = backing.clone();
            workers.push(tokio::spawn(async move {
                let store = Arc::new(PrefixStore::new(backing, prefix));
                let registry = NameRegistry::new(store.clone());
                let name = format!("worker{}", id);
                let roster = registry.collect_names(id, &name, 2).await?;
                assert_eq!(roster.len(), 2);

                let barrier = BarrierCounter::new(store);
                barrier.sync_call_count(2, contribution).await
            }));
        }
    }

    let mut totals = Vec::new();
    for worker in workers {
        totals.push(worker.await.unwrap().unwrap());
    }

    // Sums stay within each group: 2*10 and 2*1000, never a mix.
    totals.sort_unstable();
    assert_eq!(totals, [20, 20, 2000, 2000]);
}

#[tokio::test]
async fn test_missing_worker_surfaces_store_timeout() {
    let backing = Arc::new(DeterministicCoordinationStore::new());

    // Two of three workers arrive; the bounded store turns the eternal
    // wait into a timeout error instead of a hang.
    let mut workers = Vec::new();
    for _ in 0..2 {
        let backing = backing.clone();
        workers.push(tokio::spawn(async move {
            let store = Arc::new(TimeoutStore::new(backing, TimeoutConfig::with_timeout_ms(100)));
            let barrier = BarrierCounter::new(store);
            barrier.sync_call_count(3, 1).await
        }));
    }

    for worker in workers {
        let err = worker.await.unwrap().unwrap_err();
        match err {
            CoordinationError::Storage {
                source: StoreError::Timeout { duration_ms },
            } => assert_eq!(duration_ms, 100),
            other => panic!("expected Storage(Timeout), got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_rendezvous_timeout_when_peer_never_publishes() {
    let backing = Arc::new(DeterministicCoordinationStore::new());
    let store = Arc::new(TimeoutStore::new(backing, TimeoutConfig::with_timeout_ms(100)));

    let registry = NameRegistry::new(store);
    let err = registry.collect_names(0, "lonely", 2).await.unwrap_err();
    assert!(matches!(
        err,
        CoordinationError::Storage {
            source: StoreError::Timeout { .. }
        }
    ));
}

#[tokio::test]
async fn test_mixed_rounds_keep_rosters_and_sums_consistent() {
    let _ = tracing_subscriber::fmt().with_env_filter("muster=debug").try_init();
    let store = Arc::new(DeterministicCoordinationStore::new());

    let mut workers = Vec::new();
    for (id, name) in [(0u32, "north"), (1, "south")] {
        let store = store.clone();
        workers.push(tokio::spawn(async move {
            let registry = NameRegistry::new(store.clone());
            let roster = registry.collect_names(id, name, 2).await?;

            let barrier = BarrierCounter::new(store);
            // Same call sequence on both workers; sums differ per round.
            let first = barrier.sync_call_count(2, i64::from(id)).await?;
            let second = barrier.sync_call_count(2, 100).await?;
            Ok::<_, CoordinationError>((roster.len(), first, second))
        }));
    }

    for worker in workers {
        let (roster_len, first, second) = worker.await.unwrap().unwrap();
        assert_eq!(roster_len, 2);
        assert_eq!(first, 1, "round one sums contributions 0 and 1");
        assert_eq!(second, 200, "round two sums contributions 100 and 100");
    }
}
