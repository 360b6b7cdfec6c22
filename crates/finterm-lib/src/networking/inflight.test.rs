use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;

#[tokio::test]
async fn test_concurrent_runs_share_one_execution() {
    let registry: InflightRegistry<Arc<String>> = InflightRegistry::new();
    let starts = Arc::new(AtomicUsize::new(0));
    let (release_tx, release_rx) = oneshot::channel::<()>();

    let first = {
        let registry = registry.clone();
        let starts = starts.clone();
        tokio::spawn(async move {
            registry
                .run("GET:https://x/a".to_string(), move || {
                    starts.fetch_add(1, Ordering::SeqCst);
                    async move {
                        let _ = release_rx.await;
                        Arc::new("payload".to_string())
                    }
                    .boxed()
                })
                .await
        })
    };

    // Let the first task register before the second joins
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(registry.contains("GET:https://x/a"));

    let second = {
        let registry = registry.clone();
        let starts = starts.clone();
        tokio::spawn(async move {
            registry
                .run("GET:https://x/a".to_string(), move || {
                    starts.fetch_add(1, Ordering::SeqCst);
                    async { Arc::new("other".to_string()) }.boxed()
                })
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    release_tx.send(()).unwrap();

    let a = first.await.unwrap();
    let b = second.await.unwrap();

    assert_eq!(starts.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&a, &b), "both callers observe the identical result");
    assert!(registry.is_empty(), "entry removed after settlement");
}

#[tokio::test]
async fn test_sequential_runs_do_not_share() {
    let registry: InflightRegistry<u32> = InflightRegistry::new();
    let starts = Arc::new(AtomicUsize::new(0));

    for expected in 1..=3u32 {
        let starts = starts.clone();
        let value = registry
            .run("GET:k".to_string(), move || {
                let n = starts.fetch_add(1, Ordering::SeqCst) as u32 + 1;
                async move { n }.boxed()
            })
            .await;
        assert_eq!(value, expected);
    }

    assert_eq!(starts.load(Ordering::SeqCst), 3);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_distinct_keys_run_independently() {
    let registry: InflightRegistry<&'static str> = InflightRegistry::new();

    let (a, b) = tokio::join!(
        registry.run("GET:a".to_string(), || async { "a" }.boxed()),
        registry.run("GET:b".to_string(), || async { "b" }.boxed()),
    );

    assert_eq!((a, b), ("a", "b"));
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_entry_removed_when_all_waiters_drop() {
    let registry: InflightRegistry<u32> = InflightRegistry::new();

    let pending = registry.run("GET:slow".to_string(), || {
        async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            7
        }
        .boxed()
    });

    // Poll once so the entry exists, then abandon the waiter
    let timed_out = tokio::time::timeout(Duration::from_millis(10), pending).await;
    assert!(timed_out.is_err());

    assert!(registry.is_empty(), "dropped work must not leave a stale entry");

    let value = registry.run("GET:slow".to_string(), || async { 8 }.boxed()).await;
    assert_eq!(value, 8, "a new request starts fresh work");
}
