// Runs against a live Redis whose crawl keys may be wiped:
// REDIS_URL=redis://localhost:6379/15 cargo test --test redis_state -- --ignored

use chrono::{TimeZone, Utc};
use crawl_monitor::job::JobHeartbeat;
use crawl_monitor::state::{
    LAST_ENQUEUE_TS_KEY, LAST_ERROR_KEY, LAST_JOB_TS_KEY, LAST_STATUS_KEY, QUEUE_KEY,
    format_timestamp,
};
use crawl_monitor::{Counter, Counters, RedisState, SharedState};
use std::collections::HashSet;
use std::time::Duration;

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379/15".to_string())
}

async fn reset(url: &str) {
    let client = redis::Client::open(url).unwrap();
    let mut conn = client.get_multiplexed_async_connection().await.unwrap();
    let keys = [
        QUEUE_KEY,
        Counter::Fetch.key(),
        Counter::Success.key(),
        Counter::Error.key(),
        LAST_STATUS_KEY,
        LAST_ERROR_KEY,
        LAST_JOB_TS_KEY,
        LAST_ENQUEUE_TS_KEY,
    ];
    let _: () = redis::cmd("DEL")
        .arg(&keys[..])
        .query_async(&mut conn)
        .await
        .unwrap();
}

#[tokio::test]
#[ignore] // needs a Redis server
async fn redis_state_round_trip() {
    let url = redis_url();
    reset(&url).await;
    let state = RedisState::connect(&url).await.unwrap();

    // Empty store reads as zero counters and absent heartbeats.
    let empty = state.snapshot().await.unwrap();
    assert_eq!(empty.counters, Counters::default());
    assert_eq!(empty.last_status, None);
    assert_eq!(empty.last_enqueue_ts, None);

    // FIFO order.
    for payload in ["first", "second", "third"] {
        state.push_job(payload).await.unwrap();
    }
    assert_eq!(state.pop_job().await.unwrap(), "first");
    assert_eq!(state.pop_job().await.unwrap(), "second");
    assert_eq!(state.pop_job().await.unwrap(), "third");

    // Blocking pop waits for a later push.
    let waiter = {
        let state = state.clone();
        tokio::spawn(async move { state.pop_job().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!waiter.is_finished());
    state.push_job("late").await.unwrap();
    let late = tokio::time::timeout(Duration::from_secs(2), waiter)
        .await
        .expect("pop woke up")
        .unwrap()
        .unwrap();
    assert_eq!(late, "late");

    // Counters.
    assert_eq!(state.increment(Counter::Fetch).await.unwrap(), 1);
    assert_eq!(state.increment(Counter::Fetch).await.unwrap(), 2);
    assert_eq!(state.increment(Counter::Success).await.unwrap(), 1);
    assert_eq!(state.increment(Counter::Error).await.unwrap(), 1);
    let counters = state.counters().await.unwrap();
    assert_eq!(
        counters,
        Counters {
            fetch_total: 2,
            success_total: 1,
            error_total: 1,
        }
    );
    assert!(counters.is_balanced());

    // Heartbeats.
    let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    state
        .record_job_heartbeat(&JobHeartbeat::error(ts, "request timed out"))
        .await
        .unwrap();
    state.record_enqueue_heartbeat(ts).await.unwrap();

    let snapshot = state.snapshot().await.unwrap();
    assert_eq!(snapshot.counters, counters);
    assert_eq!(snapshot.last_status.as_deref(), Some("error"));
    assert_eq!(snapshot.last_error.as_deref(), Some("request timed out"));
    assert_eq!(snapshot.last_job_ts, Some(format_timestamp(ts)));
    assert_eq!(snapshot.last_enqueue_ts, Some(format_timestamp(ts)));

    state.record_job_heartbeat(&JobHeartbeat::ok(ts)).await.unwrap();
    let snapshot = state.snapshot().await.unwrap();
    assert_eq!(snapshot.last_status.as_deref(), Some("ok"));
    assert_eq!(snapshot.last_error.as_deref(), Some(""));

    // Concurrent consumers never share an entry. Each has its own connection
    // so the parked BLPOPs go away with it.
    const JOBS: usize = 40;
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut consumers = Vec::new();
    for _ in 0..4 {
        let consumer = RedisState::connect(&url).await.unwrap();
        let tx = tx.clone();
        consumers.push(tokio::spawn(async move {
            while let Ok(payload) = consumer.pop_job().await {
                if tx.send(payload).is_err() {
                    break;
                }
            }
        }));
    }
    for i in 0..JOBS {
        state.push_job(&format!("job-{}", i)).await.unwrap();
    }

    let mut seen = HashSet::new();
    for _ in 0..JOBS {
        let payload = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("all jobs delivered")
            .unwrap();
        assert!(seen.insert(payload), "job delivered twice");
    }
    assert_eq!(seen.len(), JOBS);
    for consumer in consumers {
        consumer.abort();
    }
}
