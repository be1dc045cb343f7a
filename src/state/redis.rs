use super::{
    LAST_ENQUEUE_TS_KEY, LAST_ERROR_KEY, LAST_JOB_TS_KEY, LAST_STATUS_KEY, QUEUE_KEY, SharedState,
    StateSnapshot, counters_from_values, format_timestamp,
};
use crate::error::{Error, Result};
use crate::job::JobHeartbeat;
use crate::metrics::snapshot::{Counter, Counters};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use redis::aio::{ConnectionManager, MultiplexedConnection};

/// Redis-backed shared state.
///
/// Regular commands go through a reconnecting [`ConnectionManager`]. The
/// blocking `BLPOP` runs on its own multiplexed connection so a parked
/// consumer never stalls counter or heartbeat writes.
#[derive(Clone)]
pub struct RedisState {
    commands: ConnectionManager,
    blocking: MultiplexedConnection,
}

impl RedisState {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let commands = ConnectionManager::new(client.clone()).await?;
        let blocking = client.get_multiplexed_async_connection().await?;
        log::debug!("Connected to shared state at {}", redis_url);

        Ok(Self { commands, blocking })
    }
}

#[async_trait]
impl SharedState for RedisState {
    async fn push_job(&self, payload: &str) -> Result<()> {
        let mut conn = self.commands.clone();
        let _: u64 = conn.rpush(QUEUE_KEY, payload).await?;
        Ok(())
    }

    async fn pop_job(&self) -> Result<String> {
        let mut conn = self.blocking.clone();
        loop {
            // BLPOP with a zero timeout parks until an entry exists.
            let popped: Option<(String, String)> = redis::cmd("BLPOP")
                .arg(QUEUE_KEY)
                .arg(0)
                .query_async(&mut conn)
                .await?;
            if let Some((_, payload)) = popped {
                return Ok(payload);
            }
        }
    }

    async fn increment(&self, counter: Counter) -> Result<u64> {
        let mut conn = self.commands.clone();
        let raw: i64 = conn.incr(counter.key(), 1).await?;
        u64::try_from(raw).map_err(|_| Error::CorruptState {
            key: counter.key().to_string(),
            value: raw.to_string(),
        })
    }

    async fn counters(&self) -> Result<Counters> {
        let mut conn = self.commands.clone();
        let keys = Counter::ALL.map(|c| c.key());
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys[..])
            .query_async(&mut conn)
            .await?;
        counters_from_values([
            values.first().and_then(|v| v.as_deref()),
            values.get(1).and_then(|v| v.as_deref()),
            values.get(2).and_then(|v| v.as_deref()),
        ])
    }

    async fn record_job_heartbeat(&self, heartbeat: &JobHeartbeat) -> Result<()> {
        let mut conn = self.commands.clone();
        let fields = [
            (LAST_STATUS_KEY, heartbeat.status.as_str().to_string()),
            (LAST_JOB_TS_KEY, format_timestamp(heartbeat.ts)),
            (LAST_ERROR_KEY, heartbeat.error.clone()),
        ];
        let _: () = conn.mset(&fields[..]).await?;
        Ok(())
    }

    async fn record_enqueue_heartbeat(&self, ts: DateTime<Utc>) -> Result<()> {
        let mut conn = self.commands.clone();
        let _: () = conn.set(LAST_ENQUEUE_TS_KEY, format_timestamp(ts)).await?;
        Ok(())
    }

    async fn snapshot(&self) -> Result<StateSnapshot> {
        let mut conn = self.commands.clone();
        let keys = [
            Counter::Fetch.key(),
            Counter::Success.key(),
            Counter::Error.key(),
            LAST_STATUS_KEY,
            LAST_ERROR_KEY,
            LAST_JOB_TS_KEY,
            LAST_ENQUEUE_TS_KEY,
        ];
        let mut values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys[..])
            .query_async(&mut conn)
            .await?;
        values.resize(keys.len(), None);

        let counters = counters_from_values([
            values[0].as_deref(),
            values[1].as_deref(),
            values[2].as_deref(),
        ])?;
        let mut rest = values.drain(3..);

        Ok(StateSnapshot {
            counters,
            last_status: rest.next().flatten(),
            last_error: rest.next().flatten(),
            last_job_ts: rest.next().flatten(),
            last_enqueue_ts: rest.next().flatten(),
        })
    }
}
