//! Redis-backed store

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::time::Duration;

use super::{ttl_secs, KeyValueStore, StoreResult};

/// Keys scanned per SCAN round trip
const SCAN_COUNT: usize = 100;

/// [`KeyValueStore`] over a multiplexed, auto-reconnecting Redis connection
#[derive(Clone)]
pub struct RedisStore {
    redis: ConnectionManager,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("redis", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;
        Ok(Self { redis })
    }

    fn conn(&self) -> ConnectionManager {
        self.redis.clone()
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn ping(&self) -> StoreResult<()> {
        let _: String = redis::cmd("PING").query_async(&mut self.conn()).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut self.conn()).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_secs(ttl))
            .query_async(&mut self.conn())
            .await?;
        Ok(())
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs(ttl))
            .query_async(&mut self.conn())
            .await?;
        Ok(reply.is_some())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let count: i64 = redis::cmd("EXISTS").arg(key).query_async(&mut self.conn()).await?;
        Ok(count > 0)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        let updated: i64 = redis::cmd("EXPIRE")
            .arg(key)
            .arg(ttl_secs(ttl))
            .query_async(&mut self.conn())
            .await?;
        Ok(updated == 1)
    }

    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        let secs: i64 = redis::cmd("TTL").arg(key).query_async(&mut self.conn()).await?;
        // -2: missing, -1: no expiry
        Ok(u64::try_from(secs).ok().map(Duration::from_secs))
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let removed: i64 = redis::cmd("DEL").arg(key).query_async(&mut self.conn()).await?;
        Ok(removed > 0)
    }

    async fn rpush(&self, key: &str, values: &[String]) -> StoreResult<usize> {
        if values.is_empty() {
            return self.llen(key).await;
        }
        let mut cmd = redis::cmd("RPUSH");
        cmd.arg(key);
        for value in values {
            cmd.arg(value);
        }
        let len: usize = cmd.query_async(&mut self.conn()).await?;
        Ok(len)
    }

    async fn lpop(&self, key: &str) -> StoreResult<Option<String>> {
        let value: Option<String> = redis::cmd("LPOP").arg(key).query_async(&mut self.conn()).await?;
        Ok(value)
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>> {
        let values: Vec<String> = redis::cmd("LRANGE")
            .arg(key)
            .arg(start as i64)
            .arg(stop as i64)
            .query_async(&mut self.conn())
            .await?;
        Ok(values)
    }

    async fn llen(&self, key: &str) -> StoreResult<usize> {
        let len: usize = redis::cmd("LLEN").arg(key).query_async(&mut self.conn()).await?;
        Ok(len)
    }

    async fn zadd(&self, key: &str, members: &[String]) -> StoreResult<usize> {
        if members.is_empty() {
            return Ok(0);
        }
        let mut cmd = redis::cmd("ZADD");
        cmd.arg(key);
        for member in members {
            cmd.arg(0).arg(member);
        }
        let added: usize = cmd.query_async(&mut self.conn()).await?;
        Ok(added)
    }

    async fn zrangebylex(
        &self,
        key: &str,
        min: &str,
        max: &str,
        limit: Option<usize>,
    ) -> StoreResult<Vec<String>> {
        let mut cmd = redis::cmd("ZRANGEBYLEX");
        cmd.arg(key).arg(min).arg(max);
        if let Some(count) = limit {
            cmd.arg("LIMIT").arg(0).arg(count);
        }
        let members: Vec<String> = cmd.query_async(&mut self.conn()).await?;
        Ok(members)
    }

    async fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let pattern = format!("{}*", prefix);
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let (next_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut self.conn())
                .await?;

            keys.extend(batch);
            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}
