//! Redis-backed place listing cache.
//!
//! Listings are stored as JSON strings under their cache key with a
//! per-entry TTL. Connections come from a `bb8` pool so concurrent handlers
//! do not serialise on a single multiplexed connection.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::redis::AsyncCommands;
use bb8_redis::{RedisConnectionManager, bb8};
use tracing::debug;

use crate::domain::Place;
use crate::domain::ports::{PlaceCache, PlaceCacheError, PlaceCacheKey};

type RedisPool = bb8::Pool<RedisConnectionManager>;

fn backend_error(err: impl std::fmt::Display) -> PlaceCacheError {
    PlaceCacheError::backend(err.to_string())
}

fn encode(places: &[Place]) -> Result<String, PlaceCacheError> {
    serde_json::to_string(places).map_err(|err| PlaceCacheError::serialization(err.to_string()))
}

fn decode(payload: &str) -> Result<Vec<Place>, PlaceCacheError> {
    serde_json::from_str(payload).map_err(|err| PlaceCacheError::serialization(err.to_string()))
}

/// Redis expiry is whole seconds; round sub-second TTLs up so they still expire.
fn ttl_seconds(ttl: Duration) -> u64 {
    let seconds = ttl.as_secs();
    if ttl.subsec_nanos() > 0 || seconds == 0 {
        seconds + 1
    } else {
        seconds
    }
}

/// [`PlaceCache`] backed by a pooled Redis connection.
#[derive(Clone)]
pub struct RedisPlaceCache {
    pool: RedisPool,
}

impl RedisPlaceCache {
    /// Build a pool of at most `pool_size` connections to `url`.
    pub async fn connect(url: &str, pool_size: u32) -> Result<Self, PlaceCacheError> {
        let manager = RedisConnectionManager::new(url).map_err(backend_error)?;
        let pool = bb8::Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .await
            .map_err(backend_error)?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: RedisPool) -> Self {
        Self { pool }
    }

    async fn connection(
        &self,
    ) -> Result<bb8::PooledConnection<'_, RedisConnectionManager>, PlaceCacheError> {
        self.pool.get().await.map_err(backend_error)
    }
}

#[async_trait]
impl PlaceCache for RedisPlaceCache {
    async fn get(&self, key: &PlaceCacheKey) -> Result<Option<Vec<Place>>, PlaceCacheError> {
        let mut conn = self.connection().await?;
        let payload: Option<String> = conn
            .get(key.as_str())
            .await
            .map_err(backend_error)?;
        debug!(key = %key, hit = payload.is_some(), "place cache lookup");
        payload.as_deref().map(decode).transpose()
    }

    async fn set(
        &self,
        key: &PlaceCacheKey,
        places: &[Place],
        ttl: Duration,
    ) -> Result<(), PlaceCacheError> {
        let payload = encode(places)?;
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(key.as_str(), payload, ttl_seconds(ttl))
            .await
            .map_err(backend_error)
    }

    async fn delete(&self, keys: &[PlaceCacheKey]) -> Result<(), PlaceCacheError> {
        if keys.is_empty() {
            return Ok(());
        }
        let names: Vec<&str> = keys.iter().map(PlaceCacheKey::as_str).collect();
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(names).await.map_err(backend_error)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rstest::rstest;

    use super::*;
    use crate::domain::{EntityId, PlaceParts};

    #[rstest]
    #[case(Duration::from_secs(300), 300)]
    #[case(Duration::from_millis(1500), 2)]
    #[case(Duration::from_millis(10), 1)]
    #[case(Duration::ZERO, 1)]
    fn ttl_rounds_up_to_whole_seconds(#[case] ttl: Duration, #[case] expected: u64) {
        assert_eq!(ttl_seconds(ttl), expected);
    }

    #[rstest]
    fn listings_survive_the_json_encoding() {
        let place = Place::new(PlaceParts {
            id: EntityId::generate(),
            name: "Lighthouse".to_owned(),
            description: "Keeper's cottage".to_owned(),
            category: EntityId::generate(),
            tags: vec!["coast".to_owned()],
            created_at: Utc::now(),
            updated_at: None,
        })
        .expect("valid place");

        let payload = encode(std::slice::from_ref(&place)).expect("encode");
        assert_eq!(decode(&payload).expect("decode"), vec![place]);
    }

    #[rstest]
    fn corrupt_payloads_are_serialisation_errors() {
        let err = decode("{not json").expect_err("corrupt payload");
        assert!(matches!(err, PlaceCacheError::Serialization { .. }));
    }
}
