use chrono::Utc;
use redis::Client as RedisClient;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;

const WINDOW_SECS: i64 = 60;

/// Fixed one-minute window per user, counted in Redis.
/// Redis being unreachable never blocks a request.
#[derive(Clone)]
pub struct RateLimiter {
    client: RedisClient,
    per_minute: u32,
}

impl RateLimiter {
    pub fn new(client: RedisClient, per_minute: u32) -> Self {
        Self { client, per_minute }
    }

    pub async fn check(&self, user_id: Uuid) -> Result<(), AppError> {
        let key = window_key(user_id, Utc::now().timestamp());
        match self.hit(&key).await {
            Ok(count) if exceeds(count, self.per_minute) => Err(AppError::RateLimited(format!(
                "Rate limit of {} messages per minute exceeded",
                self.per_minute
            ))),
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("Rate limiter unavailable, allowing request: {e}");
                Ok(())
            }
        }
    }

    async fn hit(&self, key: &str) -> Result<u64, redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let (count,): (u64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, WINDOW_SECS)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(count)
    }
}

fn window_key(user_id: Uuid, unix_secs: i64) -> String {
    format!("ratelimit:chat:{user_id}:{}", unix_secs / WINDOW_SECS)
}

fn exceeds(count: u64, per_minute: u32) -> bool {
    count > u64::from(per_minute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_key_changes_every_minute() {
        let user = Uuid::nil();
        assert_eq!(window_key(user, 120), window_key(user, 179));
        assert_ne!(window_key(user, 179), window_key(user, 180));
        assert!(window_key(user, 180).starts_with("ratelimit:chat:00000000-"));
    }

    #[test]
    fn test_limit_is_inclusive() {
        assert!(!exceeds(60, 60));
        assert!(exceeds(61, 60));
    }

    #[tokio::test]
    async fn test_unreachable_redis_fails_open() {
        let client = RedisClient::open("redis://127.0.0.1:1/").unwrap();
        let limiter = RateLimiter::new(client, 1);
        assert!(limiter.check(Uuid::new_v4()).await.is_ok());
    }
}
