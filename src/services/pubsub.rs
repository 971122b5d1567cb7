//! The `reroute:{driver_id}` channel: one publisher (GPS workers) and
//! one subscriber per open driver session.

use redis::aio::{ConnectionManager, PubSub};
use redis::{Client, RedisResult};
use tracing::warn;

use crate::defaults::REROUTE_CHANNEL_PREFIX;
use crate::types::ServerFrame;

pub fn channel_name(driver_id: &str) -> String {
    format!("{REROUTE_CHANNEL_PREFIX}:{driver_id}")
}

/// Publish a `route_updated` event. Failure is logged but never
/// propagated — the GPS worker's return value is unaffected.
pub async fn publish_route_updated(redis: &Option<ConnectionManager>, driver_id: &str, frame: &ServerFrame) {
    let Some(mut conn) = redis.clone() else { return };
    let Ok(payload) = serde_json::to_string(frame) else {
        warn!(%driver_id, "failed to serialize route_updated frame");
        return;
    };
    let result: RedisResult<i64> = redis::cmd("PUBLISH")
        .arg(channel_name(driver_id))
        .arg(payload)
        .query_async(&mut conn)
        .await;
    if let Err(e) = result {
        warn!(%driver_id, error = %e, "failed to publish route_updated event");
    }
}

/// Open a dedicated subscription connection for a driver's session.
/// Each session needs its own connection: pub/sub puts a Redis
/// connection into a mode that can't share a `ConnectionManager`.
pub async fn subscribe(client: &Client, driver_id: &str) -> RedisResult<PubSub> {
    let mut pubsub = client.get_async_connection().await?.into_pubsub();
    pubsub.subscribe(channel_name(driver_id)).await?;
    Ok(pubsub)
}
