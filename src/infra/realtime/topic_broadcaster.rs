//! In-process topic relay backed by one `tokio::sync::broadcast` channel per
//! topic.

use crate::domain::models::realtime::BandEvent;
use crate::domain::ports::EventBroadcaster;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

pub struct TopicBroadcaster {
    capacity: usize,
    topics: RwLock<HashMap<String, broadcast::Sender<BandEvent>>>,
}

impl TopicBroadcaster {
    /// `capacity` is the per-topic buffer; slow subscribers that fall further
    /// behind skip the missed events.
    pub fn new(capacity: usize) -> Self {
        Self { capacity, topics: RwLock::new(HashMap::new()) }
    }

    pub async fn topic_count(&self) -> usize {
        self.topics.read().await.len()
    }
}

#[async_trait]
impl EventBroadcaster for TopicBroadcaster {
    async fn publish(&self, topic: &str, event: BandEvent) -> usize {
        let mut topics = self.topics.write().await;
        // Drop channels nobody listens to anymore.
        topics.retain(|_, tx| tx.receiver_count() > 0);

        let Some(tx) = topics.get(topic) else {
            debug!(topic = %topic, event = %event.event, "No subscribers for topic");
            return 0;
        };

        let delivered = tx.send(event).unwrap_or(0);
        debug!(topic = %topic, delivered, "Published event");
        delivered
    }

    async fn subscribe(&self, topic: &str) -> broadcast::Receiver<BandEvent> {
        let mut topics = self.topics.write().await;
        let tx = topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn delivers_only_to_subscribers_of_the_topic() {
        let relay = TopicBroadcaster::new(16);
        let mut a = relay.subscribe("band-a").await;
        let mut b = relay.subscribe("band-b").await;

        let reached = relay.publish("band-a", BandEvent::new("rehearsal_created", "a", json!({}))).await;
        assert_eq!(reached, 1);

        assert_eq!(a.recv().await.unwrap().band_id, "a");
        assert!(b.try_recv().is_err());
    }

    #[tokio::test]
    async fn prunes_topics_without_receivers() {
        let relay = TopicBroadcaster::new(16);
        let rx = relay.subscribe("band-a").await;
        drop(rx);

        let reached = relay.publish("band-a", BandEvent::new("member_added", "a", json!({}))).await;
        assert_eq!(reached, 0);
        assert_eq!(relay.topic_count().await, 0);
    }
}
