//! Single-process pub/sub event bus. The connected-subscriber registry is
//! owned entirely by this component (per the "global mutable state" design
//! note) and is never exposed directly; callers only see subscribe/publish.

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use registration_domain::event::{BusEventType, Envelope};

/// Default bounded capacity for a subscriber's outbound queue. Chosen to
/// absorb a burst of a few dozen events between a slow consumer's polls
/// without growing unbounded memory.
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 64;

struct Subscriber {
    id: Uuid,
    tx: mpsc::Sender<Envelope>,
}

/// In-process pub/sub keyed by topic string (`course:{id}` / `student:{id}`).
pub struct EventBus {
    topics: DashMap<String, Vec<Subscriber>>,
    capacity: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SUBSCRIBER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: DashMap::new(),
            capacity,
        }
    }

    /// Registers interest in `topic`; returns an opaque connection token and
    /// a receiver the caller should poll until cancelled.
    pub fn subscribe(&self, topic: impl Into<String>) -> (Uuid, mpsc::Receiver<Envelope>) {
        let (tx, rx) = mpsc::channel(self.capacity);
        let id = Uuid::new_v4();
        self.topics
            .entry(topic.into())
            .or_default()
            .push(Subscriber { id, tx });
        (id, rx)
    }

    pub fn unsubscribe(&self, topic: &str, id: Uuid) {
        if let Some(mut subs) = self.topics.get_mut(topic) {
            subs.retain(|s| s.id != id);
        }
    }

    /// Publishes to the envelope's course topic, and to its student topic
    /// when one is set. Delivery is best-effort per subscriber; a
    /// subscriber whose bounded queue is full is dropped, with a
    /// best-effort DISCONNECT envelope attempted in its place.
    pub fn publish(&self, envelope: Envelope) {
        self.publish_to_topic(&envelope.course_topic(), &envelope);
        if let Some(topic) = envelope.student_topic() {
            self.publish_to_topic(&topic, &envelope);
        }
    }

    fn publish_to_topic(&self, topic: &str, envelope: &Envelope) {
        let Some(mut subs) = self.topics.get_mut(topic) else {
            return;
        };
        subs.retain_mut(|sub| match sub.tx.try_send(envelope.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(topic, subscriber = %sub.id, "subscriber queue full, disconnecting");
                let disconnect = Envelope::new(
                    BusEventType::Disconnect,
                    envelope.course_id.clone(),
                    envelope.student_id,
                    serde_json::json!({ "reason": "queue_full" }),
                );
                let _ = sub.tx.try_send(disconnect);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.get(topic).map(|s| s.len()).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn subscriber_receives_published_envelope_on_matching_topic() {
        let bus = EventBus::new();
        let (_id, mut rx) = bus.subscribe("course:CS101");

        bus.publish(Envelope::new(
            BusEventType::SeatBooked,
            "CS101",
            None,
            json!({ "seatNumber": "A1" }),
        ));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.course_id, "CS101");
    }

    #[tokio::test]
    async fn unsubscribed_listener_receives_nothing_further() {
        let bus = EventBus::new();
        let (id, mut rx) = bus.subscribe("course:CS101");
        bus.unsubscribe("course:CS101", id);

        bus.publish(Envelope::new(BusEventType::SeatBooked, "CS101", None, json!({})));

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn events_on_same_topic_preserve_publish_order() {
        let bus = EventBus::new();
        let (_id, mut rx) = bus.subscribe("course:CS101");

        bus.publish(Envelope::new(BusEventType::SeatBooked, "CS101", None, json!({"seq": 1})));
        bus.publish(Envelope::new(BusEventType::SeatReleased, "CS101", None, json!({"seq": 2})));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.event_type, BusEventType::SeatBooked);
        assert_eq!(second.event_type, BusEventType::SeatReleased);
    }
}
