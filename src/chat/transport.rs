// Outbound delivery seam. Only the in-process simulation lives here.

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use std::time::Duration;

use crate::error::ChatError;
use crate::models::{Message, MessageIdGenerator, UserId};

/// A send request after it has passed admission and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub sender: String,
    pub recipient: UserId,
    pub text: String,
}

/// What a backend has to provide for the store to send through it.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, outgoing: OutgoingMessage) -> Result<Message, ChatError>;
}

/// Waits a fixed latency, then accepts every message.
#[derive(Debug)]
pub struct SimulatedTransport {
    latency: Duration,
    ids: MessageIdGenerator,
}

impl SimulatedTransport {
    pub const DEFAULT_LATENCY: Duration = Duration::from_millis(500);

    pub fn new(latency: Duration) -> Self {
        SimulatedTransport {
            latency,
            ids: MessageIdGenerator::new(),
        }
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LATENCY)
    }
}

#[async_trait]
impl Transport for SimulatedTransport {
    async fn deliver(&self, outgoing: OutgoingMessage) -> Result<Message, ChatError> {
        tokio::time::sleep(self.latency).await;

        let message = Message {
            id: self.ids.next_id(),
            text: outgoing.text,
            sender: outgoing.sender,
            recipient: outgoing.recipient,
            timestamp: Utc::now(),
        };
        debug!("Simulated delivery of message {} to {}", message.id, message.recipient);
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_simulated_delivery_waits_latency() {
        let transport = SimulatedTransport::new(Duration::from_millis(500));
        let started = tokio::time::Instant::now();

        let message = transport
            .deliver(OutgoingMessage {
                sender: "User".to_string(),
                recipient: 1,
                text: "hi".to_string(),
            })
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(500));
        assert_eq!(message.text, "hi");
        assert_eq!(message.sender, "User");
        assert_eq!(message.recipient, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_deliveries_get_distinct_ids() {
        let transport = SimulatedTransport::new(Duration::ZERO);
        let outgoing = OutgoingMessage {
            sender: "User".to_string(),
            recipient: 2,
            text: "x".to_string(),
        };

        let a = transport.deliver(outgoing.clone()).await.unwrap();
        let b = transport.deliver(outgoing).await.unwrap();
        assert!(b.id > a.id);
    }
}
