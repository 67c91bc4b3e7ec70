// Common test utilities for integration tests

use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use log::LevelFilter;

use murmur::chat::{ChatStore, OutgoingMessage, SimulatedTransport, Transport};
use murmur::error::ChatError;
use murmur::models::{Message, User, UserStatus};

// Initialize logging once
static INIT_LOGGER: Once = Once::new();

pub const LATENCY: Duration = Duration::from_millis(500);

/// Set up the logger for the tests
pub fn setup_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();
    });
}

/// Alice(1, online) and Bob(2, offline)
pub fn seed_users() -> Vec<User> {
    vec![
        User::new(1, "Alice", UserStatus::Online),
        User::new(2, "Bob", UserStatus::Offline),
    ]
}

pub fn setup_store() -> Arc<ChatStore> {
    setup_logging();
    Arc::new(ChatStore::new(
        seed_users(),
        "User",
        Arc::new(SimulatedTransport::new(LATENCY)),
    ))
}

pub fn setup_store_with(transport: Arc<dyn Transport>) -> Arc<ChatStore> {
    setup_logging();
    Arc::new(ChatStore::new(seed_users(), "User", transport))
}

/// Rejects every message after the usual latency, optionally with a reason.
pub struct FailingTransport {
    pub reason: Option<String>,
}

#[async_trait]
impl Transport for FailingTransport {
    async fn deliver(&self, _outgoing: OutgoingMessage) -> Result<Message, ChatError> {
        tokio::time::sleep(LATENCY).await;
        Err(ChatError::SendFailed(self.reason.clone()))
    }
}
