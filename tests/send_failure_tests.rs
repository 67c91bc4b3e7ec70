// Send failure tests
// These tests swap in a transport that always rejects

mod common;
use common::{setup_store_with, FailingTransport};

use std::sync::Arc;

use murmur::chat::SendOutcome;
use murmur::error::ChatError;
use murmur::models::SendStatus;

/// A rejection without a reason surfaces the generic message
#[tokio::test(start_paused = true)]
async fn test_failure_without_reason() {
    let store = setup_store_with(Arc::new(FailingTransport { reason: None }));
    store.set_active_conversation(1);

    let outcome = store.send_message(1, "hi").await;
    assert_eq!(outcome, SendOutcome::Failed(ChatError::SendFailed(None)));

    let state = store.snapshot();
    assert_eq!(state.error.as_deref(), Some("Failed to send message"));
    assert_eq!(state.status, SendStatus::Idle);
    assert!(state.conversation(1).is_none());
}

/// A rejection with a reason surfaces that reason
#[tokio::test(start_paused = true)]
async fn test_failure_with_reason() {
    let store = setup_store_with(Arc::new(FailingTransport {
        reason: Some("Recipient is unreachable".to_string()),
    }));

    let handle = store.dispatch_send(2, "hello").unwrap();
    assert!(store.snapshot().is_sending());
    handle.await.unwrap();

    let state = store.snapshot();
    assert_eq!(state.error.as_deref(), Some("Recipient is unreachable"));
    assert_eq!(state.status, SendStatus::Idle);
    assert_eq!(state.unread_count(2), 0);
}

/// A new send clears the previous error as soon as it is admitted
#[tokio::test(start_paused = true)]
async fn test_retry_clears_previous_error() {
    let store = setup_store_with(Arc::new(FailingTransport { reason: None }));
    store.send_message(1, "first").await;
    assert!(store.snapshot().error.is_some());

    let handle = store.dispatch_send(1, "second").unwrap();
    assert!(store.snapshot().error.is_none());
    handle.await.unwrap();
    assert!(store.snapshot().error.is_some());
}
