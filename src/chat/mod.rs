// Chat store
// Owns the session state, publishes snapshots to subscribers and runs the
// guarded asynchronous send.

pub mod state;
pub mod transport;

use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::ChatError;
use crate::models::{Message, User, UserId, UserStatus};

pub use state::{Action, ChatState};
pub use transport::{OutgoingMessage, SimulatedTransport, Transport};

/// How a call to [`ChatStore::send_message`] settled.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Another send was in flight; nothing changed.
    Dropped,
    Sent(Message),
    Failed(ChatError),
}

/// Proof that the single in-flight slot is held. [`ChatStore::complete`]
/// settles it; a ticket dropped before that settles as a generic failure, so
/// the slot is freed exactly once either way.
#[derive(Debug)]
#[must_use]
pub struct SendTicket {
    recipient: UserId,
    sender: String,
    state: Arc<watch::Sender<ChatState>>,
    settled: bool,
}

impl SendTicket {
    fn settle(mut self, action: Action) {
        self.settled = true;
        self.state.send_modify(|s| s.reduce(action));
    }
}

impl Drop for SendTicket {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Send to {} abandoned before it settled", self.recipient);
            self.state
                .send_modify(|s| s.reduce(Action::SendRejected(ChatError::SendFailed(None))));
        }
    }
}

pub struct ChatStore {
    state: Arc<watch::Sender<ChatState>>,
    transport: Arc<dyn Transport>,
}

impl ChatStore {
    pub fn new(users: Vec<User>, current_user: &str, transport: Arc<dyn Transport>) -> Self {
        let (state, _) = watch::channel(ChatState::new(users, current_user));
        ChatStore {
            state: Arc::new(state),
            transport,
        }
    }

    pub fn snapshot(&self) -> ChatState {
        self.state.borrow().clone()
    }

    /// Receivers observe a new snapshot after every transition.
    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.state.subscribe()
    }

    pub fn dispatch(&self, action: Action) {
        self.state.send_modify(|s| s.reduce(action));
    }

    pub fn set_current_user(&self, name: &str) {
        self.dispatch(Action::SetCurrentUser(name.to_string()));
    }

    pub fn update_user_status(&self, id: UserId, status: UserStatus) {
        self.dispatch(Action::UpdateUserStatus { id, status });
    }

    pub fn set_active_conversation(&self, user_id: UserId) {
        self.dispatch(Action::SetActiveConversation(user_id));
    }

    pub fn clear_error(&self) {
        self.dispatch(Action::ClearError);
    }

    /// Claims the in-flight slot and applies the pending transition, or
    /// returns `None` without touching state when the slot is taken.
    pub fn try_admit(&self, recipient: UserId) -> Option<SendTicket> {
        let mut ticket = None;
        self.state.send_if_modified(|s| {
            if s.is_sending() {
                return false;
            }
            ticket = Some(SendTicket {
                recipient,
                sender: s.current_user.clone(),
                state: Arc::clone(&self.state),
                settled: false,
            });
            s.reduce(Action::SendPending);
            true
        });
        ticket
    }

    /// Validates, delivers and applies exactly one settling transition.
    pub async fn complete(&self, ticket: SendTicket, text: String) -> SendOutcome {
        let result = self.deliver(&ticket, text).await;
        match result {
            Ok(message) => {
                info!("Message {} delivered to {}", message.id, ticket.recipient);
                ticket.settle(Action::SendFulfilled(message.clone()));
                SendOutcome::Sent(message)
            }
            Err(e) => {
                warn!("Send to {} failed: {}", ticket.recipient, e);
                ticket.settle(Action::SendRejected(e.clone()));
                SendOutcome::Failed(e)
            }
        }
    }

    async fn deliver(&self, ticket: &SendTicket, text: String) -> Result<Message, ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::empty_message());
        }
        self.transport
            .deliver(OutgoingMessage {
                sender: ticket.sender.clone(),
                recipient: ticket.recipient,
                text,
            })
            .await
    }

    pub async fn send_message(&self, recipient: UserId, text: &str) -> SendOutcome {
        match self.try_admit(recipient) {
            Some(ticket) => self.complete(ticket, text.to_string()).await,
            None => {
                info!("Dropping send to {}: another send is in flight", recipient);
                SendOutcome::Dropped
            }
        }
    }

    /// Fire-and-forget send. Admission is decided before this returns; the
    /// rest runs on a spawned task that always settles.
    pub fn dispatch_send(self: &Arc<Self>, recipient: UserId, text: &str) -> Option<JoinHandle<SendOutcome>> {
        let Some(ticket) = self.try_admit(recipient) else {
            info!("Dropping send to {}: another send is in flight", recipient);
            return None;
        };
        debug!("Send to {} admitted", recipient);
        let store = Arc::clone(self);
        let text = text.to_string();
        Some(tokio::spawn(async move { store.complete(ticket, text).await }))
    }
}
