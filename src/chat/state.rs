// Chat session state and the reducer that owns every transition on it

use log::debug;
use std::collections::HashMap;

use crate::error::ChatError;
use crate::models::{Conversation, Message, SendStatus, User, UserId, UserStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetCurrentUser(String),
    UpdateUserStatus { id: UserId, status: UserStatus },
    SetActiveConversation(UserId),
    ClearError,
    SendPending,
    SendFulfilled(Message),
    SendRejected(ChatError),
}

/// Snapshot of everything the UI renders from.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatState {
    pub users: Vec<User>,
    pub conversations: HashMap<UserId, Conversation>,
    pub current_user: String,
    pub active_conversation: Option<UserId>,
    pub status: SendStatus,
    pub error: Option<String>,
}

impl ChatState {
    pub fn new(users: Vec<User>, current_user: &str) -> Self {
        ChatState {
            users,
            conversations: HashMap::new(),
            current_user: current_user.to_string(),
            active_conversation: None,
            status: SendStatus::Idle,
            error: None,
        }
    }

    pub fn reduce(&mut self, action: Action) {
        debug!("Reducing action: {:?}", action);
        match action {
            Action::SetCurrentUser(name) => {
                self.current_user = name;
            }
            Action::UpdateUserStatus { id, status } => {
                if let Some(user) = self.users.iter_mut().find(|u| u.id == id) {
                    user.status = status;
                }
            }
            Action::SetActiveConversation(id) => {
                self.active_conversation = Some(id);
                if let Some(conversation) = self.conversations.get_mut(&id) {
                    conversation.unread_count = 0;
                }
            }
            Action::ClearError => {
                self.error = None;
            }
            Action::SendPending => {
                self.status = SendStatus::Loading;
                self.error = None;
            }
            Action::SendFulfilled(message) => {
                self.status = SendStatus::Idle;
                let recipient = message.recipient;
                let is_active = self.active_conversation == Some(recipient);
                let conversation = self.conversations.entry(recipient).or_default();
                conversation.messages.push(message);
                if !is_active {
                    conversation.unread_count += 1;
                }
            }
            Action::SendRejected(error) => {
                self.status = SendStatus::Idle;
                self.error = Some(error.to_string());
            }
        }
    }

    pub fn is_sending(&self) -> bool {
        self.status == SendStatus::Loading
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn active_user(&self) -> Option<&User> {
        self.active_conversation.and_then(|id| self.user(id))
    }

    pub fn conversation(&self, id: UserId) -> Option<&Conversation> {
        self.conversations.get(&id)
    }

    pub fn unread_count(&self, id: UserId) -> u32 {
        self.conversation(id).map(|c| c.unread_count).unwrap_or(0)
    }

    /// Messages of the active conversation, empty when none is active or
    /// nothing has been sent to it yet.
    pub fn active_messages(&self) -> &[Message] {
        self.active_conversation
            .and_then(|id| self.conversation(id))
            .map(|c| c.messages.as_slice())
            .unwrap_or(&[])
    }
}
