// Pure helpers the terminal UI renders from. Nothing in here touches the
// store; everything takes a snapshot.

use chrono::{DateTime, Local, Utc};

use crate::chat::ChatState;
use crate::models::{UserId, UserStatus};

pub const SELECT_PROMPT: &str = "Select a user to start chatting";
pub const TYPE_PROMPT: &str = "Type a message...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRow {
    pub id: UserId,
    pub name: String,
    pub status: UserStatus,
    pub unread: u32,
    pub selected: bool,
}

pub fn contact_rows(state: &ChatState) -> Vec<ContactRow> {
    state
        .users
        .iter()
        .map(|user| ContactRow {
            id: user.id,
            name: user.name.clone(),
            status: user.status,
            unread: state.unread_count(user.id),
            selected: state.active_conversation == Some(user.id),
        })
        .collect()
}

/// Send is allowed only while idle, with a non-blank draft and a
/// conversation to send it to.
pub fn composer_enabled(state: &ChatState, input: &str) -> bool {
    !state.is_sending() && !input.trim().is_empty() && state.active_conversation.is_some()
}

pub fn header_title(state: &ChatState) -> String {
    if state.active_conversation.is_none() {
        return SELECT_PROMPT.to_string();
    }
    let name = state.active_user().map(|u| u.name.as_str()).unwrap_or("unknown");
    format!("Chat with {}", name)
}

pub fn composer_placeholder(state: &ChatState) -> &'static str {
    if state.active_conversation.is_some() {
        TYPE_PROMPT
    } else {
        SELECT_PROMPT
    }
}

/// Local `HH:MM` for a message timestamp.
pub fn format_time_of_day(timestamp: &DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelMode {
    /// Contacts are always visible beside the conversation.
    Docked,
    /// Contacts live in a panel toggled over the conversation.
    Overlay,
}

impl PanelMode {
    pub fn for_width(width: u16, breakpoint: u16) -> Self {
        if width < breakpoint {
            PanelMode::Overlay
        } else {
            PanelMode::Docked
        }
    }
}

/// The error notification currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorToast {
    pub message: String,
    pub shown_at: DateTime<Utc>,
}

impl ErrorToast {
    /// Reconciles the toast with the error in the latest snapshot. A new
    /// error text restarts the timer; a cleared error hides the toast.
    pub fn sync(current: Option<ErrorToast>, error: Option<&str>, now: DateTime<Utc>) -> Option<ErrorToast> {
        match (current, error) {
            (_, None) => None,
            (Some(toast), Some(text)) if toast.message == text => Some(toast),
            (_, Some(text)) => Some(ErrorToast {
                message: text.to_string(),
                shown_at: now,
            }),
        }
    }

    pub fn expired(&self, now: DateTime<Utc>, ttl_secs: u64) -> bool {
        (now - self.shown_at).num_milliseconds() >= (ttl_secs as i64) * 1000
    }
}
