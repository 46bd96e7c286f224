//! UI-agnostic conversation state types
//!
//! These types are shared between the session store, the controller and
//! any front end. None of them touch storage or a display.

use serde::{Deserialize, Serialize};

/// A chat message in the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Everything one client session knows about its conversation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub transcript: Vec<Message>,
    pub current_city: Option<String>,
}

impl Session {
    /// True until the first exchange has been committed to the transcript
    pub fn is_first_message(&self) -> bool {
        self.transcript.is_empty()
    }
}
