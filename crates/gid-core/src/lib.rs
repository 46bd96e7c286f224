pub mod client;
pub mod controller;
pub mod display;
pub mod error;
pub mod render;
pub mod state;
pub mod store;

// Re-export main types for convenience
pub use client::{AnswerClient, AskRequest, AskResponse, HttpAnswerClient};
pub use controller::{ChatController, ConversationState};
pub use display::DisplaySink;
pub use error::{Error, Result};
pub use render::{escape_html, render};
pub use state::{Message, Role, Session};
pub use store::{FileStore, KeyValueStore, MemoryStore, SessionStore};
