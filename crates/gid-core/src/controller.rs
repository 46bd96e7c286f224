//! Conversation flow between input, storage, the answering service and the display
//!
//! A fresh session starts in [`ConversationState::AwaitingCity`]: the first
//! thing the user types is taken as the destination city. Every later
//! submission goes out with the city currently known, and the service may
//! answer with a different one that then replaces it.

use tracing::{debug, info, warn};

use crate::client::{AnswerClient, AskRequest};
use crate::display::DisplaySink;
use crate::error::Result;
use crate::render::{escape_html, render};
use crate::state::{Message, Role, Session};
use crate::store::{is_blocked_city, KeyValueStore, SessionStore};

pub const DEFAULT_GREETING: &str =
    "Hi! 👋 I'm your AI travel guide. Which city are you planning to visit?";
pub const DEFAULT_FALLBACK: &str = "Sorry, something went wrong. Please try again.";
pub const CACHE_CLEARED: &str = "Cache cleared";
pub const CACHE_CLEAR_FAILED: &str = "Failed to clear the cache";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    AwaitingCity,
    Chatting,
}

pub struct ChatController<S, C, D> {
    store: SessionStore<S>,
    client: C,
    sink: D,
    session: Session,
    state: ConversationState,
    greeting: String,
    fallback: String,
}

impl<S, C, D> ChatController<S, C, D>
where
    S: KeyValueStore,
    C: AnswerClient,
    D: DisplaySink,
{
    /// Restores the persisted session; nothing is shown until [`start`](Self::start).
    pub fn new(mut store: SessionStore<S>, client: C, sink: D) -> Self {
        let session = store.restore();
        let state = if session.is_first_message() {
            ConversationState::AwaitingCity
        } else {
            ConversationState::Chatting
        };

        debug!(
            messages = session.transcript.len(),
            city = ?session.current_city,
            ?state,
            "chat controller initialized"
        );

        Self {
            store,
            client,
            sink,
            session,
            state,
            greeting: DEFAULT_GREETING.to_string(),
            fallback: DEFAULT_FALLBACK.to_string(),
        }
    }

    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn sink(&self) -> &D {
        &self.sink
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn into_store(self) -> SessionStore<S> {
        self.store
    }

    /// Replays the restored transcript, or greets when there is none.
    pub fn start(&mut self) {
        if self.session.transcript.is_empty() {
            self.greet();
            return;
        }

        for message in &self.session.transcript {
            let html = match message.role {
                Role::User => escape_html(&message.content),
                Role::Assistant => render(&message.content),
            };
            self.sink.append(message.role, &html);
        }
        self.sink.show_city(self.session.current_city.as_deref());
    }

    /// Sends one user message and shows the reply.
    ///
    /// Remote failures are shown as the fallback reply and are not
    /// returned; only storage errors are. Input is re-enabled on every path.
    pub async fn submit(&mut self, text: &str) -> Result<()> {
        let question = text.trim();
        if question.is_empty() {
            return Ok(());
        }

        self.sink.append(Role::User, &escape_html(question));
        self.sink.set_busy(true);
        let outcome = self.exchange(question).await;
        self.sink.set_busy(false);
        outcome
    }

    /// Wipes the session and starts over from the greeting.
    pub fn clear_chat(&mut self) -> Result<()> {
        self.store.clear()?;
        self.session = Session::default();
        self.state = ConversationState::AwaitingCity;
        self.sink.clear();
        self.sink.show_city(None);
        self.greet();
        info!("chat cleared");
        Ok(())
    }

    pub async fn clear_cache(&mut self) {
        match self.client.clear_cache().await {
            Ok(()) => self.sink.notify(CACHE_CLEARED),
            Err(e) => {
                warn!(error = %e, "clear-cache failed");
                self.sink.notify(CACHE_CLEAR_FAILED);
            }
        }
    }

    // The reply is shown and committed before any storage write, so a
    // failing store never hides an answer. The first storage error wins.
    async fn exchange(&mut self, question: &str) -> Result<()> {
        let chosen = if self.state == ConversationState::AwaitingCity {
            self.choose_city(question)
        } else {
            Ok(())
        };

        let request = AskRequest {
            question: question.to_string(),
            city: self.session.current_city.clone(),
            chat_history: self.session.transcript.clone(),
        };

        let response = match self.client.ask(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "ask failed");
                let html = render(&self.fallback);
                self.sink.append(Role::Assistant, &html);
                return chosen;
            }
        };

        self.sink.append(Role::Assistant, &render(&response.answer));
        self.session.transcript.push(Message::user(question));
        self.session.transcript.push(Message::assistant(response.answer));

        let detected = self.apply_detected_city(response.detected_city.as_deref());
        let saved = self.store.save(&self.session.transcript);
        chosen.and(detected).and(saved)
    }

    // The city is adopted for this session even if persisting it fails.
    fn choose_city(&mut self, city: &str) -> Result<()> {
        self.state = ConversationState::Chatting;

        if is_blocked_city(city) {
            warn!(city, "first message is a placeholder, not a city");
            return Ok(());
        }

        info!(city, "destination chosen");
        self.session.current_city = Some(city.to_string());
        self.sink.show_city(Some(city));
        self.store.set_city(city)
    }

    fn apply_detected_city(&mut self, detected: Option<&str>) -> Result<()> {
        let Some(city) = detected.map(str::trim).filter(|c| !c.is_empty()) else {
            return Ok(());
        };

        if is_blocked_city(city) || self.session.current_city.as_deref() == Some(city) {
            return Ok(());
        }

        info!(from = ?self.session.current_city, to = city, "city changed");
        self.session.current_city = Some(city.to_string());
        self.sink.show_city(Some(city));
        self.store.set_city(city)
    }

    fn greet(&mut self) {
        let html = render(&self.greeting);
        self.sink.append(Role::Assistant, &html);
    }
}
