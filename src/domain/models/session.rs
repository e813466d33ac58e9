#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use super::Author;
use super::Message;

/// Everything a single interactive session knows about itself. Handlers take
/// the context, act on it and hand it back; nothing else holds a copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionContext {
    pub logged_in: bool,
    pub username: Option<String>,
    pub conversation_id: Option<String>,
    pub transcript: Vec<Message>,
    greeting: String,
}

impl SessionContext {
    pub fn new(greeting: &str) -> SessionContext {
        return SessionContext {
            logged_in: false,
            username: None,
            conversation_id: None,
            transcript: vec![Message::new(Author::Assistant, greeting)],
            greeting: greeting.to_string(),
        };
    }

    /// Drops the conversation and restores the seed greeting. The login
    /// survives.
    pub fn reset(&mut self) {
        self.conversation_id = None;
        self.transcript = vec![Message::new(Author::Assistant, &self.greeting)];
    }

    pub fn push_user_turn(&mut self, text: &str) {
        self.transcript.push(Message::new(Author::User, text));
    }

    pub fn push_assistant_turn(&mut self, text: &str) {
        self.transcript.push(Message::new(Author::Assistant, text));
    }
}
