#[cfg(test)]
#[path = "assistant_test.rs"]
mod tests;

use async_trait::async_trait;
use strum::EnumIter;
use strum::IntoEnumIterator;

use super::ChatError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn parse(text: &str) -> Option<Role> {
        return Role::iter().find(|e| return e.to_string() == text);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    Unknown,
}

impl RunStatus {
    /// Statuses the service does not document yet come back as `Unknown` and
    /// are polled like any pending status.
    pub fn parse(text: &str) -> RunStatus {
        return RunStatus::iter()
            .find(|e| return *e != RunStatus::Unknown && e.to_string() == text)
            .unwrap_or(RunStatus::Unknown);
    }

    pub fn is_terminal(&self) -> bool {
        return matches!(
            self,
            RunStatus::RequiresAction
                | RunStatus::Cancelled
                | RunStatus::Failed
                | RunStatus::Completed
                | RunStatus::Incomplete
                | RunStatus::Expired
        );
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunError {
    pub code: String,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Run {
    pub id: String,
    pub status: RunStatus,
    pub last_error: Option<RunError>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Content {
    Text(String),
    /// Image and file blocks. Only the kind is kept.
    Other(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThreadMessage {
    pub id: String,
    pub role: Role,
    pub content: Vec<Content>,
}

impl ThreadMessage {
    pub fn first_text(&self) -> Option<&str> {
        return self.content.iter().find_map(|block| {
            if let Content::Text(text) = block {
                return Some(text.as_str());
            }
            return None;
        });
    }
}

/// Remote conversations as exposed by a hosted assistant service. Threads hold
/// the turns, runs produce the next assistant turn.
#[async_trait]
pub trait AssistantApi {
    /// Used at startup to verify that everything needed to reach the service
    /// is configured.
    async fn health_check(&self) -> Result<(), ChatError>;

    /// Creates an empty thread and returns its id.
    async fn create_thread(&self) -> Result<String, ChatError>;

    async fn add_message(&self, thread_id: &str, role: Role, content: &str)
        -> Result<(), ChatError>;

    /// Starts the assistant on the thread. The returned run is usually still
    /// queued.
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, ChatError>;

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ChatError>;

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ChatError>;

    /// Messages of the thread in the order the service returns them, newest
    /// first.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, ChatError>;
}

pub type AssistantBox = Box<dyn AssistantApi + Send + Sync>;
