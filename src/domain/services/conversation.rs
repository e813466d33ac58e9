#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use std::sync::Mutex;

use anyhow::Result;
use tokio::time;
use tokio::time::Instant;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::AssistantBox;
use crate::domain::models::ChatError;
use crate::domain::models::PollPolicy;
use crate::domain::models::Role;
use crate::domain::models::Run;
use crate::domain::models::RunStatus;
use crate::domain::models::SessionContext;

/// Relays user turns to a remote thread and pulls the assistant's answer back
/// into the session transcript.
pub struct ConversationDriver {
    assistant: AssistantBox,
    assistant_id: String,
    poll: PollPolicy,
    // (thread id, run id) of the run being polled.
    active_run: Mutex<Option<(String, String)>>,
}

impl ConversationDriver {
    pub fn new(assistant: AssistantBox, assistant_id: &str, poll: PollPolicy) -> ConversationDriver {
        return ConversationDriver {
            assistant,
            assistant_id: assistant_id.to_string(),
            poll,
            active_run: Mutex::new(None),
        };
    }

    pub fn from_config(assistant: AssistantBox) -> Result<ConversationDriver> {
        return Ok(ConversationDriver::new(
            assistant,
            &Config::get(ConfigKey::AssistantID),
            PollPolicy::from_config()?,
        ));
    }

    /// Returns the session's thread, creating one on first use.
    pub async fn ensure_conversation(
        &self,
        session: &mut SessionContext,
    ) -> Result<String, ChatError> {
        if let Some(thread_id) = &session.conversation_id {
            return Ok(thread_id.to_string());
        }

        let thread_id = self.assistant.create_thread().await?;
        tracing::debug!(thread_id, "Thread created");
        session.conversation_id = Some(thread_id.to_string());

        return Ok(thread_id);
    }

    pub async fn submit_turn(&self, thread_id: &str, text: &str) -> Result<(), ChatError> {
        return self.assistant.add_message(thread_id, Role::User, text).await;
    }

    /// Starts a run and polls it until it reaches a terminal status or the
    /// poll policy's timeout passes. Only `completed` is a success.
    pub async fn run_and_await(&self, thread_id: &str) -> Result<Run, ChatError> {
        let run = self
            .assistant
            .create_run(thread_id, &self.assistant_id)
            .await?;
        tracing::debug!(thread_id, run_id = run.id, "Run created");

        self.set_active_run(Some((thread_id.to_string(), run.id.to_string())));
        let res = self.await_run(thread_id, &run.id).await;
        self.set_active_run(None);

        return res;
    }

    async fn await_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ChatError> {
        let started = Instant::now();
        let mut interval = self.poll.interval;
        let mut checks: usize = 0;

        loop {
            let current = self.assistant.get_run(thread_id, run_id).await?;
            checks += 1;
            tracing::debug!(
                run_id = current.id,
                status = %current.status,
                terminal = current.status.is_terminal(),
                checks,
                "Run status"
            );

            match current.status {
                RunStatus::Completed => return Ok(current),
                RunStatus::Failed => {
                    let (code, message) = current
                        .last_error
                        .map(|err| return (err.code, err.message))
                        .unwrap_or_else(|| {
                            return ("unknown".to_string(), "no details given".to_string());
                        });
                    return Err(ChatError::RunFailed { code, message });
                }
                RunStatus::Cancelled => return Err(ChatError::RunCancelled),
                RunStatus::Expired => return Err(ChatError::RunExpired),
                RunStatus::Incomplete => return Err(ChatError::RunIncomplete),
                RunStatus::RequiresAction => {
                    // A run waiting on tool output keeps the thread locked.
                    self.cancel_run(thread_id, run_id).await;
                    return Err(ChatError::RunRequiresAction);
                }
                RunStatus::Queued
                | RunStatus::InProgress
                | RunStatus::Cancelling
                | RunStatus::Unknown => {}
            }

            let waited = started.elapsed();
            if waited >= self.poll.timeout {
                tracing::warn!(run_id, checks, "Run timed out");
                self.cancel_run(thread_id, run_id).await;
                return Err(ChatError::RunTimedOut { waited });
            }

            time::sleep(interval.min(self.poll.timeout - waited)).await;
            interval = self.poll.next_interval(interval);
        }
    }

    /// The newest assistant answer: the first assistant message in the
    /// service's ordering whose first text block is not empty.
    pub async fn extract_reply(&self, thread_id: &str) -> Result<String, ChatError> {
        let messages = self.assistant.list_messages(thread_id).await?;

        return messages
            .iter()
            .filter(|message| return message.role == Role::Assistant)
            .find_map(|message| {
                return message.first_text().filter(|text| return !text.is_empty());
            })
            .map(|text| return text.to_string())
            .ok_or(ChatError::EmptyReply);
    }

    /// One full turn. The user message lands in the transcript first and stays
    /// there when the turn fails; the reply is only appended on success.
    pub async fn send(&self, session: &mut SessionContext, text: &str) -> Result<String, ChatError> {
        if !session.logged_in {
            return Err(ChatError::NotAuthenticated);
        }

        session.push_user_turn(text);

        let thread_id = self.ensure_conversation(session).await?;
        self.submit_turn(&thread_id, text).await?;
        self.run_and_await(&thread_id).await?;
        let reply = self.extract_reply(&thread_id).await?;

        session.push_assistant_turn(&reply);

        return Ok(reply);
    }

    /// Cancels the run a dropped `send` left behind, if any. Used after the
    /// task driving a turn is aborted.
    pub async fn cancel_active_run(&self) {
        let active = match self.active_run.lock() {
            Ok(mut active) => active.take(),
            Err(_) => None,
        };

        if let Some((thread_id, run_id)) = active {
            tracing::debug!(thread_id, run_id, "Cancelling aborted run");
            self.cancel_run(&thread_id, &run_id).await;
        }
    }

    fn set_active_run(&self, run: Option<(String, String)>) {
        if let Ok(mut active) = self.active_run.lock() {
            *active = run;
        }
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) {
        if let Err(err) = self.assistant.cancel_run(thread_id, run_id).await {
            tracing::warn!(error = %err, run_id, "Failed to cancel run");
        }
    }
}
