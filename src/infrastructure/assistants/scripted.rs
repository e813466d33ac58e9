use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::models::AssistantApi;
use crate::domain::models::ChatError;
use crate::domain::models::Content;
use crate::domain::models::Role;
use crate::domain::models::Run;
use crate::domain::models::RunError;
use crate::domain::models::RunStatus;
use crate::domain::models::ThreadMessage;

/// Every remote call an in-memory assistant received.
#[derive(Debug, Default)]
pub struct Calls {
    pub create_thread: usize,
    pub add_message: Vec<(String, Role, String)>,
    pub create_run: Vec<(String, String)>,
    pub get_run: usize,
    pub cancel_run: usize,
    pub list_messages: usize,
}

/// Assistant that plays back run statuses and a message list instead of
/// talking to a service.
pub struct ScriptedAssistant {
    calls: Arc<Mutex<Calls>>,
    statuses: Mutex<VecDeque<RunStatus>>,
    last_error: Option<RunError>,
    messages: Vec<ThreadMessage>,
    failing: Option<&'static str>,
}

impl Default for ScriptedAssistant {
    fn default() -> ScriptedAssistant {
        return ScriptedAssistant {
            calls: Arc::new(Mutex::new(Calls::default())),
            statuses: Mutex::new(VecDeque::from(vec![RunStatus::Completed])),
            last_error: None,
            messages: vec![],
            failing: None,
        };
    }
}

pub fn assistant_message(id: &str, content: Vec<Content>) -> ThreadMessage {
    return ThreadMessage {
        id: id.to_string(),
        role: Role::Assistant,
        content,
    };
}

pub fn user_message(id: &str, text: &str) -> ThreadMessage {
    return ThreadMessage {
        id: id.to_string(),
        role: Role::User,
        content: vec![Content::Text(text.to_string())],
    };
}

impl ScriptedAssistant {
    /// Statuses handed out by consecutive `get_run` calls. The last one
    /// repeats forever.
    pub fn with_statuses(mut self, statuses: Vec<RunStatus>) -> ScriptedAssistant {
        self.statuses = Mutex::new(VecDeque::from(statuses));
        return self;
    }

    pub fn with_last_error(mut self, code: &str, message: &str) -> ScriptedAssistant {
        self.last_error = Some(RunError {
            code: code.to_string(),
            message: message.to_string(),
        });
        return self;
    }

    pub fn with_messages(mut self, messages: Vec<ThreadMessage>) -> ScriptedAssistant {
        self.messages = messages;
        return self;
    }

    pub fn with_reply(self, text: &str) -> ScriptedAssistant {
        return self.with_messages(vec![assistant_message(
            "msg_reply",
            vec![Content::Text(text.to_string())],
        )]);
    }

    /// Makes the named operation fail with a transport error.
    pub fn failing(mut self, operation: &'static str) -> ScriptedAssistant {
        self.failing = Some(operation);
        return self;
    }

    pub fn calls(&self) -> Arc<Mutex<Calls>> {
        return self.calls.clone();
    }

    fn check(&self, operation: &str) -> Result<(), ChatError> {
        if self.failing == Some(operation) {
            return Err(ChatError::Transport(format!("{operation} is down")));
        }
        return Ok(());
    }

    fn next_status(&self) -> RunStatus {
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            return statuses.pop_front().unwrap();
        }
        return *statuses.front().unwrap_or(&RunStatus::Completed);
    }

    fn run(&self, status: RunStatus) -> Run {
        let mut last_error = None;
        if status == RunStatus::Failed {
            last_error = self.last_error.clone();
        }

        return Run {
            id: "run_1".to_string(),
            status,
            last_error,
        };
    }
}

#[async_trait]
impl AssistantApi for ScriptedAssistant {
    async fn health_check(&self) -> Result<(), ChatError> {
        return self.check("health_check");
    }

    async fn create_thread(&self) -> Result<String, ChatError> {
        self.check("create_thread")?;
        let mut calls = self.calls.lock().unwrap();
        calls.create_thread += 1;
        return Ok(format!("thread_{}", calls.create_thread));
    }

    async fn add_message(
        &self,
        thread_id: &str,
        role: Role,
        content: &str,
    ) -> Result<(), ChatError> {
        self.check("add_message")?;
        self.calls.lock().unwrap().add_message.push((
            thread_id.to_string(),
            role,
            content.to_string(),
        ));
        return Ok(());
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, ChatError> {
        self.check("create_run")?;
        self.calls
            .lock()
            .unwrap()
            .create_run
            .push((thread_id.to_string(), assistant_id.to_string()));
        return Ok(self.run(RunStatus::Queued));
    }

    async fn get_run(&self, _thread_id: &str, _run_id: &str) -> Result<Run, ChatError> {
        self.check("get_run")?;
        self.calls.lock().unwrap().get_run += 1;
        return Ok(self.run(self.next_status()));
    }

    async fn cancel_run(&self, _thread_id: &str, _run_id: &str) -> Result<Run, ChatError> {
        self.calls.lock().unwrap().cancel_run += 1;
        self.check("cancel_run")?;
        return Ok(self.run(RunStatus::Cancelling));
    }

    async fn list_messages(&self, _thread_id: &str) -> Result<Vec<ThreadMessage>, ChatError> {
        self.check("list_messages")?;
        self.calls.lock().unwrap().list_messages += 1;
        return Ok(self.messages.clone());
    }
}
