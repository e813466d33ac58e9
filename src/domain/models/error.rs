use std::time::Duration;

/// Failures of a chat turn, split by where they come from: the login gate, the
/// wire, or the assistant's run itself.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Invalid username or password.")]
    Authentication,
    #[error("You need to log in before chatting.")]
    NotAuthenticated,

    #[error("Muesli is not configured: {0} is not set.")]
    Config(String),

    #[error("Could not reach the assistant service: {0}")]
    Transport(String),
    #[error("The assistant service rejected the API key.")]
    Unauthorized,
    #[error("The assistant service answered with status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Could not read the assistant service response: {0}")]
    Decode(String),

    #[error("The assistant failed to answer ({code}): {message}")]
    RunFailed { code: String, message: String },
    #[error("The assistant run was cancelled.")]
    RunCancelled,
    #[error("The assistant run expired before finishing.")]
    RunExpired,
    #[error("The assistant stopped before finishing its answer.")]
    RunIncomplete,
    #[error("The assistant asked for a tool call, which this client does not provide.")]
    RunRequiresAction,
    #[error("The assistant did not answer within {} seconds.", .waited.as_secs())]
    RunTimedOut { waited: Duration },
    #[error("The assistant finished without a text reply.")]
    EmptyReply,
}

impl ChatError {
    pub fn is_transport(&self) -> bool {
        return matches!(
            self,
            ChatError::Transport(_)
                | ChatError::Unauthorized
                | ChatError::Api { .. }
                | ChatError::Decode(_)
        );
    }
}
