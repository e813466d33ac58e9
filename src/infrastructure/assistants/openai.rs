#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Method;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::AssistantApi;
use crate::domain::models::ChatError;
use crate::domain::models::Content;
use crate::domain::models::Role;
use crate::domain::models::Run;
use crate::domain::models::RunError;
use crate::domain::models::RunStatus;
use crate::domain::models::ThreadMessage;

const OFFICIAL_URL: &str = "https://api.openai.com";

fn convert_err(err: reqwest::Error) -> ChatError {
    if err.is_decode() {
        return ChatError::Decode(err.to_string());
    }
    return ChatError::Transport(err.to_string());
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ThreadResponse {
    id: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MessageRequest {
    role: String,
    content: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct RunRequest {
    assistant_id: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct LastErrorResponse {
    code: String,
    message: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct RunResponse {
    id: String,
    status: String,
    #[serde(default)]
    last_error: Option<LastErrorResponse>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TextResponse {
    value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentResponse {
    Text { text: TextResponse },
    ImageFile,
    ImageUrl,
    #[serde(other)]
    Other,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MessageResponse {
    id: String,
    role: String,
    content: Vec<ContentResponse>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MessageListResponse {
    data: Vec<MessageResponse>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorBodyResponse {
    message: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorResponse {
    error: ErrorBodyResponse,
}

impl From<RunResponse> for Run {
    fn from(res: RunResponse) -> Run {
        return Run {
            status: RunStatus::parse(&res.status),
            id: res.id,
            last_error: res.last_error.map(|err| {
                return RunError {
                    code: err.code,
                    message: err.message,
                };
            }),
        };
    }
}

impl From<ContentResponse> for Content {
    fn from(res: ContentResponse) -> Content {
        match res {
            ContentResponse::Text { text } => return Content::Text(text.value),
            ContentResponse::ImageFile => return Content::Other("image_file".to_string()),
            ContentResponse::ImageUrl => return Content::Other("image_url".to_string()),
            ContentResponse::Other => return Content::Other("other".to_string()),
        }
    }
}

/// Client for the OpenAI Assistants API (threads, messages and runs).
pub struct OpenAIAssistant {
    url: String,
    token: String,
    assistant_id: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAIAssistant {
    pub fn from_config() -> Result<OpenAIAssistant> {
        return Ok(OpenAIAssistant {
            url: Config::get(ConfigKey::ApiURL)
                .trim_end_matches('/')
                .to_string(),
            token: Config::get(ConfigKey::ApiKey),
            assistant_id: Config::get(ConfigKey::AssistantID),
            timeout: Config::get_millis(ConfigKey::RequestTimeout)?,
            client: reqwest::Client::new(),
        });
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        return self
            .client
            .request(method, format!("{url}{path}", url = self.url))
            .header("Authorization", format!("Bearer {}", self.token))
            .header("OpenAI-Beta", "assistants=v2")
            .timeout(self.timeout);
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &str,
        req: RequestBuilder,
    ) -> Result<T, ChatError> {
        let res = req.send().await.map_err(convert_err)?;
        let status = res.status();
        let body = res.text().await.map_err(convert_err)?;

        if !status.is_success() {
            tracing::error!(
                status = status.as_u16(),
                operation = operation,
                "Assistant request failed"
            );

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(ChatError::Unauthorized);
            }

            let message = match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err) => err.error.message,
                Err(_) => body,
            };
            return Err(ChatError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!(operation = operation, body = body, "Assistant response");

        return serde_json::from_str::<T>(&body)
            .map_err(|err| return ChatError::Decode(format!("{operation}: {err}")));
    }
}

#[async_trait]
impl AssistantApi for OpenAIAssistant {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<(), ChatError> {
        for (key, val) in [
            (ConfigKey::ApiURL, &self.url),
            (ConfigKey::ApiKey, &self.token),
            (ConfigKey::AssistantID, &self.assistant_id),
        ] {
            if val.is_empty() {
                return Err(ChatError::Config(key.to_string()));
            }
        }

        // The official API answers its index with a 404 or a 418, so only
        // proxies get health checked.
        if self.url == OFFICIAL_URL {
            return Ok(());
        }

        let res = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await;

        let res = match res {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, "Assistant service is not reachable");
                return Err(convert_err(err));
            }
        };

        let status = res.status().as_u16();
        if status >= 400 {
            tracing::error!(status = status, "Assistant service health check failed");
            return Err(ChatError::Api {
                status,
                message: "health check failed".to_string(),
            });
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn create_thread(&self) -> Result<String, ChatError> {
        let req = self
            .request(Method::POST, "/v1/threads")
            .json(&serde_json::json!({}));
        let res: ThreadResponse = self.send("create_thread", req).await?;

        return Ok(res.id);
    }

    #[allow(clippy::implicit_return)]
    async fn add_message(
        &self,
        thread_id: &str,
        role: Role,
        content: &str,
    ) -> Result<(), ChatError> {
        let req = self
            .request(Method::POST, &format!("/v1/threads/{thread_id}/messages"))
            .json(&MessageRequest {
                role: role.to_string(),
                content: content.to_string(),
            });
        let _: MessageResponse = self.send("add_message", req).await?;

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, ChatError> {
        let req = self
            .request(Method::POST, &format!("/v1/threads/{thread_id}/runs"))
            .json(&RunRequest {
                assistant_id: assistant_id.to_string(),
            });
        let res: RunResponse = self.send("create_run", req).await?;

        return Ok(res.into());
    }

    #[allow(clippy::implicit_return)]
    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ChatError> {
        let req = self.request(
            Method::GET,
            &format!("/v1/threads/{thread_id}/runs/{run_id}"),
        );
        let res: RunResponse = self.send("get_run", req).await?;

        return Ok(res.into());
    }

    #[allow(clippy::implicit_return)]
    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ChatError> {
        let req = self.request(
            Method::POST,
            &format!("/v1/threads/{thread_id}/runs/{run_id}/cancel"),
        );
        let res: RunResponse = self.send("cancel_run", req).await?;

        return Ok(res.into());
    }

    #[allow(clippy::implicit_return)]
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, ChatError> {
        let req = self.request(Method::GET, &format!("/v1/threads/{thread_id}/messages"));
        let res: MessageListResponse = self.send("list_messages", req).await?;

        return res
            .data
            .into_iter()
            .map(|message| {
                let role = Role::parse(&message.role).ok_or_else(|| {
                    return ChatError::Decode(format!(
                        "message {} has an unknown role '{}'",
                        message.id, message.role
                    ));
                })?;

                return Ok(ThreadMessage {
                    id: message.id,
                    role,
                    content: message.content.into_iter().map(Content::from).collect(),
                });
            })
            .collect();
    }
}
