//! HTTP client for the OpenAI Assistants v2 API.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::backend::{AssistantApi, ConversationApi, CorpusStore};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{
    Assistant, AssistantId, AssistantSpec, Corpus, CorpusFile, CorpusId, FileId, List, Run, RunId,
    RunStep, Thread, ThreadId, ThreadMessage, ToolResources, UploadedFile,
};

/// Page size used for list endpoints.
const LIST_LIMIT: &str = "100";

/// Client for the hosted backend. Cheap to clone.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Build a client from the backend section, reading the API key from the
    /// environment.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.backend.base_url,
            config.api_key()?,
            config.backend.request_timeout(),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(Error::Api {
            status: status.as_u16(),
            message: api_error_message(&body),
        })
    }
}

/// Extract `error.message` from a backend error body, falling back to the raw
/// body text.
pub(crate) fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.pointer("/error/message")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "empty error body".to_string()
            } else {
                trimmed.to_string()
            }
        })
}

#[async_trait]
impl CorpusStore for OpenAiClient {
    async fn list_corpora(&self) -> Result<Vec<Corpus>> {
        let list: List<Corpus> =
            Self::send(self.request(Method::GET, "vector_stores").query(&[("limit", LIST_LIMIT)]))
                .await?;
        Ok(list.data)
    }

    async fn create_corpus(&self, name: &str) -> Result<Corpus> {
        Self::send(
            self.request(Method::POST, "vector_stores")
                .json(&serde_json::json!({ "name": name })),
        )
        .await
    }

    async fn list_corpus_files(&self, corpus: &CorpusId) -> Result<Vec<CorpusFile>> {
        let list: List<CorpusFile> = Self::send(
            self.request(Method::GET, &format!("vector_stores/{corpus}/files"))
                .query(&[("limit", LIST_LIMIT)]),
        )
        .await?;
        Ok(list.data)
    }

    async fn upload_file(&self, path: &Path) -> Result<UploadedFile> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "document.txt".to_string(), |n| n.to_string_lossy().into_owned());
        debug!(file = %file_name, bytes = bytes.len(), "Uploading file");

        let form = Form::new()
            .text("purpose", "assistants")
            .part("file", Part::bytes(bytes).file_name(file_name));
        Self::send(self.request(Method::POST, "files").multipart(form)).await
    }

    async fn bind_file(&self, corpus: &CorpusId, file: &FileId) -> Result<CorpusFile> {
        Self::send(
            self.request(Method::POST, &format!("vector_stores/{corpus}/files"))
                .json(&serde_json::json!({ "file_id": file })),
        )
        .await
    }

    async fn get_corpus_file(&self, corpus: &CorpusId, file: &FileId) -> Result<CorpusFile> {
        Self::send(self.request(Method::GET, &format!("vector_stores/{corpus}/files/{file}"))).await
    }
}

#[async_trait]
impl AssistantApi for OpenAiClient {
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<Assistant> {
        Self::send(self.request(Method::POST, "assistants").json(spec)).await
    }

    async fn attach_corpus(
        &self,
        assistant: &AssistantId,
        corpus: &CorpusId,
    ) -> Result<Assistant> {
        Self::send(
            self.request(Method::POST, &format!("assistants/{assistant}"))
                .json(&serde_json::json!({
                    "tool_resources": ToolResources::with_corpus(corpus)
                })),
        )
        .await
    }
}

#[async_trait]
impl ConversationApi for OpenAiClient {
    async fn create_thread(&self, user_text: &str) -> Result<Thread> {
        Self::send(
            self.request(Method::POST, "threads")
                .json(&serde_json::json!({
                    "messages": [{ "role": "user", "content": user_text }]
                })),
        )
        .await
    }

    async fn create_run(&self, thread: &ThreadId, assistant: &AssistantId) -> Result<Run> {
        Self::send(
            self.request(Method::POST, &format!("threads/{thread}/runs"))
                .json(&serde_json::json!({ "assistant_id": assistant })),
        )
        .await
    }

    async fn get_run(&self, thread: &ThreadId, run: &RunId) -> Result<Run> {
        Self::send(self.request(Method::GET, &format!("threads/{thread}/runs/{run}"))).await
    }

    async fn list_run_messages(
        &self,
        thread: &ThreadId,
        run: &RunId,
    ) -> Result<Vec<ThreadMessage>> {
        let list: List<ThreadMessage> = Self::send(
            self.request(Method::GET, &format!("threads/{thread}/messages"))
                .query(&[
                    ("run_id", run.as_str()),
                    ("order", "asc"),
                    ("limit", LIST_LIMIT),
                ]),
        )
        .await?;
        Ok(list.data)
    }

    async fn list_run_steps(&self, thread: &ThreadId, run: &RunId) -> Result<Vec<RunStep>> {
        let list: List<RunStep> = Self::send(
            self.request(Method::GET, &format!("threads/{thread}/runs/{run}/steps"))
                .query(&[("limit", LIST_LIMIT)]),
        )
        .await?;
        Ok(list.data)
    }
}
