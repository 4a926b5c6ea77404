//! Per-message request pipeline.
//!
//! Each inbound message gets its own thread and run:
//!
//! 1. create a thread seeded with the message as the user turn
//! 2. start a run of the provisioned assistant on it
//! 3. poll the run until it reaches a terminal status
//! 4. take the last message the run produced and its first text block
//! 5. strip citation markers
//!
//! Threads are never reused across messages.

use std::sync::Arc;

use tracing::{Level, debug, warn};

use crate::backend::ConversationApi;
use crate::error::{Error, Result};
use crate::models::{AssistantId, Pollable, RunId, RunStatus, ThreadId};
use crate::poll::Poller;
use crate::sanitize::strip_citations;

pub struct RequestPipeline {
    conversations: Arc<dyn ConversationApi>,
    poller: Poller,
    error_notice: String,
}

impl RequestPipeline {
    pub fn new(
        conversations: Arc<dyn ConversationApi>,
        poller: Poller,
        error_notice: impl Into<String>,
    ) -> Self {
        Self {
            conversations,
            poller,
            error_notice: error_notice.into(),
        }
    }

    /// Run one message through the assistant and return the sanitized answer.
    pub async fn handle(&self, raw: &str, assistant: &AssistantId) -> Result<String> {
        let conversations = self.conversations.as_ref();

        let thread = conversations.create_thread(raw).await?;
        debug!(thread = %thread.id, "Thread created");

        let run = conversations.create_run(&thread.id, assistant).await?;
        let run = if run.is_terminal() {
            run
        } else {
            let (thread_id, run_id) = (&thread.id, &run.id);
            self.poller
                .until_terminal("run", || conversations.get_run(thread_id, run_id))
                .await?
        };

        if run.status != RunStatus::Completed {
            return Err(Error::RunFailed {
                run_id: run.id.to_string(),
                status: run.status,
                reason: run.failure_reason(),
            });
        }

        if tracing::enabled!(Level::DEBUG) {
            self.log_file_search(&thread.id, &run.id).await;
        }

        let messages = conversations.list_run_messages(&thread.id, &run.id).await?;
        let last = messages.last().ok_or_else(|| {
            Error::UnexpectedShape(format!("run {} produced no messages", run.id))
        })?;
        let text = last.first_text().ok_or_else(|| {
            Error::UnexpectedShape(format!("message {} has no text content", last.id))
        })?;

        Ok(strip_citations(text).into_owned())
    }

    /// Like [`handle`](Self::handle), but any failure becomes the fixed error
    /// notice. The cause is logged, never sent to the client.
    pub async fn respond(&self, raw: &str, assistant: &AssistantId) -> String {
        match self.handle(raw, assistant).await {
            Ok(answer) => answer,
            Err(err) => {
                warn!(error = %err, "Request pipeline failed");
                self.error_notice.clone()
            }
        }
    }

    async fn log_file_search(&self, thread: &ThreadId, run: &RunId) {
        match self.conversations.list_run_steps(thread, run).await {
            Ok(steps) if steps.iter().any(|step| step.used_file_search()) => {
                debug!(run = %run, "File search was used");
            }
            Ok(_) => debug!(run = %run, "File search was not used"),
            Err(err) => debug!(run = %run, error = %err, "Could not list run steps"),
        }
    }
}
