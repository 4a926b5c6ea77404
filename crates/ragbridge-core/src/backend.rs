//! Adapter traits over the hosted assistant backend.
//!
//! The setup coordinator depends on [`CorpusStore`] and [`AssistantApi`];
//! the request pipeline depends on [`ConversationApi`]. [`crate::OpenAiClient`]
//! implements all three.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Assistant, AssistantId, AssistantSpec, Corpus, CorpusFile, CorpusId, FileId, Run, RunId,
    RunStep, Thread, ThreadId, ThreadMessage, UploadedFile,
};

/// Document and corpus primitives.
#[async_trait]
pub trait CorpusStore: Send + Sync {
    /// List existing corpora, in backend order.
    async fn list_corpora(&self) -> Result<Vec<Corpus>>;

    async fn create_corpus(&self, name: &str) -> Result<Corpus>;

    /// List files bound to a corpus.
    async fn list_corpus_files(&self, corpus: &CorpusId) -> Result<Vec<CorpusFile>>;

    /// Upload a local file to the backend file store.
    async fn upload_file(&self, path: &Path) -> Result<UploadedFile>;

    /// Start binding an uploaded file to a corpus.
    async fn bind_file(&self, corpus: &CorpusId, file: &FileId) -> Result<CorpusFile>;

    async fn get_corpus_file(&self, corpus: &CorpusId, file: &FileId) -> Result<CorpusFile>;
}

/// Assistant resource creation and update.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<Assistant>;

    /// Point the assistant's file search at a corpus.
    async fn attach_corpus(&self, assistant: &AssistantId, corpus: &CorpusId)
    -> Result<Assistant>;
}

/// Thread, run and message primitives.
#[async_trait]
pub trait ConversationApi: Send + Sync {
    /// Create a thread seeded with one user message.
    async fn create_thread(&self, user_text: &str) -> Result<Thread>;

    async fn create_run(&self, thread: &ThreadId, assistant: &AssistantId) -> Result<Run>;

    async fn get_run(&self, thread: &ThreadId, run: &RunId) -> Result<Run>;

    /// Messages produced by a run, oldest first.
    async fn list_run_messages(&self, thread: &ThreadId, run: &RunId)
    -> Result<Vec<ThreadMessage>>;

    async fn list_run_steps(&self, thread: &ThreadId, run: &RunId) -> Result<Vec<RunStep>>;
}
