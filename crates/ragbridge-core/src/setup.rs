//! One-shot provisioning of the assistant and its knowledge corpus.
//!
//! Runs once per process start. A new assistant is created every time; the
//! corpus is reused when one exists, and the configured document is only
//! uploaded when the chosen corpus has no files at all. Everything after the
//! assistant exists is best effort: failures are logged and provisioning
//! carries on, so the readiness gate still opens.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::backend::{AssistantApi, CorpusStore};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::gate::ReadinessGate;
use crate::models::{AssistantId, AssistantSpec, BindStatus, CorpusId, FileId, Pollable};
use crate::poll::Poller;

/// What happened to the configured document during provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// The corpus already had files; nothing was uploaded.
    AlreadyPresent { files: usize },
    /// The document was uploaded and bound.
    Uploaded(FileId),
    /// The document path does not exist locally.
    MissingLocally(PathBuf),
    UploadFailed,
    BindFailed(FileId),
    /// Listing the corpus files failed, so upload was skipped.
    ListingFailed,
    /// No corpus could be selected or created.
    CorpusUnavailable,
}

/// Result of a provisioning run.
#[derive(Debug, Clone)]
pub struct Provisioned {
    pub assistant: AssistantId,
    pub corpus: Option<CorpusId>,
    pub document: DocumentOutcome,
}

pub struct SetupCoordinator {
    corpora: Arc<dyn CorpusStore>,
    assistants: Arc<dyn AssistantApi>,
    bind_poller: Poller,
    assistant: AssistantSpec,
    corpus_name: String,
    document: PathBuf,
}

impl SetupCoordinator {
    pub fn new(
        corpora: Arc<dyn CorpusStore>,
        assistants: Arc<dyn AssistantApi>,
        bind_poller: Poller,
        config: &Config,
    ) -> Self {
        Self {
            corpora,
            assistants,
            bind_poller,
            assistant: config.assistant_spec(),
            corpus_name: config.corpus.name.clone(),
            document: config.corpus.document.clone(),
        }
    }

    /// Provision and, on success, open the gate.
    ///
    /// Only a failure to create the assistant leaves the gate closed; it is
    /// logged and not retried.
    pub async fn run(&self, gate: &ReadinessGate) -> Option<Provisioned> {
        match self.provision().await {
            Ok(provisioned) => {
                gate.open(provisioned.assistant.clone());
                info!(
                    assistant = %provisioned.assistant,
                    corpus = ?provisioned.corpus,
                    document = ?provisioned.document,
                    "Assistant and corpus ready"
                );
                Some(provisioned)
            }
            Err(err) => {
                error!(error = %err, "Setup failed; readiness gate stays closed");
                None
            }
        }
    }

    /// Create the assistant, prepare the corpus and bind the two.
    pub async fn provision(&self) -> Result<Provisioned> {
        let assistant = self.assistants.create_assistant(&self.assistant).await?;
        info!(assistant = %assistant.id, "Assistant created");

        let (corpus, document) = match self.select_corpus().await {
            Ok(corpus) => {
                let outcome = self.populate_corpus(&corpus).await;
                (Some(corpus), outcome)
            }
            Err(err) => {
                warn!(error = %err, "No corpus available; assistant will run without one");
                (None, DocumentOutcome::CorpusUnavailable)
            }
        };

        if let Some(corpus) = &corpus {
            match self.assistants.attach_corpus(&assistant.id, corpus).await {
                Ok(_) => info!(corpus = %corpus, "Assistant updated to use corpus"),
                Err(err) => warn!(corpus = %corpus, error = %err, "Failed to attach corpus"),
            }
        }

        Ok(Provisioned {
            assistant: assistant.id,
            corpus,
            document,
        })
    }

    /// First existing corpus, or a newly created one.
    async fn select_corpus(&self) -> Result<CorpusId> {
        let existing = self.corpora.list_corpora().await?;
        if let Some(corpus) = existing.into_iter().next() {
            info!(corpus = %corpus.id, "Using existing corpus");
            return Ok(corpus.id);
        }

        let corpus = self.corpora.create_corpus(&self.corpus_name).await?;
        info!(corpus = %corpus.id, name = %self.corpus_name, "Created corpus");
        Ok(corpus.id)
    }

    async fn populate_corpus(&self, corpus: &CorpusId) -> DocumentOutcome {
        // Any file at all counts as "document present"; a different document
        // bound earlier is indistinguishable from the configured one.
        match self.corpora.list_corpus_files(corpus).await {
            Ok(files) if !files.is_empty() => {
                info!(corpus = %corpus, files = files.len(), "Corpus already has files, skipping upload");
                return DocumentOutcome::AlreadyPresent { files: files.len() };
            }
            Ok(_) => {}
            Err(err) => {
                warn!(corpus = %corpus, error = %err, "Failed to list corpus files, skipping upload");
                return DocumentOutcome::ListingFailed;
            }
        }

        let outcome = self.ingest_document(corpus).await;
        if matches!(outcome, DocumentOutcome::Uploaded(_) | DocumentOutcome::BindFailed(_)) {
            self.log_corpus_files(corpus).await;
        }
        outcome
    }

    async fn ingest_document(&self, corpus: &CorpusId) -> DocumentOutcome {
        let path = resolve(&self.document);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            warn!(path = %path.display(), "Document does not exist; corpus stays empty");
            return DocumentOutcome::MissingLocally(path);
        }

        info!(path = %path.display(), "Uploading document");
        let uploaded = match self.corpora.upload_file(&path).await {
            Ok(file) => file,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Document upload failed");
                return DocumentOutcome::UploadFailed;
            }
        };
        info!(file = %uploaded.id, "Document uploaded");

        match self.bind(corpus, &uploaded.id).await {
            Ok(()) => {
                info!(file = %uploaded.id, corpus = %corpus, "Document bound to corpus");
                DocumentOutcome::Uploaded(uploaded.id)
            }
            Err(err) => {
                warn!(file = %uploaded.id, corpus = %corpus, error = %err, "Failed to bind document");
                DocumentOutcome::BindFailed(uploaded.id)
            }
        }
    }

    async fn bind(&self, corpus: &CorpusId, file: &FileId) -> Result<()> {
        let store = self.corpora.as_ref();
        let binding = store.bind_file(corpus, file).await?;
        let binding = if binding.is_terminal() {
            binding
        } else {
            self.bind_poller
                .until_terminal("document bind", || store.get_corpus_file(corpus, file))
                .await?
        };

        if binding.status == BindStatus::Completed {
            Ok(())
        } else {
            if let Some(last_error) = &binding.last_error {
                warn!(file = %file, reason = %last_error, "Bind reported an error");
            }
            Err(Error::BindFailed {
                file_id: file.to_string(),
                status: binding.status,
            })
        }
    }

    async fn log_corpus_files(&self, corpus: &CorpusId) {
        match self.corpora.list_corpus_files(corpus).await {
            Ok(files) => {
                let ids: Vec<&str> = files.iter().map(|f| f.id.as_str()).collect();
                info!(corpus = %corpus, files = ?ids, "Files in corpus after upload");
            }
            Err(err) => warn!(corpus = %corpus, error = %err, "Failed to list corpus files after upload"),
        }
    }
}

fn resolve(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
