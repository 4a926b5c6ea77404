//! In-memory backend and manual clock shared by the integration tests.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use ragbridge_core::backend::{AssistantApi, ConversationApi, CorpusStore};
use ragbridge_core::models::{
    Assistant, AssistantId, AssistantSpec, BindStatus, ContentBlock, Corpus, CorpusFile, CorpusId,
    FileCounts, FileId, LastError, MessageRole, Run, RunId, RunStatus, RunStep, TextContent,
    Thread, ThreadId, ThreadMessage, ToolResources, UploadedFile,
};
use ragbridge_core::poll::{Clock, PollPolicy, Poller};
use ragbridge_core::{Error, Result};

/// Clock that advances virtual time instead of sleeping.
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.elapsed.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn sleep(&self, duration: Duration) {
        *self.elapsed.lock().unwrap_or_else(|e| e.into_inner()) += duration;
    }
}

pub fn manual_poller(max_attempts: u32) -> Poller {
    Poller::new(
        Arc::new(ManualClock::new()),
        PollPolicy {
            interval: Duration::from_millis(500),
            max_attempts,
            deadline: Duration::from_secs(3600),
        },
    )
}

#[derive(Default)]
pub struct FakeState {
    pub corpora: Vec<(Corpus, Vec<CorpusFile>)>,
    pub assistants: Vec<Assistant>,
    pub uploads: Vec<PathBuf>,
    pub threads: Vec<String>,
    pub runs: Vec<(ThreadId, AssistantId)>,

    /// Statuses returned by successive `get_run` calls; the last one repeats.
    pub run_script: VecDeque<RunStatus>,
    /// Statuses returned by successive `get_corpus_file` calls; the last one repeats.
    pub bind_script: VecDeque<BindStatus>,
    /// Assistant messages of a run, oldest first; empty produces a run with
    /// no messages.
    pub replies: Vec<String>,
    /// Number of `list_run_steps` calls.
    pub step_listings: usize,
    /// Reply made of non-text content only.
    pub reply_without_text: bool,

    pub fail_create_assistant: bool,
    pub fail_list_corpora: bool,
    pub fail_upload: bool,
    pub fail_create_thread: bool,
}

/// In-memory stand-in for the hosted backend.
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        {
            let mut state = backend.state();
            state.run_script = VecDeque::from([RunStatus::InProgress, RunStatus::Completed]);
            state.bind_script = VecDeque::from([BindStatus::Completed]);
            state.replies = vec!["Answer text".to_string()];
        }
        backend
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_corpus(self, id: &str, files: &[&str]) -> Self {
        self.state().corpora.push((
            corpus(id),
            files
                .iter()
                .map(|f| CorpusFile {
                    id: FileId::from(*f),
                    status: BindStatus::Completed,
                    last_error: None,
                })
                .collect(),
        ));
        self
    }

    pub fn corpus_count(&self) -> usize {
        self.state().corpora.len()
    }

    pub fn files_in(&self, corpus: &str) -> Vec<String> {
        self.state()
            .corpora
            .iter()
            .find(|(c, _)| c.id.as_str() == corpus)
            .map(|(_, files)| files.iter().map(|f| f.id.to_string()).collect())
            .unwrap_or_default()
    }

    pub fn thread_count(&self) -> usize {
        self.state().threads.len()
    }

    pub fn run_count(&self) -> usize {
        self.state().runs.len()
    }
}

fn corpus(id: &str) -> Corpus {
    Corpus {
        id: CorpusId::from(id),
        name: Some("Knowledge Base".to_string()),
        file_counts: FileCounts::default(),
    }
}

fn unavailable(what: &str) -> Error {
    Error::Api {
        status: 500,
        message: format!("{what} unavailable"),
    }
}

fn next_status<T: Copy>(script: &mut VecDeque<T>, fallback: T) -> T {
    if script.len() > 1 {
        script.pop_front().unwrap_or(fallback)
    } else {
        script.front().copied().unwrap_or(fallback)
    }
}

#[async_trait]
impl CorpusStore for FakeBackend {
    async fn list_corpora(&self) -> Result<Vec<Corpus>> {
        let state = self.state();
        if state.fail_list_corpora {
            return Err(unavailable("vector_stores"));
        }
        Ok(state.corpora.iter().map(|(c, _)| c.clone()).collect())
    }

    async fn create_corpus(&self, name: &str) -> Result<Corpus> {
        let mut state = self.state();
        let mut created = corpus(&format!("vs_{}", state.corpora.len() + 1));
        created.name = Some(name.to_string());
        state.corpora.push((created.clone(), Vec::new()));
        Ok(created)
    }

    async fn list_corpus_files(&self, corpus: &CorpusId) -> Result<Vec<CorpusFile>> {
        self.state()
            .corpora
            .iter()
            .find(|(c, _)| &c.id == corpus)
            .map(|(_, files)| files.clone())
            .ok_or_else(|| Error::Api {
                status: 404,
                message: format!("no vector store {corpus}"),
            })
    }

    async fn upload_file(&self, path: &Path) -> Result<UploadedFile> {
        let mut state = self.state();
        if state.fail_upload {
            return Err(unavailable("files"));
        }
        state.uploads.push(path.to_path_buf());
        Ok(UploadedFile {
            id: FileId::from(format!("file_{}", state.uploads.len()).as_str()),
            filename: path.file_name().map(|n| n.to_string_lossy().into_owned()),
            bytes: 0,
            purpose: Some("assistants".to_string()),
        })
    }

    async fn bind_file(&self, corpus: &CorpusId, file: &FileId) -> Result<CorpusFile> {
        let mut state = self.state();
        let binding = CorpusFile {
            id: file.clone(),
            status: BindStatus::InProgress,
            last_error: None,
        };
        let (_, files) = state
            .corpora
            .iter_mut()
            .find(|(c, _)| &c.id == corpus)
            .ok_or_else(|| unavailable("vector store"))?;
        files.push(binding.clone());
        Ok(binding)
    }

    async fn get_corpus_file(&self, corpus: &CorpusId, file: &FileId) -> Result<CorpusFile> {
        let mut state = self.state();
        let status = next_status(&mut state.bind_script, BindStatus::Completed);
        let (_, files) = state
            .corpora
            .iter_mut()
            .find(|(c, _)| &c.id == corpus)
            .ok_or_else(|| unavailable("vector store"))?;
        if status == BindStatus::Failed {
            // The backend drops failed bindings from the corpus
            files.retain(|f| &f.id != file);
        } else if let Some(binding) = files.iter_mut().find(|f| &f.id == file) {
            binding.status = status;
        }
        Ok(CorpusFile {
            id: file.clone(),
            status,
            last_error: (status == BindStatus::Failed).then(|| LastError {
                code: Some("invalid_file".to_string()),
                message: Some("could not parse".to_string()),
            }),
        })
    }
}

#[async_trait]
impl AssistantApi for FakeBackend {
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<Assistant> {
        let mut state = self.state();
        if state.fail_create_assistant {
            return Err(unavailable("assistants"));
        }
        let assistant = Assistant {
            id: AssistantId::from(format!("asst_{}", state.assistants.len() + 1).as_str()),
            name: Some(spec.name.clone()),
            instructions: Some(spec.instructions.clone()),
            model: spec.model.clone(),
            tools: spec.tools.clone(),
            tool_resources: None,
        };
        state.assistants.push(assistant.clone());
        Ok(assistant)
    }

    async fn attach_corpus(&self, assistant: &AssistantId, corpus: &CorpusId) -> Result<Assistant> {
        let mut state = self.state();
        let found = state
            .assistants
            .iter_mut()
            .find(|a| &a.id == assistant)
            .ok_or_else(|| unavailable("assistant"))?;
        found.tool_resources = Some(ToolResources::with_corpus(corpus));
        Ok(found.clone())
    }
}

#[async_trait]
impl ConversationApi for FakeBackend {
    async fn create_thread(&self, user_text: &str) -> Result<Thread> {
        let mut state = self.state();
        if state.fail_create_thread {
            return Err(unavailable("threads"));
        }
        state.threads.push(user_text.to_string());
        Ok(Thread {
            id: ThreadId::from(format!("thread_{}", state.threads.len()).as_str()),
        })
    }

    async fn create_run(&self, thread: &ThreadId, assistant: &AssistantId) -> Result<Run> {
        let mut state = self.state();
        state.runs.push((thread.clone(), assistant.clone()));
        Ok(Run {
            id: RunId::from(format!("run_{}", state.runs.len()).as_str()),
            thread_id: thread.clone(),
            assistant_id: assistant.clone(),
            status: RunStatus::Queued,
            last_error: None,
        })
    }

    async fn get_run(&self, thread: &ThreadId, run: &RunId) -> Result<Run> {
        let mut state = self.state();
        let status = next_status(&mut state.run_script, RunStatus::Completed);
        let assistant = state
            .runs
            .iter()
            .find(|(t, _)| t == thread)
            .map(|(_, a)| a.clone())
            .ok_or_else(|| unavailable("run"))?;
        Ok(Run {
            id: run.clone(),
            thread_id: thread.clone(),
            assistant_id: assistant,
            status,
            last_error: (status == RunStatus::Failed).then(|| LastError {
                code: Some("server_error".to_string()),
                message: Some("Sorry, something went wrong.".to_string()),
            }),
        })
    }

    async fn list_run_messages(&self, _thread: &ThreadId, run: &RunId) -> Result<Vec<ThreadMessage>> {
        let state = self.state();
        let messages = state
            .replies
            .iter()
            .enumerate()
            .map(|(i, reply)| {
                let content = if state.reply_without_text {
                    vec![ContentBlock::Other]
                } else {
                    vec![ContentBlock::Text {
                        text: TextContent {
                            value: reply.clone(),
                            annotations: Vec::new(),
                        },
                    }]
                };
                ThreadMessage {
                    id: format!("msg_{}", i + 1),
                    role: MessageRole::Assistant,
                    run_id: Some(run.clone()),
                    created_at: 1_700_000_000 + i64::try_from(i).unwrap_or_default(),
                    content,
                }
            })
            .collect();
        Ok(messages)
    }

    async fn list_run_steps(&self, _thread: &ThreadId, _run: &RunId) -> Result<Vec<RunStep>> {
        self.state().step_listings += 1;
        Ok(Vec::new())
    }
}
