//! Wire models for the hosted assistant backend.
//!
//! Only the fields the bridge reads are modelled; everything else the backend
//! returns is ignored during deserialization.

use serde::{Deserialize, Serialize};

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

opaque_id!(
    /// Identifier of an assistant resource.
    AssistantId
);
opaque_id!(
    /// Identifier of a knowledge corpus (vector store).
    CorpusId
);
opaque_id!(
    /// Identifier of an uploaded file.
    FileId
);
opaque_id!(
    /// Identifier of a conversation thread.
    ThreadId
);
opaque_id!(
    /// Identifier of a run.
    RunId
);

/// Something the poller can wait on.
pub trait Pollable {
    fn is_terminal(&self) -> bool;
}

/// Backend list envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct List<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

/// Error detail attached to failed runs and file bindings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LastError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl std::fmt::Display for LastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => write!(f, "{code}: {message}"),
            (Some(code), None) => f.write_str(code),
            (None, Some(message)) => f.write_str(message),
            (None, None) => f.write_str("no reason given"),
        }
    }
}

// ============================================================================
// Assistants
// ============================================================================

/// Capability enabled on an assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tool {
    FileSearch,
    CodeInterpreter,
    #[serde(other)]
    Other,
}

/// Resources bound to an assistant's tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolResources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_search: Option<FileSearchResources>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileSearchResources {
    #[serde(default)]
    pub vector_store_ids: Vec<CorpusId>,
}

impl ToolResources {
    /// Resources binding exactly one corpus to file search.
    pub fn with_corpus(corpus: &CorpusId) -> Self {
        Self {
            file_search: Some(FileSearchResources {
                vector_store_ids: vec![corpus.clone()],
            }),
        }
    }

    /// Corpora currently bound to file search.
    pub fn corpora(&self) -> &[CorpusId] {
        self.file_search
            .as_ref()
            .map_or(&[], |resources| resources.vector_store_ids.as_slice())
    }
}

/// Fixed configuration used when creating an assistant.
#[derive(Debug, Clone, Serialize)]
pub struct AssistantSpec {
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub tools: Vec<Tool>,
}

/// Assistant resource as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assistant {
    pub id: AssistantId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub tools: Vec<Tool>,
    #[serde(default)]
    pub tool_resources: Option<ToolResources>,
}

// ============================================================================
// Corpora and files
// ============================================================================

/// A knowledge corpus (vector store).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Corpus {
    pub id: CorpusId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub file_counts: FileCounts,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileCounts {
    #[serde(default)]
    pub in_progress: u64,
    #[serde(default)]
    pub completed: u64,
    #[serde(default)]
    pub failed: u64,
    #[serde(default)]
    pub cancelled: u64,
    #[serde(default)]
    pub total: u64,
}

/// Status of a file binding inside a corpus.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BindStatus {
    InProgress,
    Completed,
    Cancelled,
    Failed,
    #[serde(other)]
    Other,
}

impl std::fmt::Display for BindStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindStatus::InProgress => write!(f, "in_progress"),
            BindStatus::Completed => write!(f, "completed"),
            BindStatus::Cancelled => write!(f, "cancelled"),
            BindStatus::Failed => write!(f, "failed"),
            BindStatus::Other => write!(f, "other"),
        }
    }
}

/// A file bound (or being bound) to a corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusFile {
    pub id: FileId,
    pub status: BindStatus,
    #[serde(default)]
    pub last_error: Option<LastError>,
}

impl Pollable for CorpusFile {
    fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            BindStatus::Completed | BindStatus::Cancelled | BindStatus::Failed
        )
    }
}

/// A file uploaded to the backend file store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: FileId,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub bytes: u64,
    #[serde(default)]
    pub purpose: Option<String>,
}

// ============================================================================
// Threads, runs, messages
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: ThreadId,
}

/// Run lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
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
    #[serde(other)]
    Other,
}

impl RunStatus {
    /// Whether the run can no longer change status.
    ///
    /// `requires_action` counts as terminal: the bridge never registers
    /// function tools, so nothing would ever submit the outputs.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::RequiresAction
                | RunStatus::Cancelled
                | RunStatus::Failed
                | RunStatus::Completed
                | RunStatus::Incomplete
                | RunStatus::Expired
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
            RunStatus::Other => "other",
        };
        f.write_str(s)
    }
}

/// One execution of an assistant against a thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub thread_id: ThreadId,
    pub assistant_id: AssistantId,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<LastError>,
}

impl Run {
    /// Human-readable reason for a non-completed terminal status.
    pub fn failure_reason(&self) -> String {
        self.last_error
            .as_ref()
            .map_or_else(|| "no reason given".to_string(), ToString::to_string)
    }
}

impl Pollable for Run {
    fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    pub value: String,
    #[serde(default)]
    pub annotations: Vec<serde_json::Value>,
}

/// A content block inside a thread message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: TextContent },
    #[serde(other)]
    Other,
}

/// A message appended to a thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    pub role: MessageRole,
    #[serde(default)]
    pub run_id: Option<RunId>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

impl ThreadMessage {
    /// The first text block of the message, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.value.as_str()),
            ContentBlock::Other => None,
        })
    }
}

/// Tool call recorded in a run step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepToolCall {
    FileSearch { id: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepDetails {
    ToolCalls {
        #[serde(default)]
        tool_calls: Vec<StepToolCall>,
    },
    #[serde(other)]
    Other,
}

/// A step taken by a run (message creation or tool calls).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStep {
    pub id: String,
    #[serde(default)]
    pub step_details: Option<StepDetails>,
}

impl RunStep {
    pub fn used_file_search(&self) -> bool {
        match &self.step_details {
            Some(StepDetails::ToolCalls { tool_calls }) => tool_calls
                .iter()
                .any(|call| matches!(call, StepToolCall::FileSearch { .. })),
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;
