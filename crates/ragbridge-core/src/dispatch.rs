//! Gate check followed by pipeline dispatch, shared by every front end.

use std::sync::Arc;

use tracing::debug;

use crate::config::NoticesConfig;
use crate::gate::ReadinessGate;
use crate::pipeline::RequestPipeline;

/// Turns one inbound message into exactly one outbound text.
#[derive(Clone)]
pub struct Dispatcher {
    gate: ReadinessGate,
    pipeline: Arc<RequestPipeline>,
    initializing_notice: Arc<str>,
}

impl Dispatcher {
    pub fn new(gate: ReadinessGate, pipeline: Arc<RequestPipeline>, notices: &NoticesConfig) -> Self {
        Self {
            gate,
            pipeline,
            initializing_notice: Arc::from(notices.initializing.as_str()),
        }
    }

    pub fn gate(&self) -> &ReadinessGate {
        &self.gate
    }

    /// Answer a message, or return the initializing notice while the gate is
    /// closed. A closed gate never reaches the backend.
    pub async fn dispatch(&self, raw: &str) -> String {
        let Some(assistant) = self.gate.assistant() else {
            debug!("Message received before setup finished");
            return self.initializing_notice.to_string();
        };
        self.pipeline.respond(raw, &assistant).await
    }
}
