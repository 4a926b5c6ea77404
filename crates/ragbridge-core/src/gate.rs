//! Process-wide readiness gate.
//!
//! Starts closed. The setup coordinator opens it exactly once with the
//! provisioned assistant id; every inbound message reads it before any
//! backend work happens.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::AssistantId;

/// Gate state. Only moves from `Initializing` to `Ready`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Initializing,
    Ready(AssistantId),
}

/// Single-writer, many-reader readiness flag carrying the assistant id.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    state: Arc<watch::Sender<GateState>>,
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self {
            state: Arc::new(watch::Sender::new(GateState::Initializing)),
        }
    }

    /// Open the gate. Returns `false` (and leaves the first assistant id in
    /// place) if it was already open.
    pub fn open(&self, assistant: AssistantId) -> bool {
        let mut assistant = Some(assistant);
        let opened = self.state.send_if_modified(|state| match state {
            GateState::Initializing => {
                if let Some(id) = assistant.take() {
                    *state = GateState::Ready(id);
                }
                true
            }
            GateState::Ready(_) => false,
        });

        if opened {
            info!("Readiness gate open");
        } else if let Some(id) = assistant {
            warn!(assistant = %id, "Readiness gate already open; ignoring second assistant");
        }
        opened
    }

    pub fn state(&self) -> GateState {
        self.state.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.state.borrow(), GateState::Ready(_))
    }

    /// The provisioned assistant, if setup has finished.
    pub fn assistant(&self) -> Option<AssistantId> {
        match &*self.state.borrow() {
            GateState::Ready(id) => Some(id.clone()),
            GateState::Initializing => None,
        }
    }

    /// Wait until the gate opens. There is no timeout.
    pub async fn wait_ready(&self) -> Result<AssistantId> {
        let mut receiver = self.state.subscribe();
        let state = receiver
            .wait_for(|state| matches!(state, GateState::Ready(_)))
            .await
            .map_err(|_| Error::NotReady)?;
        match &*state {
            GateState::Ready(id) => Ok(id.clone()),
            GateState::Initializing => Err(Error::NotReady),
        }
    }
}
