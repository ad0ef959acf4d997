//! Dispatcher double that answers from a script

use async_trait::async_trait;
use socialsync::client::api_client::{ActionDispatcher, DispatchResponse};
use socialsync::client::error::DispatchError;
use socialsync::client::offline::PendingAction;
use std::collections::VecDeque;
use std::sync::Mutex;

type Outcome = Result<DispatchResponse, DispatchError>;

/// Pops one scripted outcome per dispatch; acknowledges once the script runs out
#[derive(Default)]
pub struct ScriptedDispatcher {
    outcomes: Mutex<VecDeque<Outcome>>,
    seen: Mutex<Vec<PendingAction>>,
}

impl ScriptedDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, outcome: Outcome) -> &Self {
        self.outcomes.lock().unwrap().push_back(outcome);
        self
    }

    pub fn push_ok(&self) -> &Self {
        self.push(Ok(acknowledged()))
    }

    pub fn push_rejected(&self, status: u16, message: &str) -> &Self {
        self.push(Err(DispatchError::ServerRejected {
            status,
            message: message.to_string(),
        }))
    }

    pub fn push_transient(&self, status: u16) -> &Self {
        self.push(Err(DispatchError::ServerTransientFailure { status }))
    }

    pub fn push_offline(&self) -> &Self {
        self.push(Err(DispatchError::network("connection refused")))
    }

    /// Every action dispatched so far, in order
    pub fn seen(&self) -> Vec<PendingAction> {
        self.seen.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl ActionDispatcher for ScriptedDispatcher {
    async fn dispatch(&self, action: &PendingAction) -> Outcome {
        self.seen.lock().unwrap().push(action.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(acknowledged()))
    }
}

pub fn acknowledged() -> DispatchResponse {
    DispatchResponse::Acknowledged(serde_json::Value::Null)
}
