//! Executor that records scripts instead of running them.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::ExecutionError;
use crate::script::DmlScript;

use super::{EngineValue, ScriptExecutor};

fn lock_err(context: &'static str) -> ExecutionError {
    ExecutionError::Engine {
        message: format!("poisoned lock: {context}"),
    }
}

/// Thread-safe executor that stores every submitted script.
///
/// Replies are taken from a queue of scripted responses; once the queue is
/// empty every submission gets the fallback reply (`EngineValue::Empty` by
/// default).
#[derive(Debug)]
pub struct RecordingExecutor {
    submitted: Mutex<Vec<DmlScript>>,
    responses: Mutex<VecDeque<Result<EngineValue, ExecutionError>>>,
    fallback: EngineValue,
}

impl Default for RecordingExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingExecutor {
    /// Creates an executor replying `EngineValue::Empty`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_fallback(EngineValue::Empty)
    }

    /// Creates an executor replying `fallback` once scripted responses run out.
    #[must_use]
    pub fn with_fallback(fallback: EngineValue) -> Self {
        Self {
            submitted: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
            fallback,
        }
    }

    /// Queues a successful reply.
    pub fn push_response(&self, value: EngineValue) -> Result<(), ExecutionError> {
        self.responses
            .lock()
            .map_err(|_| lock_err("responses"))?
            .push_back(Ok(value));
        Ok(())
    }

    /// Queues a failing reply.
    pub fn push_failure(&self, error: ExecutionError) -> Result<(), ExecutionError> {
        self.responses
            .lock()
            .map_err(|_| lock_err("responses"))?
            .push_back(Err(error));
        Ok(())
    }

    /// Scripts submitted so far, oldest first.
    pub fn submitted(&self) -> Result<Vec<DmlScript>, ExecutionError> {
        Ok(self
            .submitted
            .lock()
            .map_err(|_| lock_err("submitted"))?
            .clone())
    }

    /// Number of `execute` calls so far.
    pub fn call_count(&self) -> Result<usize, ExecutionError> {
        Ok(self.submitted.lock().map_err(|_| lock_err("submitted"))?.len())
    }
}

impl ScriptExecutor for RecordingExecutor {
    fn execute(&self, script: &DmlScript) -> Result<EngineValue, ExecutionError> {
        self.submitted
            .lock()
            .map_err(|_| lock_err("submitted"))?
            .push(script.clone());

        let next = self
            .responses
            .lock()
            .map_err(|_| lock_err("responses"))?
            .pop_front();
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}
