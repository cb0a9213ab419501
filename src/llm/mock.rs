//! Scripted mock generator for tests.
//!
//! Replays queued replies in order, falling back to a default once the queue
//! drains. A failure switch simulates a dead or timing-out backend. Calls are
//! logged so tests can assert on the prompts the pipeline produced.

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use super::TextGenerator;

/// One recorded `complete` call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

#[derive(Default)]
pub struct MockTextGenerator {
    queue: Mutex<VecDeque<String>>,
    default_reply: Mutex<String>,
    fail: Mutex<bool>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTextGenerator {
    pub fn new() -> Self {
        Self {
            default_reply: Mutex::new("Mock reply".to_string()),
            ..Self::default()
        }
    }

    /// Queue the next reply (consumed in FIFO order before the default).
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.queue
            .lock()
            .expect("mock lock poisoned")
            .push_back(reply.into());
    }

    /// Set the reply returned once the queue is empty.
    pub fn set_default_reply(&self, reply: impl Into<String>) {
        *self.default_reply.lock().expect("mock lock poisoned") = reply.into();
    }

    /// Make every subsequent call fail.
    pub fn set_fail(&self, fail: bool) {
        *self.fail.lock().expect("mock lock poisoned") = fail;
    }

    /// All calls recorded so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn complete(&self, system: &str, user: &str, temperature: f32) -> Result<String> {
        self.calls.lock().expect("mock lock poisoned").push(RecordedCall {
            system: system.to_string(),
            user: user.to_string(),
            temperature,
        });

        if *self.fail.lock().expect("mock lock poisoned") {
            anyhow::bail!("mock generator set to fail");
        }

        let queued = self.queue.lock().expect("mock lock poisoned").pop_front();
        Ok(queued.unwrap_or_else(|| {
            self.default_reply.lock().expect("mock lock poisoned").clone()
        }))
    }
}
