//! Message publisher doubles.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::messaging::QueueName;
use crate::domain::ports::{MessageAck, MessagePublishError, MessagePublisher};

/// Keeps every sent message for later inspection.
#[derive(Default)]
pub struct RecordingMessagePublisher(Mutex<Vec<(QueueName, String)>>);

impl RecordingMessagePublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, oldest first.
    pub fn sent(&self) -> Vec<(QueueName, String)> {
        match self.0.lock() {
            Ok(sent) => sent.clone(),
            Err(_) => panic!("publisher mutex"),
        }
    }
}

#[async_trait]
impl MessagePublisher for RecordingMessagePublisher {
    async fn send(
        &self,
        queue: QueueName,
        payload: String,
    ) -> Result<MessageAck, MessagePublishError> {
        let mut sent = match self.0.lock() {
            Ok(sent) => sent,
            Err(_) => panic!("publisher mutex"),
        };
        sent.push((queue, payload));
        Ok(MessageAck(format!("ack-{}", sent.len())))
    }
}

/// Rejects every message as if the broker were down.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingMessagePublisher;

#[async_trait]
impl MessagePublisher for FailingMessagePublisher {
    async fn send(
        &self,
        queue: QueueName,
        _payload: String,
    ) -> Result<MessageAck, MessagePublishError> {
        Err(MessagePublishError::unavailable(format!(
            "{queue} has no consumers"
        )))
    }
}
