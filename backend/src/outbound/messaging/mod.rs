//! Messaging adapters.
//!
//! No broker is wired yet; [`LoggingMessagePublisher`] records each
//! notification in the logs and acknowledges it.

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::domain::messaging::QueueName;
use crate::domain::ports::{MessageAck, MessagePublishError, MessagePublisher};

/// Publisher that logs instead of sending.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMessagePublisher;

#[async_trait]
impl MessagePublisher for LoggingMessagePublisher {
    async fn send(
        &self,
        queue: QueueName,
        payload: String,
    ) -> Result<MessageAck, MessagePublishError> {
        let ack = Uuid::new_v4().to_string();
        info!(%queue, %ack, %payload, "notification logged (no broker configured)");
        Ok(MessageAck(ack))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn logging_publisher_acknowledges() {
        let ack = LoggingMessagePublisher
            .send(QueueName::PaymentReceived, "{}".to_owned())
            .await
            .expect("ack");
        assert!(!ack.0.is_empty());
    }
}
