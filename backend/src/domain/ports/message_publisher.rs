//! Port for best-effort notifications to other subsystems.

use async_trait::async_trait;

use crate::domain::messaging::QueueName;

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by messaging adapters.
    pub enum MessagePublishError {
        /// Messaging infrastructure is unavailable.
        Unavailable { message: String } => "message broker is unavailable: {message}",
        /// The broker refused the message.
        Rejected { message: String } => "message was rejected: {message}",
    }
}

/// Opaque acknowledgement returned by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageAck(pub String);

/// Send a flat string payload to a named queue.
///
/// Implementations own any retry policy; callers send once.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn send(
        &self,
        queue: QueueName,
        payload: String,
    ) -> Result<MessageAck, MessagePublishError>;
}
