pub mod twilio;

use async_trait::async_trait;

/// "Send a message to a chat identifier, may fail." Failures never block or
/// revert the booking mutation that triggered the send.
#[async_trait]
pub trait MessagingProvider: Send + Sync {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()>;
}
