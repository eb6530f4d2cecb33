use crate::domain::model::{Attachment, OutboundMessage, Recipient};
use crate::domain::ports::{Notifier, Transport};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Sends replies back to the chat a command came from.
#[derive(Clone)]
pub struct ReplyNotifier {
    transport: Arc<dyn Transport>,
    chat: Recipient,
}

impl ReplyNotifier {
    pub fn new(transport: Arc<dyn Transport>, chat: Recipient) -> Self {
        Self { transport, chat }
    }
}

#[async_trait]
impl Notifier for ReplyNotifier {
    async fn notify(&self, text: &str) -> Result<()> {
        self.transport
            .send(&self.chat, &OutboundMessage::Text(text.to_string()))
            .await
    }

    async fn notify_media(&self, attachment: Attachment, caption: &str) -> Result<()> {
        let message = OutboundMessage::Media {
            attachment: Arc::new(attachment),
            caption: caption.to_string(),
        };
        self.transport.send(&self.chat, &message).await
    }
}
