use crate::domain::model::{OutboundMessage, Recipient};
use crate::domain::ports::Transport;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Transport for `--dry-run`: every send is logged and reported as delivered.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

#[async_trait]
impl Transport for LogTransport {
    async fn send(&self, recipient: &Recipient, message: &OutboundMessage) -> Result<()> {
        match message {
            OutboundMessage::Text(text) => {
                tracing::info!("📨 [dry-run] {} <- {}", recipient.address(), text);
            }
            OutboundMessage::Media {
                attachment,
                caption,
            } => {
                tracing::info!(
                    "📎 [dry-run] {} <- {} ({} bytes) {}",
                    recipient.address(),
                    attachment.mime_type,
                    attachment.data.len(),
                    caption
                );
            }
        }
        Ok(())
    }
}
