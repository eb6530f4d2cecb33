//! 從標準輸入讀取收到的訊息
//!
//! Each line is either a JSON object
//! `{"from": "628123@c.us", "body": "!start", "media": {...}}` as forwarded
//! by the gateway, or plain text typed on the console.

use crate::adapters::gateway::MediaPayload;
use crate::domain::model::InboundMessage;
use crate::utils::error::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct InboundLine {
    from: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    media: Option<MediaPayload>,
}

/// Parses one line of the inbound feed.
///
/// Blank lines yield `Ok(None)`. Lines that do not start with `{` are taken
/// as a message from `console_sender`.
pub fn parse_inbound_line(line: &str, console_sender: &str) -> Result<Option<InboundMessage>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if !trimmed.starts_with('{') {
        return Ok(Some(InboundMessage::text(console_sender, trimmed)));
    }

    let parsed: InboundLine = serde_json::from_str(trimmed)?;
    let attachment = parsed.media.map(MediaPayload::into_attachment).transpose()?;

    Ok(Some(InboundMessage {
        from: parsed.from,
        body: parsed.body,
        attachment,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::BotError;

    #[test]
    fn test_plain_line_uses_console_sender() {
        let msg = parse_inbound_line("!start\n", "628999@c.us").unwrap().unwrap();
        assert_eq!(msg.from, "628999@c.us");
        assert_eq!(msg.body, "!start");
        assert!(msg.attachment.is_none());
    }

    #[test]
    fn test_blank_line_is_skipped() {
        assert!(parse_inbound_line("   ", "628999@c.us").unwrap().is_none());
    }

    #[test]
    fn test_json_line_with_media() {
        let line = r#"{"from":"628111@c.us","body":"!blast nomor.txt Promo","media":{"mime_type":"image/jpeg","filename":"promo.jpg","data":"/9j/"}}"#;
        let msg = parse_inbound_line(line, "console").unwrap().unwrap();
        assert_eq!(msg.sender_number(), "628111");
        let attachment = msg.attachment.unwrap();
        assert_eq!(attachment.mime_type, "image/jpeg");
        assert_eq!(attachment.data, vec![0xff, 0xd8, 0xff]);
    }

    #[test]
    fn test_json_line_with_bad_media() {
        let line = r#"{"from":"628111@c.us","body":"x","media":{"mime_type":"image/jpeg","data":"***"}}"#;
        let err = parse_inbound_line(line, "console").unwrap_err();
        assert!(matches!(err, BotError::MediaDecodeError(_)));
    }
}
