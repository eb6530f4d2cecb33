use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Gateway suffix for direct (one-to-one) chats.
pub const CONTACT_SUFFIX: &str = "@c.us";
/// Gateway suffix for group chats.
pub const GROUP_SUFFIX: &str = "@g.us";

/// 一個可發送訊息的號碼
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recipient(String);

impl Recipient {
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    pub fn number(&self) -> &str {
        &self.0
    }

    /// Gateway chat address, e.g. `628123@c.us`.
    pub fn address(&self) -> String {
        if self.0.contains('@') {
            self.0.clone()
        } else {
            format!("{}{}", self.0, CONTACT_SUFFIX)
        }
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub mime_type: String,
    pub filename: Option<String>,
    pub data: Vec<u8>,
}

/// 單一收件人的一則訊息
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    Text(String),
    Media {
        attachment: Arc<Attachment>,
        caption: String,
    },
}

impl OutboundMessage {
    pub fn caption_or_text(&self) -> &str {
        match self {
            OutboundMessage::Text(text) => text,
            OutboundMessage::Media { caption, .. } => caption,
        }
    }
}

/// Where the recipients of a job came from; only used in notices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastSource {
    Group { name: String },
    File { name: String },
    Direct,
}

impl fmt::Display for BroadcastSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BroadcastSource::Group { name } => write!(f, " di grup {}", name),
            BroadcastSource::File { name } => write!(f, " dari file {}", name),
            BroadcastSource::Direct => Ok(()),
        }
    }
}

/// 一次 `!blast` 的完整工作內容，開始後不可變更
#[derive(Debug, Clone)]
pub struct BroadcastJob {
    recipients: Vec<Recipient>,
    payload: String,
    attachment: Option<Arc<Attachment>>,
    source: BroadcastSource,
}

impl BroadcastJob {
    pub fn new(recipients: Vec<Recipient>, payload: impl Into<String>) -> Self {
        Self {
            recipients,
            payload: payload.into(),
            attachment: None,
            source: BroadcastSource::Direct,
        }
    }

    pub fn with_source(mut self, source: BroadcastSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(Arc::new(attachment));
        self
    }

    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    pub fn source(&self) -> &BroadcastSource {
        &self.source
    }

    /// The message every recipient receives. Media jobs share one attachment.
    pub fn message(&self) -> OutboundMessage {
        match &self.attachment {
            Some(attachment) => OutboundMessage::Media {
                attachment: Arc::clone(attachment),
                caption: self.payload.clone(),
            },
            None => OutboundMessage::Text(self.payload.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    Failed(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastSummary {
    pub total: usize,
    pub sent: usize,
}

impl BroadcastSummary {
    pub fn failed(&self) -> usize {
        self.total - self.sent
    }
}

/// Allow-list entry. Dates use `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEntry {
    pub number: String,
    pub created: NaiveDate,
    pub expired: NaiveDate,
}

impl AccessEntry {
    /// Access ends at the start of the expiry day.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expired <= today
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub user: String,
    pub command: String,
    pub target: String,
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    pub id: String,
    pub name: String,
    pub is_group: bool,
    pub participants: Vec<String>,
}

/// 從聊天閘道收到的訊息
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub from: String,
    pub body: String,
    pub attachment: Option<Attachment>,
}

impl InboundMessage {
    pub fn text(from: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            body: body.into(),
            attachment: None,
        }
    }

    /// Sender number without the gateway suffix.
    pub fn sender_number(&self) -> &str {
        self.from.split('@').next().unwrap_or(self.from.as_str())
    }
}
