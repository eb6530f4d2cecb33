//! REST chat gateway client.
//!
//! The gateway owns the chat session (pairing, reconnects, message
//! transport). This adapter only talks to its HTTP API:
//!
//! - `POST /messages` send text or media to one chat
//! - `GET /invites/{code}` resolve an invite code to a group id
//! - `GET /groups/{id}` group name and participants
//! - `GET /me` number of the logged-in account

use crate::domain::model::{Attachment, GroupInfo, OutboundMessage, Recipient};
use crate::domain::ports::{GroupDirectory, Transport};
use crate::utils::error::{BotError, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;
use url::Url;

/// Media as it travels over the gateway API and inbound feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaPayload {
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Base64 encoded content.
    pub data: String,
}

impl MediaPayload {
    pub fn from_attachment(attachment: &Attachment) -> Self {
        Self {
            mime_type: attachment.mime_type.clone(),
            filename: attachment.filename.clone(),
            data: STANDARD.encode(&attachment.data),
        }
    }

    pub fn into_attachment(self) -> Result<Attachment> {
        let data = STANDARD.decode(self.data.as_bytes())?;
        Ok(Attachment {
            mime_type: self.mime_type,
            filename: self.filename,
            data,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum SendRequest<'a> {
    Text {
        to: String,
        text: &'a str,
    },
    Media {
        to: String,
        caption: &'a str,
        media: MediaPayload,
    },
}

#[derive(Debug, Deserialize)]
struct InviteResponse {
    group_id: String,
}

#[derive(Debug, Deserialize)]
struct GroupResponse {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    is_group: bool,
    #[serde(default)]
    participants: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    number: String,
}

#[derive(Debug)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
    token: Option<String>,
    own_number: OnceCell<String>,
}

impl HttpGateway {
    /// `timeout` of `None` lets a request wait as long as the gateway takes.
    pub fn new(base_url: &str, token: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| BotError::InvalidConfigValueError {
            field: "gateway.base_url".to_string(),
            value: base_url.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
            token,
            own_number: OnceCell::new(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BotError::ConfigError {
                message: format!("gateway.base_url cannot be a base: {}", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(BotError::GatewayError {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments)?;
        tracing::debug!("Gateway GET {}", url);
        let response = self.authorize(self.client.get(url)).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }
}

#[async_trait]
impl Transport for HttpGateway {
    async fn send(&self, recipient: &Recipient, message: &OutboundMessage) -> Result<()> {
        let body = match message {
            OutboundMessage::Text(text) => SendRequest::Text {
                to: recipient.address(),
                text,
            },
            OutboundMessage::Media {
                attachment,
                caption,
            } => SendRequest::Media {
                to: recipient.address(),
                caption,
                media: MediaPayload::from_attachment(attachment),
            },
        };

        let url = self.endpoint(&["messages"])?;
        let response = self
            .authorize(self.client.post(url))
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl GroupDirectory for HttpGateway {
    async fn group_id_from_invite(&self, invite_code: &str) -> Result<String> {
        let invite: InviteResponse = self.get_json(&["invites", invite_code]).await?;
        Ok(invite.group_id)
    }

    async fn group_info(&self, group_id: &str) -> Result<GroupInfo> {
        let group: GroupResponse = self.get_json(&["groups", group_id]).await?;
        Ok(GroupInfo {
            id: group.id,
            name: group.name,
            is_group: group.is_group,
            participants: group.participants,
        })
    }

    async fn own_number(&self) -> Result<String> {
        let number = self
            .own_number
            .get_or_try_init(|| async {
                let me: MeResponse = self.get_json(&["me"]).await?;
                Ok::<_, BotError>(me.number)
            })
            .await?;
        Ok(number.clone())
    }
}
