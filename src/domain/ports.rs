use crate::domain::model::{
    AccessEntry, Attachment, GroupInfo, OutboundMessage, Recipient, ReportEntry,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn broadcast_delay(&self) -> Duration;
    fn max_retries(&self) -> u32;
    fn admins(&self) -> &[String];
}

/// Delivers one message to one recipient.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, recipient: &Recipient, message: &OutboundMessage) -> Result<()>;
}

/// Reply channel of the chat a command came from.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<()>;
    async fn notify_media(&self, attachment: Attachment, caption: &str) -> Result<()>;
}

#[async_trait]
pub trait GroupDirectory: Send + Sync {
    async fn group_id_from_invite(&self, invite_code: &str) -> Result<String>;
    async fn group_info(&self, group_id: &str) -> Result<GroupInfo>;
    async fn own_number(&self) -> Result<String>;
}

#[async_trait]
pub trait AccessStore: Send + Sync {
    async fn get(&self, number: &str) -> Result<Option<AccessEntry>>;
    /// Returns `true` when an existing entry was replaced.
    async fn upsert(&self, entry: AccessEntry) -> Result<bool>;
    /// Returns `true` when an entry was removed.
    async fn delete(&self, number: &str) -> Result<bool>;
    async fn list(&self) -> Result<Vec<AccessEntry>>;
    async fn is_admin(&self, number: &str) -> Result<bool>;
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn append(&self, entry: ReportEntry) -> Result<()>;
    async fn list(&self) -> Result<Vec<ReportEntry>>;
}
