use crate::domain::model::{BroadcastSource, Recipient, GROUP_SUFFIX};
use crate::domain::ports::{GroupDirectory, Storage};
use crate::utils::error::BotError;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

pub const INVITE_LINK_PREFIX: &str = "https://chat.whatsapp.com/";

/// `!blast` 的目標：邀請連結、群組 ID 或上傳的檔案
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlastTarget {
    InviteLink { code: String },
    Group { id: String },
    File { name: String },
}

impl BlastTarget {
    pub fn parse(target: &str) -> Self {
        if let Some(code) = target.strip_prefix(INVITE_LINK_PREFIX) {
            BlastTarget::InviteLink {
                code: code.to_string(),
            }
        } else if target.ends_with(GROUP_SUFFIX) {
            BlastTarget::Group {
                id: target.to_string(),
            }
        } else {
            BlastTarget::File {
                name: target.to_string(),
            }
        }
    }
}

/// Resolution failures. The display text is the chat reply.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("ID yang diberikan bukan grup WhatsApp.")]
    NotAGroup,

    #[error("Gagal melakukan blast ke grup. Pastikan ID grup valid dan bot ada di grup tersebut.")]
    Group(#[source] BotError),

    #[error("File tidak ditemukan. Pastikan file sudah diupload ke server.")]
    FileNotFound,

    #[error("Format file tidak didukung. Gunakan file CSV atau TXT.")]
    UnsupportedFormat,

    #[error("Tidak ada nomor yang valid ditemukan di file.")]
    NoValidNumbers,

    #[error("Gagal melakukan blast dari file. Pastikan format file benar.")]
    File(#[source] BotError),
}

#[derive(Debug, Clone)]
pub struct ResolvedRecipients {
    pub recipients: Vec<Recipient>,
    pub source: BroadcastSource,
}

/// Turns a blast target into an ordered list of numbers.
pub struct RecipientResolver<S: Storage> {
    directory: Arc<dyn GroupDirectory>,
    uploads: S,
}

impl<S: Storage> RecipientResolver<S> {
    pub fn new(directory: Arc<dyn GroupDirectory>, uploads: S) -> Self {
        Self { directory, uploads }
    }

    pub fn uploads(&self) -> &S {
        &self.uploads
    }

    pub async fn resolve(&self, target: &BlastTarget) -> Result<ResolvedRecipients, ResolveError> {
        match target {
            BlastTarget::InviteLink { code } => {
                let group_id = self
                    .directory
                    .group_id_from_invite(code)
                    .await
                    .map_err(ResolveError::Group)?;
                self.resolve_group(&group_id).await
            }
            BlastTarget::Group { id } => self.resolve_group(id).await,
            BlastTarget::File { name } => self.resolve_file(name).await,
        }
    }

    async fn resolve_group(&self, group_id: &str) -> Result<ResolvedRecipients, ResolveError> {
        let group = self
            .directory
            .group_info(group_id)
            .await
            .map_err(ResolveError::Group)?;
        if !group.is_group {
            return Err(ResolveError::NotAGroup);
        }

        let own_number = self
            .directory
            .own_number()
            .await
            .map_err(ResolveError::Group)?;

        let recipients: Vec<Recipient> = group
            .participants
            .iter()
            .map(|p| p.split('@').next().unwrap_or(p.as_str()))
            .filter(|number| *number != own_number)
            .map(Recipient::new)
            .collect();

        tracing::debug!(
            "👥 Group {} ({}) resolved to {} recipients",
            group.name,
            group.id,
            recipients.len()
        );

        Ok(ResolvedRecipients {
            recipients,
            source: BroadcastSource::Group { name: group.name },
        })
    }

    async fn resolve_file(&self, name: &str) -> Result<ResolvedRecipients, ResolveError> {
        if name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(ResolveError::FileNotFound);
        }
        if !self.uploads.exists(name).await {
            return Err(ResolveError::FileNotFound);
        }

        let extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());
        let parser: fn(&[u8]) -> Result<Vec<String>, BotError> = match extension.as_deref() {
            Some("csv") => numbers_from_csv,
            Some("txt") => numbers_from_txt,
            _ => return Err(ResolveError::UnsupportedFormat),
        };

        let content = self
            .uploads
            .read_file(name)
            .await
            .map_err(ResolveError::File)?;
        let numbers = parser(&content).map_err(ResolveError::File)?;
        if numbers.is_empty() {
            return Err(ResolveError::NoValidNumbers);
        }

        tracing::debug!("📄 File {} resolved to {} recipients", name, numbers.len());

        Ok(ResolvedRecipients {
            recipients: numbers.into_iter().map(Recipient::new).collect(),
            source: BroadcastSource::File {
                name: name.to_string(),
            },
        })
    }
}

fn is_number(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

/// First column of every row; rows whose first column is not all digits are skipped.
pub fn numbers_from_csv(content: &[u8]) -> Result<Vec<String>, BotError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content);

    let mut numbers = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(first) = record.get(0) {
            if is_number(first) {
                numbers.push(first.to_string());
            }
        }
    }
    Ok(numbers)
}

/// One number per line.
pub fn numbers_from_txt(content: &[u8]) -> Result<Vec<String>, BotError> {
    let text = String::from_utf8_lossy(content);
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| is_number(line))
        .map(str::to_string)
        .collect())
}
