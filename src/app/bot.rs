use crate::adapters::reply::ReplyNotifier;
use crate::app::access::{
    normalize_number, parse_expiry, AccessControl, AccessDecision, EXPIRY_HELP,
};
use crate::app::commands::{parse_command, Command, UsageError};
use crate::app::report::{
    build_report_archive, report_attachment, report_file_name, REPORT_CAPTION,
};
use crate::app::resolver::{BlastTarget, RecipientResolver, INVITE_LINK_PREFIX};
use crate::core::sequencer::{BroadcastPolicy, BroadcastSequencer};
use crate::domain::model::{
    AccessEntry, BroadcastJob, BroadcastSummary, InboundMessage, Recipient, ReportEntry,
};
use crate::domain::ports::{GroupDirectory, Notifier, ReportStore, Storage, Transport};
use crate::utils::error::Result;
use chrono::{Local, NaiveDateTime};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const UNAUTHORIZED_REPLY: &str =
    "Maaf, anda tidak memiliki akses ke Bot ini. Silahkan hubungi developer untuk bantuan.";
pub const EXPIRED_REPLY: &str =
    "Maaf, akses anda sudah kadaluarsa. Silahkan hubungi admin untuk memperpanjang.";
pub const QUEUED_REPLY: &str =
    "Blast lain sedang berjalan. Blast anda masuk antrian dan akan dimulai setelahnya.";
pub const FAILURE_REPLY: &str =
    "Gagal memproses perintah. Silahkan coba lagi atau hubungi admin.";

const HELP_TEXT: &str = "Halo! Selamat datang di WhatsApp Blast Bot. Gunakan perintah berikut:\n\n\
!blast {id_grup} {pesan} - Kirim pesan ke semua anggota grup\n\
!blast {nama_file} {pesan} - Kirim pesan ke nomor dalam file\n\
!getidgrup {link_grup} - Dapatkan ID grup dari link\n\n\
Fitur admin:\n\
!adduser {nomor} {expired} - Tambah user\n\
!edituser {nomor} {expired} - Edit user\n\
!deluser {nomor} - Hapus user\n\
!laporan - Lihat laporan";

/// Exported reports are kept under this directory of the uploads storage.
pub const REPORTS_DIR: &str = "reports";

pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// 指令處理器：權限檢查後分派到各指令
///
/// Every inbound message is handled independently. Blasts share one lane so
/// only a single job sends at a time; other commands are never blocked by it.
pub struct Bot<S: Storage> {
    transport: Arc<dyn Transport>,
    directory: Arc<dyn GroupDirectory>,
    access: AccessControl,
    reports: Arc<dyn ReportStore>,
    resolver: RecipientResolver<S>,
    sequencer: BroadcastSequencer,
    broadcast_lane: Mutex<()>,
    clock: Clock,
}

impl<S: Storage> Bot<S> {
    pub fn new(
        transport: Arc<dyn Transport>,
        directory: Arc<dyn GroupDirectory>,
        access: AccessControl,
        reports: Arc<dyn ReportStore>,
        uploads: S,
        policy: BroadcastPolicy,
    ) -> Self {
        Self {
            transport,
            resolver: RecipientResolver::new(Arc::clone(&directory), uploads),
            directory,
            access,
            reports,
            sequencer: BroadcastSequencer::new(policy),
            broadcast_lane: Mutex::new(()),
            clock: Arc::new(|| Local::now().naive_local()),
        }
    }

    /// Replaces the wall clock, e.g. with a fixed time in tests.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Handles one inbound message. A command that fails still gets a
    /// reply; the error is returned for logging.
    pub async fn handle(&self, message: &InboundMessage) -> Result<()> {
        let parsed = match parse_command(&message.body) {
            Ok(None) => return Ok(()),
            Ok(Some(command)) => Ok(command),
            Err(usage) => Err(usage),
        };

        let notifier = ReplyNotifier::new(
            Arc::clone(&self.transport),
            Recipient::new(message.from.clone()),
        );

        let result = self.respond(message, parsed, &notifier).await;
        if result.is_err() {
            if let Err(e) = notifier.notify(FAILURE_REPLY).await {
                tracing::warn!("⚠️ Failed to deliver failure reply to {}: {}", message.from, e);
            }
        }
        result
    }

    async fn respond(
        &self,
        message: &InboundMessage,
        parsed: std::result::Result<Command, UsageError>,
        notifier: &ReplyNotifier,
    ) -> Result<()> {
        let sender = message.sender_number();
        let today = (self.clock)().date();

        let admin = match self.access.check(sender, today).await? {
            AccessDecision::Allowed { admin } => admin,
            AccessDecision::Unknown if matches!(parsed, Ok(Command::Start)) => false,
            AccessDecision::Unknown => {
                tracing::info!("🚫 Refused {} from unknown sender {}", message.body, sender);
                return notifier.notify(UNAUTHORIZED_REPLY).await;
            }
            AccessDecision::Expired(entry) => {
                tracing::info!("🚫 Access of {} expired on {}", sender, entry.expired);
                return notifier.notify(EXPIRED_REPLY).await;
            }
        };

        let command = match parsed {
            Ok(command) => command,
            Err(usage) if usage.admin_only && !admin => return Ok(()),
            Err(usage) => return notifier.notify(&usage.to_string()).await,
        };

        if command.requires_admin() && !admin {
            tracing::debug!("Ignoring {} from non-admin {}", command.keyword(), sender);
            return Ok(());
        }

        tracing::info!("📥 {} from {}", command.keyword(), sender);

        match command {
            Command::Start => notifier.notify(HELP_TEXT).await,
            Command::Blast { target, message: text } => {
                self.handle_blast(message, &target, &text, notifier)
                    .await
                    .map(|_| ())
            }
            Command::GetGroupId { invite_link } => {
                self.handle_get_group_id(&invite_link, notifier).await
            }
            Command::AddUser { number, expiry } => {
                self.handle_add_user(&number, &expiry, notifier).await
            }
            Command::EditUser { number, expiry } => {
                self.handle_edit_user(&number, &expiry, notifier).await
            }
            Command::DeleteUser { number } => self.handle_delete_user(&number, notifier).await,
            Command::Report => self.handle_report(notifier).await,
        }
    }

    /// Returns the summary when the blast ran.
    async fn handle_blast(
        &self,
        message: &InboundMessage,
        target: &str,
        text: &str,
        notifier: &ReplyNotifier,
    ) -> Result<Option<BroadcastSummary>> {
        let entry = ReportEntry {
            user: message.from.clone(),
            command: "blast".to_string(),
            target: target.to_string(),
            message: text.to_string(),
            timestamp: (self.clock)().format("%Y-%m-%dT%H:%M:%S").to_string(),
        };
        if let Err(e) = self.reports.append(entry).await {
            tracing::warn!("⚠️ Failed to record blast report: {}", e);
        }

        let resolved = match self.resolver.resolve(&BlastTarget::parse(target)).await {
            Ok(resolved) => resolved,
            Err(e) => {
                match std::error::Error::source(&e) {
                    Some(cause) => tracing::warn!("❌ Blast to {} failed: {} ({})", target, e, cause),
                    None => tracing::warn!("❌ Blast to {} failed: {}", target, e),
                }
                notifier.notify(&e.to_string()).await?;
                return Ok(None);
            }
        };

        let mut job = BroadcastJob::new(resolved.recipients, text).with_source(resolved.source);
        if let Some(attachment) = &message.attachment {
            job = job.with_attachment(attachment.clone());
        }

        let _lane = match self.broadcast_lane.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                notifier.notify(QUEUED_REPLY).await?;
                self.broadcast_lane.lock().await
            }
        };

        let summary = self
            .sequencer
            .run(&job, self.transport.as_ref(), notifier)
            .await;
        Ok(Some(summary))
    }

    async fn handle_get_group_id(&self, invite_link: &str, notifier: &ReplyNotifier) -> Result<()> {
        let Some(code) = invite_link.strip_prefix(INVITE_LINK_PREFIX) else {
            return notifier
                .notify("Link grup tidak valid. Harus dimulai dengan https://chat.whatsapp.com/")
                .await;
        };

        match self.directory.group_id_from_invite(code).await {
            Ok(group_id) => {
                notifier
                    .notify(&format!("ID grup untuk link tersebut adalah: {}", group_id))
                    .await
            }
            Err(e) => {
                tracing::warn!("❌ Failed to resolve invite {}: {}", code, e);
                notifier
                    .notify(
                        "Gagal mendapatkan ID grup. Pastikan link valid dan bot bisa mengakses grup.",
                    )
                    .await
            }
        }
    }

    async fn handle_add_user(&self, number: &str, expiry: &str, notifier: &ReplyNotifier) -> Result<()> {
        let number = normalize_number(number);
        if number.is_empty() {
            return notifier
                .notify("Format salah. Gunakan: !adduser {nomor} {expired}")
                .await;
        }
        let today = (self.clock)().date();
        let Some(expired) = parse_expiry(expiry, today) else {
            return notifier
                .notify(&format!("Format expired tidak valid. Gunakan: {}", EXPIRY_HELP))
                .await;
        };

        let store = self.access.store();
        if store.get(&number).await?.is_some() {
            return notifier
                .notify(&format!(
                    "User dengan nomor {} sudah ada. Gunakan !edituser untuk mengubah.",
                    number
                ))
                .await;
        }

        store
            .upsert(AccessEntry {
                number: number.clone(),
                created: today,
                expired,
            })
            .await?;
        tracing::info!("👤 Added user {} (expires {})", number, expired);
        notifier
            .notify(&format!(
                "Berhasil menambahkan user {} dengan expired {}.",
                number,
                expired.format("%Y-%m-%d")
            ))
            .await
    }

    async fn handle_edit_user(&self, number: &str, expiry: &str, notifier: &ReplyNotifier) -> Result<()> {
        let number = normalize_number(number);
        let today = (self.clock)().date();
        let Some(expired) = parse_expiry(expiry, today) else {
            return notifier
                .notify(&format!("Format expired tidak valid. Gunakan: {}", EXPIRY_HELP))
                .await;
        };

        let store = self.access.store();
        let Some(mut entry) = store.get(&number).await? else {
            return notifier
                .notify(&format!("User dengan nomor {} tidak ditemukan.", number))
                .await;
        };

        entry.expired = expired;
        store.upsert(entry).await?;
        tracing::info!("👤 Updated user {} (expires {})", number, expired);
        notifier
            .notify(&format!(
                "Berhasil mengupdate user {} dengan expired {}.",
                number,
                expired.format("%Y-%m-%d")
            ))
            .await
    }

    async fn handle_delete_user(&self, number: &str, notifier: &ReplyNotifier) -> Result<()> {
        let number = normalize_number(number);
        if !self.access.store().delete(&number).await? {
            return notifier
                .notify(&format!("User dengan nomor {} tidak ditemukan.", number))
                .await;
        }
        tracing::info!("👤 Deleted user {}", number);
        notifier
            .notify(&format!("Berhasil menghapus user {}.", number))
            .await
    }

    async fn handle_report(&self, notifier: &ReplyNotifier) -> Result<()> {
        let now = (self.clock)();
        let users = self.access.store().list().await?;
        let reports = self.reports.list().await?;

        let data = build_report_archive(&users, &reports, now.date())?;
        let file_name = report_file_name(now);
        self.resolver
            .uploads()
            .write_file(&format!("{}/{}", REPORTS_DIR, file_name), &data)
            .await?;
        tracing::info!(
            "📊 Report {} exported ({} users, {} blasts)",
            file_name,
            users.len(),
            reports.len()
        );

        notifier
            .notify_media(report_attachment(&file_name, data), REPORT_CAPTION)
            .await
    }
}
