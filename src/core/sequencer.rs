use crate::domain::model::{
    BroadcastJob, BroadcastSummary, OutboundMessage, Recipient, SendOutcome,
};
use crate::domain::ports::{ConfigProvider, Notifier, Transport};
use std::time::Duration;
use tokio::time::Instant;

/// Pause between two consecutive sends.
pub const DEFAULT_SEND_DELAY: Duration = Duration::from_secs(5);

/// 發送節奏設定：固定間隔，預設不重試
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastPolicy {
    pub delay: Duration,
    pub max_retries: u32,
}

impl Default for BroadcastPolicy {
    fn default() -> Self {
        Self {
            delay: DEFAULT_SEND_DELAY,
            max_retries: 0,
        }
    }
}

impl BroadcastPolicy {
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self {
            delay: config.broadcast_delay(),
            max_retries: config.max_retries(),
        }
    }
}

/// Seconds for chat notices: `5` for whole seconds, `1.5` or `0.001` otherwise.
pub fn format_seconds(delay: Duration) -> String {
    if delay.subsec_nanos() == 0 {
        delay.as_secs().to_string()
    } else {
        delay.as_secs_f64().to_string()
    }
}

/// Sends a job to its recipients one at a time, in order, pausing between
/// sends. A failed recipient never stops the run.
#[derive(Debug, Clone, Default)]
pub struct BroadcastSequencer {
    policy: BroadcastPolicy,
}

impl BroadcastSequencer {
    pub fn new(policy: BroadcastPolicy) -> Self {
        Self { policy }
    }

    /// 執行一次 blast，前後各通知一次
    pub async fn run(
        &self,
        job: &BroadcastJob,
        transport: &dyn Transport,
        notifier: &dyn Notifier,
    ) -> BroadcastSummary {
        let start_notice = format!(
            "Memulai blast ke {} nomor{} dengan delay {} detik per pesan.",
            job.recipients().len(),
            job.source(),
            format_seconds(self.policy.delay)
        );
        if let Err(e) = notifier.notify(&start_notice).await {
            tracing::warn!("⚠️ Failed to deliver start notice: {}", e);
        }

        let summary = self.dispatch(job, transport).await;

        let completion_notice = format!(
            "Blast selesai! {} dari {} pesan terkirim.",
            summary.sent, summary.total
        );
        if let Err(e) = notifier.notify(&completion_notice).await {
            tracing::warn!("⚠️ Failed to deliver completion notice: {}", e);
        }

        summary
    }

    /// Runs the send loop without any notifications.
    pub async fn dispatch(&self, job: &BroadcastJob, transport: &dyn Transport) -> BroadcastSummary {
        let recipients = job.recipients();
        let total = recipients.len();
        let message = job.message();
        let started = Instant::now();

        tracing::info!(
            "📤 Broadcasting to {} recipients (delay: {:?}, retries: {})",
            total,
            self.policy.delay,
            self.policy.max_retries
        );

        let mut sent = 0;
        for (index, recipient) in recipients.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.policy.delay).await;
            }

            match self.send_with_retry(transport, recipient, &message).await {
                SendOutcome::Sent => {
                    sent += 1;
                    tracing::info!("Sent to {} ({}/{})", recipient, index + 1, total);
                }
                SendOutcome::Failed(reason) => {
                    tracing::error!(
                        "❌ Error sending to {} ({}/{}): {}",
                        recipient,
                        index + 1,
                        total,
                        reason
                    );
                }
            }
        }

        let summary = BroadcastSummary { total, sent };
        tracing::info!(
            "✅ Broadcast finished: {}/{} sent, {} failed, took {:?}",
            summary.sent,
            summary.total,
            summary.failed(),
            started.elapsed()
        );
        summary
    }

    async fn send_with_retry(
        &self,
        transport: &dyn Transport,
        recipient: &Recipient,
        message: &OutboundMessage,
    ) -> SendOutcome {
        let mut attempt = 0;
        loop {
            match transport.send(recipient, message).await {
                Ok(()) => return SendOutcome::Sent,
                Err(e) if attempt < self.policy.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        "🔁 Retrying {} ({}/{}) after error: {}",
                        recipient,
                        attempt,
                        self.policy.max_retries,
                        e
                    );
                    tokio::time::sleep(self.policy.delay).await;
                }
                Err(e) => return SendOutcome::Failed(e.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Attachment;
    use crate::utils::error::{BotError, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingTransport {
        calls: Mutex<Vec<(String, OutboundMessage)>>,
        failures: Mutex<HashMap<String, usize>>,
    }

    impl RecordingTransport {
        fn failing(number: &str, times: usize) -> Self {
            let transport = Self::default();
            transport
                .failures
                .lock()
                .unwrap()
                .insert(number.to_string(), times);
            transport
        }

        fn numbers(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(n, _)| n.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, recipient: &Recipient, message: &OutboundMessage) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((recipient.number().to_string(), message.clone()));
            let mut failures = self.failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(recipient.number()) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(BotError::TransportError {
                        recipient: recipient.to_string(),
                        reason: "rejected".to_string(),
                    });
                }
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct CollectingNotifier {
        notices: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for CollectingNotifier {
        async fn notify(&self, text: &str) -> Result<()> {
            self.notices.lock().unwrap().push(text.to_string());
            Ok(())
        }

        async fn notify_media(&self, _attachment: Attachment, caption: &str) -> Result<()> {
            self.notices.lock().unwrap().push(caption.to_string());
            Ok(())
        }
    }

    fn job(numbers: &[&str]) -> BroadcastJob {
        BroadcastJob::new(numbers.iter().map(|n| Recipient::new(*n)).collect(), "hi")
    }

    #[tokio::test(start_paused = true)]
    async fn test_sends_in_order_with_delay() {
        let transport = RecordingTransport::default();
        let notifier = CollectingNotifier::default();
        let sequencer = BroadcastSequencer::default();

        let started = Instant::now();
        let summary = sequencer
            .run(&job(&["111", "222", "333"]), &transport, &notifier)
            .await;

        assert_eq!(transport.numbers(), vec!["111", "222", "333"]);
        assert!(started.elapsed() >= DEFAULT_SEND_DELAY * 2);
        assert_eq!(summary, BroadcastSummary { total: 3, sent: 3 });

        let notices = notifier.notices.lock().unwrap();
        assert_eq!(notices.len(), 2);
        assert!(notices[0].contains("3 nomor"));
        assert!(notices[1].contains("3 dari 3"));
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(Duration::from_secs(5)), "5");
        assert_eq!(format_seconds(Duration::from_millis(1500)), "1.5");
        assert_eq!(format_seconds(Duration::from_millis(1)), "0.001");
        assert_eq!(format_seconds(Duration::ZERO), "0");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sub_second_delay_in_start_notice() {
        let notifier = CollectingNotifier::default();
        let sequencer = BroadcastSequencer::new(BroadcastPolicy {
            delay: Duration::from_millis(250),
            max_retries: 0,
        });

        sequencer
            .run(&job(&["111"]), &RecordingTransport::default(), &notifier)
            .await;

        let notices = notifier.notices.lock().unwrap();
        assert!(notices[0].ends_with("dengan delay 0.25 detik per pesan."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_abort() {
        let transport = RecordingTransport::failing("111", usize::MAX);
        let sequencer = BroadcastSequencer::default();

        let summary = sequencer.dispatch(&job(&["111", "222"]), &transport).await;

        assert_eq!(transport.numbers(), vec!["111", "222"]);
        assert_eq!(summary, BroadcastSummary { total: 2, sent: 1 });
        assert_eq!(summary.failed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_job_makes_no_calls_and_no_delay() {
        let transport = RecordingTransport::default();
        let notifier = CollectingNotifier::default();
        let sequencer = BroadcastSequencer::default();

        let started = Instant::now();
        let summary = sequencer.run(&job(&[]), &transport, &notifier).await;

        assert!(transport.numbers().is_empty());
        assert!(started.elapsed() < DEFAULT_SEND_DELAY);
        assert_eq!(summary, BroadcastSummary::default());
        assert_eq!(notifier.notices.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_policy_recovers_transient_failure() {
        let transport = RecordingTransport::failing("111", 1);
        let sequencer = BroadcastSequencer::new(BroadcastPolicy {
            delay: Duration::from_millis(10),
            max_retries: 2,
        });

        let summary = sequencer.dispatch(&job(&["111"]), &transport).await;

        assert_eq!(transport.numbers(), vec!["111", "111"]);
        assert_eq!(summary.sent, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attachment_sent_as_caption_to_everyone() {
        let transport = RecordingTransport::default();
        let media = BroadcastJob::new(vec![Recipient::new("111"), Recipient::new("222")], "promo")
            .with_attachment(Attachment {
                mime_type: "image/jpeg".to_string(),
                filename: Some("promo.jpg".to_string()),
                data: vec![0xFF, 0xD8],
            });

        BroadcastSequencer::default().dispatch(&media, &transport).await;

        let calls = transport.calls.lock().unwrap();
        let shared: Vec<Arc<Attachment>> = calls
            .iter()
            .map(|(_, message)| match message {
                OutboundMessage::Media {
                    attachment,
                    caption,
                } => {
                    assert_eq!(caption, "promo");
                    Arc::clone(attachment)
                }
                OutboundMessage::Text(_) => panic!("expected media message"),
            })
            .collect();
        assert_eq!(shared.len(), 2);
        assert!(Arc::ptr_eq(&shared[0], &shared[1]));
    }
}
