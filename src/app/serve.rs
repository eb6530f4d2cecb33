use crate::adapters::inbound::parse_inbound_line;
use crate::app::bot::Bot;
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinSet;

/// 逐行讀取收到的訊息，每則訊息在獨立的 task 處理
///
/// Lines that are not UTF-8 or not valid JSON are logged and skipped. The
/// loop ends at end of input, on a read error, or when `shutdown` resolves;
/// commands already running are awaited before returning.
pub async fn serve<R, S, F>(
    mut reader: R,
    console_sender: &str,
    bot: Arc<Bot<S>>,
    shutdown: F,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    S: Storage + 'static,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut tasks = JoinSet::new();
    let mut buf = Vec::new();

    let outcome = loop {
        buf.clear();
        let read = tokio::select! {
            read = reader.read_until(b'\n', &mut buf) => read,
            _ = &mut shutdown => {
                tracing::info!("Interrupted, no longer accepting messages");
                break Ok(());
            }
        };
        match read {
            Ok(0) => break Ok(()),
            Ok(_) => {}
            Err(e) => break Err(e.into()),
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("⚠️ Skipping input line that is not UTF-8: {}", e);
                continue;
            }
        };

        let message = match parse_inbound_line(line, console_sender) {
            Ok(Some(message)) => message,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!("⚠️ Skipping malformed input line: {}", e);
                continue;
            }
        };

        // 每則訊息獨立處理，blast 進行中仍可回應其他指令
        let bot = Arc::clone(&bot);
        tasks.spawn(async move {
            if let Err(e) = bot.handle(&message).await {
                tracing::error!(
                    "❌ Handling message from {} failed: {} (Category: {:?}, Severity: {:?})",
                    message.from,
                    e,
                    e.category(),
                    e.severity()
                );
                tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            }
        });

        while tasks.try_join_next().is_some() {}
    };

    if !tasks.is_empty() {
        tracing::info!("Waiting for {} running command(s) to finish", tasks.len());
    }
    while tasks.join_next().await.is_some() {}

    outcome
}
