use clap::Parser;
use std::path::PathBuf;

use super::toml_config::{BotConfig, DEFAULT_CONFIG_FILE};

/// Command line flags. Values given here override the TOML file.
#[derive(Debug, Clone, Parser)]
#[command(name = "blast-bot")]
#[command(about = "Chat bot that broadcasts messages to groups and number lists")]
pub struct CliArgs {
    #[arg(long, short, env = "BLAST_BOT_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "Log outgoing messages instead of sending them")]
    pub dry_run: bool,

    /// Sender used for plain (non-JSON) input lines, e.g. `628999@c.us`.
    #[arg(long, env = "BLAST_BOT_SENDER", default_value = "console@c.us")]
    pub sender: String,

    #[arg(long, help = "Override broadcast.delay_seconds")]
    pub delay_seconds: Option<u64>,
}

impl CliArgs {
    /// 套用命令列覆寫
    pub fn apply_overrides(&self, config: &mut BotConfig) {
        if let Some(delay) = self.delay_seconds {
            config.broadcast.delay_seconds = delay;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ConfigProvider;
    use std::time::Duration;

    #[test]
    fn test_delay_override() {
        let args = CliArgs::parse_from(["blast-bot", "--delay-seconds", "1", "--dry-run"]);
        let mut config =
            BotConfig::from_toml_str("[gateway]\nbase_url = \"http://localhost:3000\"\n").unwrap();

        args.apply_overrides(&mut config);

        assert!(args.dry_run);
        assert_eq!(config.broadcast_delay(), Duration::from_secs(1));
    }
}
