pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;

pub use adapters::{HttpGateway, JsonFileStore, LocalStorage, LogTransport, ReplyNotifier};
pub use app::Bot;
pub use config::BotConfig;
pub use crate::core::{BroadcastPolicy, BroadcastSequencer};
pub use utils::error::{BotError, Result};
