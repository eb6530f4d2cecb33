pub mod sequencer;

pub use crate::domain::ports::{ConfigProvider, Notifier, Storage, Transport};
pub use crate::utils::error::Result;
pub use sequencer::{BroadcastPolicy, BroadcastSequencer, DEFAULT_SEND_DELAY};
