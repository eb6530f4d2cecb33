// Adapters layer: concrete implementations of the domain ports.

pub mod console;
pub mod gateway;
pub mod inbound;
pub mod json_store;
pub mod reply;
pub mod storage;

pub use console::LogTransport;
pub use gateway::HttpGateway;
pub use json_store::JsonFileStore;
pub use reply::ReplyNotifier;
pub use storage::LocalStorage;
