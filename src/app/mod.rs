pub mod access;
pub mod bot;
pub mod commands;
pub mod report;
pub mod resolver;
pub mod serve;

pub use bot::Bot;
pub use serve::serve;
