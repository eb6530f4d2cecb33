// Domain layer: core models and ports (interfaces) shared by the bot and its adapters.

pub mod model;
pub mod ports;
