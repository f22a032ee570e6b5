pub mod adapter;
pub mod error;
mod gateway;
pub mod handler;
pub mod service;
mod wire;

pub use adapter::DiscordAdapter;
pub use error::DiscordError;
pub use handler::{GatewayHandler, SelfbotHandler};
pub use service::DiscordService;
