pub mod config;
pub mod error;
pub mod service;
pub mod types;

pub use error::{Result, SelfbotError};
pub use service::{MessageService, Notice, ServiceError};
pub use types::{ChannelId, Message, MessageId, User, UserId};
