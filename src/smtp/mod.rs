//! SMTP mock server implementation

pub mod body;
pub mod commands;
pub mod config;
pub mod error;
pub mod grammar;
pub mod logging;
pub mod message;
pub mod message_list;
pub mod response;
pub mod server;
pub mod session;

pub use commands::{Command, CommandHandler};
pub use config::{Configuration, Messages, ResponseDelays};
pub use error::SmtpError;
pub use message::Message;
pub use message_list::{MessageList, MessageSink};
pub use response::Reply;
pub use server::Server;
pub use session::Session;
