//! # smtp-mock
//!
//! smtp-mock is a configurable SMTP server for testing.
//!
//! It lets tests exercise real SMTP clients against a server whose answers
//! are scripted through a [`Configuration`], then inspect what each client
//! actually said.
//!
//! ## Quick Start
//!
//! ```rust
//! use smtp_mock::{Configuration, Server};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), smtp_mock::SmtpError> {
//! let server = Server::new(Configuration {
//!     blacklisted_mailfrom_emails: vec!["spammer@example.com".to_owned()],
//!     ..Default::default()
//! });
//! server.start().await?;
//!
//! // Application sends email to 127.0.0.1:{server.port_number()}
//! // ...
//!
//! server.stop().await?;
//!
//! // Check what the clients did
//! for message in server.messages() {
//!     println!("consistent: {}", message.is_consistent());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Supported SMTP commands
//!
//! - `HELO` / `EHLO` - Identify the client
//! - `MAIL FROM` - Specify the sender's address
//! - `RCPT TO` - Specify a recipient (several per message with `multiple_rcptto`)
//! - `DATA` - Send the message body
//! - `RSET` - Reset the current transaction
//! - `NOOP` - Do nothing
//! - `QUIT` - Close connection
//!
//! ## Scripted behaviour
//!
//! - Every response text can be replaced through [`Messages`].
//! - Every command can be answered after a delay through [`ResponseDelays`].
//! - HELO domains, senders and recipients can be blacklisted.
//! - With `is_cmd_fail_fast` the connection is closed on the first rejected command.
//! - With `multiple_message_receiving` a client may send several messages
//!   per connection, separated by `RSET`.
//!
//! ## Recorded messages
//!
//! After every command a snapshot of the connection's [`Message`] is
//! appended to the server's log. [`Server::messages`] returns all of them in
//! arrival order, also after the server was stopped.
//!
//! ## Notes
//!
//! - Runs in-memory only. Message persistence is not supported.
//! - SMTP authentication is not supported.
//! - SSL/TLS connection is not supported.
//! - Mail relay is not supported.

mod smtp;

pub use smtp::{
    Command, CommandHandler, Configuration, Message, MessageList, MessageSink, Messages, Reply,
    ResponseDelays, Server, Session, SmtpError,
};
pub use smtp::{body, config, grammar, logging};
