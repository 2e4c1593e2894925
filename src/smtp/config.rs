//! Server rule set: response texts, delays, timeouts and behaviour toggles

use std::time::Duration;

/// Default bind address
pub const HOST_ADDRESS: &str = "127.0.0.1";

/// Default idle timeout applied to every client read
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(30);

/// Default time `Server::stop` waits for in-flight sessions
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Default maximum size of a message body (10MB)
pub const MSG_SIZE_LIMIT: usize = 10 * 1024 * 1024;

/// Longest command line accepted, CRLF included (RFC 5321 section 4.5.3.1.4)
pub const COMMAND_LINE_MAX_LENGTH: usize = 512;

const RECEIVED_MSG: &str = "250 Received";
const BAD_SEQUENCE_MSG: &str = "503 Bad sequence of commands";
const SERVICE_NOT_AVAILABLE_MSG: &str = "421 Service not available";

/// Mock server configuration.
///
/// Every field has a default, so only the interesting parts need spelling out:
///
/// ```rust
/// use smtp_mock::Configuration;
///
/// let config = Configuration {
///     is_cmd_fail_fast: true,
///     blacklisted_mailfrom_emails: vec!["spammer@example.com".to_owned()],
///     ..Default::default()
/// };
/// assert_eq!(config.port_number, 0);
/// ```
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Address the listener binds to
    pub host_address: String,
    /// Port the listener binds to, `0` lets the OS pick a free one
    pub port_number: u16,
    /// Idle timeout for each client read
    pub session_timeout: Duration,
    /// How long `Server::stop` waits before abandoning running sessions
    pub shutdown_timeout: Duration,
    /// Maximum message body size in bytes
    pub msg_size_limit: usize,
    /// End the session as soon as a command is rejected
    pub is_cmd_fail_fast: bool,
    /// Keep every RCPT TO of a transaction instead of only the last one
    pub multiple_rcptto: bool,
    /// Allow several messages per connection, separated by RSET
    pub multiple_message_receiving: bool,
    pub blacklisted_helo_domains: Vec<String>,
    pub blacklisted_mailfrom_emails: Vec<String>,
    pub blacklisted_rcptto_emails: Vec<String>,
    /// When non-empty, recipients outside this list are answered with
    /// `Messages::rcptto_not_registered_email`
    pub registered_rcptto_emails: Vec<String>,
    /// Install a stdout `tracing` subscriber when the server is created
    pub log_to_stdout: bool,
    /// Log requests, responses and session boundaries at info level
    pub log_server_activity: bool,
    pub messages: Messages,
    pub delays: ResponseDelays,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            host_address: HOST_ADDRESS.to_owned(),
            port_number: 0,
            session_timeout: SESSION_TIMEOUT,
            shutdown_timeout: SHUTDOWN_TIMEOUT,
            msg_size_limit: MSG_SIZE_LIMIT,
            is_cmd_fail_fast: false,
            multiple_rcptto: false,
            multiple_message_receiving: false,
            blacklisted_helo_domains: Vec::new(),
            blacklisted_mailfrom_emails: Vec::new(),
            blacklisted_rcptto_emails: Vec::new(),
            registered_rcptto_emails: Vec::new(),
            log_to_stdout: false,
            log_server_activity: false,
            messages: Messages::default(),
            delays: ResponseDelays::default(),
        }
    }
}

impl Configuration {
    /// `host:port` the listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host_address, self.port_number)
    }
}

/// Response texts sent to the client, status code included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Messages {
    pub greeting: String,
    pub invalid_cmd: String,
    pub quit_cmd: String,

    pub invalid_cmd_helo_arg: String,
    pub helo_blacklisted_domain: String,
    pub helo_received: String,

    pub invalid_cmd_mailfrom_sequence: String,
    pub invalid_cmd_mailfrom_arg: String,
    pub mailfrom_blacklisted_email: String,
    pub mailfrom_received: String,

    pub invalid_cmd_rcptto_sequence: String,
    pub invalid_cmd_rcptto_arg: String,
    pub rcptto_not_registered_email: String,
    pub rcptto_blacklisted_email: String,
    pub rcptto_received: String,

    pub invalid_cmd_data_sequence: String,
    pub data_received: String,

    pub msg_size_is_too_big: String,
    pub msg_received: String,

    pub invalid_cmd_rset_sequence: String,
    pub invalid_cmd_rset_arg: String,
    pub rset_received: String,

    pub noop_received: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            greeting: "220 Welcome".to_owned(),
            invalid_cmd: "500 Invalid command".to_owned(),
            quit_cmd: "221 Closing connection".to_owned(),

            invalid_cmd_helo_arg: "501 HELO requires domain address".to_owned(),
            helo_blacklisted_domain: SERVICE_NOT_AVAILABLE_MSG.to_owned(),
            helo_received: RECEIVED_MSG.to_owned(),

            invalid_cmd_mailfrom_sequence: BAD_SEQUENCE_MSG.to_owned(),
            invalid_cmd_mailfrom_arg: "501 MAIL FROM requires valid email address".to_owned(),
            mailfrom_blacklisted_email: SERVICE_NOT_AVAILABLE_MSG.to_owned(),
            mailfrom_received: RECEIVED_MSG.to_owned(),

            invalid_cmd_rcptto_sequence: BAD_SEQUENCE_MSG.to_owned(),
            invalid_cmd_rcptto_arg: "501 RCPT TO requires valid email address".to_owned(),
            rcptto_not_registered_email: "250 Received, recipient is not registered".to_owned(),
            rcptto_blacklisted_email: SERVICE_NOT_AVAILABLE_MSG.to_owned(),
            rcptto_received: RECEIVED_MSG.to_owned(),

            invalid_cmd_data_sequence: BAD_SEQUENCE_MSG.to_owned(),
            data_received: "354 Ready for receive message. End data with <CR><LF>.<CR><LF>"
                .to_owned(),

            msg_size_is_too_big: "552 Message exceeds max size limit".to_owned(),
            msg_received: RECEIVED_MSG.to_owned(),

            invalid_cmd_rset_sequence: BAD_SEQUENCE_MSG.to_owned(),
            invalid_cmd_rset_arg: "501 RSET does not accept arguments".to_owned(),
            rset_received: RECEIVED_MSG.to_owned(),

            noop_received: RECEIVED_MSG.to_owned(),
        }
    }
}

/// Artificial delay before each command's response. Zero responds immediately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseDelays {
    pub helo: Duration,
    pub mailfrom: Duration,
    pub rcptto: Duration,
    pub data: Duration,
    pub message: Duration,
    pub rset: Duration,
    pub noop: Duration,
    pub quit: Duration,
}

/// Exact, case-sensitive membership test used for blacklists and the
/// registration list
pub(crate) fn is_included(list: &[String], item: &str) -> bool {
    list.iter().any(|entry| entry == item)
}
