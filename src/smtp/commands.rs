//! Implementation of SMTP commands

use crate::smtp::body::BodyTooBig;
use crate::smtp::config::{Configuration, is_included};
use crate::smtp::grammar;
use crate::smtp::message::Message;
use crate::smtp::response::Reply;

/// Commands the server dispatches on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// HELO or EHLO
    Helo,
    Mail,
    Rcpt,
    Data,
    Rset,
    Noop,
    Quit,
}

impl Command {
    /// Recognize the verb of a request: its first whitespace-delimited
    /// word, case-insensitive
    pub fn recognize(request: &str) -> Option<Self> {
        let verb = request.split_whitespace().next()?.to_uppercase();

        match verb.as_str() {
            "HELO" | "EHLO" => Some(Self::Helo),
            "MAIL" => Some(Self::Mail),
            "RCPT" => Some(Self::Rcpt),
            "DATA" => Some(Self::Data),
            "RSET" => Some(Self::Rset),
            "NOOP" => Some(Self::Noop),
            "QUIT" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Applies commands to a [`Message`] according to the configured rules.
///
/// Every handler first clears the part of the message it owns, then runs
/// its checks in order. The first failing check decides the response;
/// later checks are not evaluated.
#[derive(Debug)]
pub struct CommandHandler<'a> {
    config: &'a Configuration,
}

impl<'a> CommandHandler<'a> {
    /// Create a new command handler
    pub fn new(config: &'a Configuration) -> Self {
        Self { config }
    }

    /// Process a request line and return the response to send
    pub fn process_command(&self, command: Command, request: &str, message: &mut Message) -> Reply {
        match command {
            Command::Helo => self.handle_helo(request, message),
            Command::Mail => self.handle_mail(request, message),
            Command::Rcpt => self.handle_rcpt(request, message),
            Command::Data => self.handle_data(request, message),
            Command::Rset => self.handle_rset(request, message),
            Command::Noop => self.handle_noop(request, message),
            Command::Quit => self.handle_quit(request, message),
        }
    }

    /// Handle HELO/EHLO command
    fn handle_helo(&self, request: &str, message: &mut Message) -> Reply {
        let messages = &self.config.messages;
        *message = Message::default();

        let checked = grammar::helo_domain(request)
            .ok_or(&messages.invalid_cmd_helo_arg)
            .and_then(|domain| {
                if is_included(&self.config.blacklisted_helo_domains, domain) {
                    Err(&messages.helo_blacklisted_domain)
                } else {
                    Ok(domain)
                }
            });

        let reply = match checked {
            Ok(domain) => {
                message.helo_domain = domain.to_owned();
                Reply::accepted(&messages.helo_received, self.config.delays.helo)
            }
            Err(text) => Reply::rejected(text, self.config.delays.helo),
        };

        message.helo_request = request.to_owned();
        message.helo_response = reply.text.clone();
        message.helo = reply.success;
        reply
    }

    /// Handle MAIL FROM command
    fn handle_mail(&self, request: &str, message: &mut Message) -> Reply {
        let messages = &self.config.messages;
        *message = message.helo_context();

        let reply = match self.check_mail(request, message) {
            Ok(()) => Reply::accepted(&messages.mailfrom_received, self.config.delays.mailfrom),
            Err(text) => Reply::rejected(text, self.config.delays.mailfrom),
        };

        message.mailfrom_request = request.to_owned();
        message.mailfrom_response = reply.text.clone();
        message.mailfrom = reply.success;
        reply
    }

    fn check_mail(&self, request: &str, message: &Message) -> Result<(), &'a str> {
        let config = self.config;
        let messages = &config.messages;

        if !message.helo {
            return Err(messages.invalid_cmd_mailfrom_sequence.as_str());
        }

        let email =
            grammar::mailfrom_email(request).ok_or(messages.invalid_cmd_mailfrom_arg.as_str())?;

        if is_included(&config.blacklisted_mailfrom_emails, email) {
            return Err(messages.mailfrom_blacklisted_email.as_str());
        }

        Ok(())
    }

    /// Handle RCPT TO command
    fn handle_rcpt(&self, request: &str, message: &mut Message) -> Reply {
        if !self.config.multiple_rcptto {
            *message = message.mailfrom_context();
        }

        let reply = match self.check_rcpt(request, message) {
            Ok(text) => Reply::accepted(text, self.config.delays.rcptto),
            Err(text) => Reply::rejected(text, self.config.delays.rcptto),
        };

        message
            .rcptto_request_response
            .push((request.to_owned(), reply.text.clone()));
        message.rcptto = reply.success || message.rcptto;
        reply
    }

    /// Returns the success text to send, which flags unregistered recipients
    fn check_rcpt(&self, request: &str, message: &Message) -> Result<&'a str, &'a str> {
        let config = self.config;
        let messages = &config.messages;

        if !(message.helo && message.mailfrom) {
            return Err(messages.invalid_cmd_rcptto_sequence.as_str());
        }

        let email =
            grammar::rcptto_email(request).ok_or(messages.invalid_cmd_rcptto_arg.as_str())?;

        if is_included(&config.blacklisted_rcptto_emails, email) {
            return Err(messages.rcptto_blacklisted_email.as_str());
        }

        let registered = &config.registered_rcptto_emails;
        if !registered.is_empty() && !is_included(registered, email) {
            return Ok(messages.rcptto_not_registered_email.as_str());
        }

        Ok(messages.rcptto_received.as_str())
    }

    /// Handle DATA command. An accepted DATA must be followed by reading
    /// the message body.
    fn handle_data(&self, request: &str, message: &mut Message) -> Reply {
        let messages = &self.config.messages;
        *message = message.envelope_context();

        let reply = if !(message.helo && message.mailfrom && message.rcptto) {
            Reply::rejected(&messages.invalid_cmd_data_sequence, self.config.delays.data)
        } else if !grammar::is_valid_data(request) {
            Reply::rejected(&messages.invalid_cmd, self.config.delays.data)
        } else {
            Reply::accepted(&messages.data_received, self.config.delays.data)
        };

        message.data_request = request.to_owned();
        message.data_response = reply.text.clone();
        message.data = reply.success;
        reply
    }

    /// Record the outcome of reading the message body
    pub fn finish_body(&self, body: Result<String, BodyTooBig>, message: &mut Message) -> Reply {
        let messages = &self.config.messages;

        let (request, reply) = match body {
            Ok(body) => (
                body,
                Reply::accepted(&messages.msg_received, self.config.delays.message),
            ),
            Err(_) => (
                String::new(),
                Reply::rejected(&messages.msg_size_is_too_big, self.config.delays.message),
            ),
        };

        message.msg_request = request;
        message.msg_response = reply.text.clone();
        message.msg = reply.success;
        reply
    }

    /// Handle RSET command
    fn handle_rset(&self, request: &str, message: &mut Message) -> Reply {
        let messages = &self.config.messages;

        // A complete message survives RSET when several messages per
        // connection are allowed; the next MAIL FROM starts a new one.
        if !(self.config.multiple_message_receiving && message.is_consistent()) {
            *message = message.helo_context();
        }

        let reply = if !message.helo {
            Reply::rejected(&messages.invalid_cmd_rset_sequence, self.config.delays.rset)
        } else if !grammar::is_valid_rset(request) {
            Reply::rejected(&messages.invalid_cmd_rset_arg, self.config.delays.rset)
        } else {
            Reply::accepted(&messages.rset_received, self.config.delays.rset)
        };

        message.rset_request = request.to_owned();
        message.rset_response = reply.text.clone();
        message.rset = reply.success;
        reply
    }

    /// Handle NOOP command
    fn handle_noop(&self, request: &str, message: &mut Message) -> Reply {
        let messages = &self.config.messages;

        if !grammar::is_valid_noop(request) {
            return Reply::rejected(&messages.invalid_cmd, self.config.delays.noop);
        }

        message.noop = true;
        Reply::accepted(&messages.noop_received, self.config.delays.noop)
    }

    /// Handle QUIT command
    fn handle_quit(&self, request: &str, message: &mut Message) -> Reply {
        let messages = &self.config.messages;

        if !grammar::is_valid_quit(request) {
            return Reply::rejected(&messages.invalid_cmd, self.config.delays.quit);
        }

        message.quit_sent = true;
        Reply::accepted(&messages.quit_cmd, self.config.delays.quit)
    }
}
