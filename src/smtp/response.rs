//! SMTP response handling

use std::time::Duration;

/// A response produced by a command handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Response text as configured, status code included (e.g. "250 Received")
    pub text: String,
    /// Delay to apply before sending the text
    pub delay: Duration,
    /// Whether the command was accepted
    pub success: bool,
}

impl Reply {
    /// Create a reply for an accepted command
    pub fn accepted(text: &str, delay: Duration) -> Self {
        Self {
            text: text.to_owned(),
            delay,
            success: true,
        }
    }

    /// Create a reply for a rejected command
    pub fn rejected(text: &str, delay: Duration) -> Self {
        Self {
            text: text.to_owned(),
            delay,
            success: false,
        }
    }

    /// Format the response for sending over the wire
    pub fn format(&self) -> String {
        format!("{}\r\n", self.text)
    }
}
