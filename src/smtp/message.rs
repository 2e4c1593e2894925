//! Record of one client's SMTP dialogue

/// Result of the SMTP client-server interaction on one connection.
///
/// Each command stage keeps the raw request, the response the server sent
/// and whether the command was accepted. RCPT TO keeps every attempt in
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub(crate) helo_request: String,
    pub(crate) helo_response: String,
    pub(crate) helo_domain: String,
    pub(crate) helo: bool,

    pub(crate) mailfrom_request: String,
    pub(crate) mailfrom_response: String,
    pub(crate) mailfrom: bool,

    pub(crate) rcptto_request_response: Vec<(String, String)>,
    pub(crate) rcptto: bool,

    pub(crate) data_request: String,
    pub(crate) data_response: String,
    pub(crate) data: bool,

    pub(crate) msg_request: String,
    pub(crate) msg_response: String,
    pub(crate) msg: bool,

    pub(crate) rset_request: String,
    pub(crate) rset_response: String,
    pub(crate) rset: bool,

    pub(crate) noop: bool,
    pub(crate) quit_sent: bool,
}

impl Message {
    pub fn helo_request(&self) -> &str {
        &self.helo_request
    }

    pub fn helo_response(&self) -> &str {
        &self.helo_response
    }

    /// Client domain announced by an accepted HELO/EHLO
    pub fn helo_domain(&self) -> &str {
        &self.helo_domain
    }

    pub fn helo(&self) -> bool {
        self.helo
    }

    pub fn mailfrom_request(&self) -> &str {
        &self.mailfrom_request
    }

    pub fn mailfrom_response(&self) -> &str {
        &self.mailfrom_response
    }

    pub fn mailfrom(&self) -> bool {
        self.mailfrom
    }

    /// Every RCPT TO request of the transaction with the response it got
    pub fn rcptto_request_response(&self) -> &[(String, String)] {
        &self.rcptto_request_response
    }

    /// True when at least one RCPT TO of the transaction was accepted
    pub fn rcptto(&self) -> bool {
        self.rcptto
    }

    pub fn data_request(&self) -> &str {
        &self.data_request
    }

    pub fn data_response(&self) -> &str {
        &self.data_response
    }

    pub fn data(&self) -> bool {
        self.data
    }

    /// Message body received after DATA, dot-stuffing removed
    pub fn msg_request(&self) -> &str {
        &self.msg_request
    }

    pub fn msg_response(&self) -> &str {
        &self.msg_response
    }

    pub fn msg(&self) -> bool {
        self.msg
    }

    pub fn rset_request(&self) -> &str {
        &self.rset_request
    }

    pub fn rset_response(&self) -> &str {
        &self.rset_response
    }

    pub fn rset(&self) -> bool {
        self.rset
    }

    pub fn noop(&self) -> bool {
        self.noop
    }

    pub fn quit_sent(&self) -> bool {
        self.quit_sent
    }

    /// A message is consistent once MAIL FROM, RCPT TO, DATA and the body
    /// were all accepted.
    pub fn is_consistent(&self) -> bool {
        self.mailfrom && self.rcptto && self.data && self.msg
    }

    /// Get the subject line from the received body headers (if present)
    pub fn subject(&self) -> Option<&str> {
        for line in self.msg_request.lines() {
            if line.is_empty() {
                // End of headers
                break;
            }
            match line.split_once(':') {
                Some((name, value)) if name.eq_ignore_ascii_case("subject") => {
                    return Some(value.trim());
                }
                _ => {}
            }
        }
        None
    }

    /// Fresh record keeping only the HELO stage
    pub(crate) fn helo_context(&self) -> Self {
        Self {
            helo_request: self.helo_request.clone(),
            helo_response: self.helo_response.clone(),
            helo_domain: self.helo_domain.clone(),
            helo: self.helo,
            ..Default::default()
        }
    }

    /// Fresh record keeping the HELO and MAIL FROM stages
    pub(crate) fn mailfrom_context(&self) -> Self {
        Self {
            mailfrom_request: self.mailfrom_request.clone(),
            mailfrom_response: self.mailfrom_response.clone(),
            mailfrom: self.mailfrom,
            ..self.helo_context()
        }
    }

    /// Fresh record keeping the HELO, MAIL FROM and RCPT TO stages
    pub(crate) fn envelope_context(&self) -> Self {
        Self {
            rcptto_request_response: self.rcptto_request_response.clone(),
            rcptto: self.rcptto,
            ..self.mailfrom_context()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_message() -> Message {
        Message {
            helo_request: "HELO example.com".to_string(),
            helo_response: "250 Received".to_string(),
            helo_domain: "example.com".to_string(),
            helo: true,
            mailfrom_request: "MAIL FROM:<a@x.com>".to_string(),
            mailfrom_response: "250 Received".to_string(),
            mailfrom: true,
            rcptto_request_response: vec![(
                "RCPT TO:<b@x.com>".to_string(),
                "250 Received".to_string(),
            )],
            rcptto: true,
            data_request: "DATA".to_string(),
            data_response: "354 Ready".to_string(),
            data: true,
            msg_request: "Subject: Hi\r\n\r\nhello\r\n".to_string(),
            msg_response: "250 Received".to_string(),
            msg: true,
            rset_request: "RSET".to_string(),
            rset_response: "250 Received".to_string(),
            rset: true,
            noop: true,
            quit_sent: true,
        }
    }

    #[test]
    fn test_new_message() {
        let message = Message::default();

        assert!(!message.helo());
        assert!(!message.mailfrom());
        assert!(!message.rcptto());
        assert!(!message.data());
        assert!(!message.msg());
        assert!(!message.rset());
        assert!(!message.noop());
        assert!(!message.quit_sent());
        assert!(message.rcptto_request_response().is_empty());
        assert!(!message.is_consistent());
    }

    #[test]
    fn test_accessors() {
        let message = complete_message();

        assert_eq!(message.helo_request(), "HELO example.com");
        assert_eq!(message.helo_response(), "250 Received");
        assert_eq!(message.helo_domain(), "example.com");
        assert_eq!(message.mailfrom_request(), "MAIL FROM:<a@x.com>");
        assert_eq!(message.mailfrom_response(), "250 Received");
        assert_eq!(
            message.rcptto_request_response(),
            &[("RCPT TO:<b@x.com>".to_string(), "250 Received".to_string())]
        );
        assert_eq!(message.data_request(), "DATA");
        assert_eq!(message.data_response(), "354 Ready");
        assert_eq!(message.msg_request(), "Subject: Hi\r\n\r\nhello\r\n");
        assert_eq!(message.msg_response(), "250 Received");
        assert_eq!(message.rset_request(), "RSET");
        assert_eq!(message.rset_response(), "250 Received");
        assert!(message.noop());
        assert!(message.quit_sent());
    }

    #[test]
    fn test_is_consistent_for_every_stage_combination() {
        for mask in 0u8..16 {
            let message = Message {
                mailfrom: mask & 0b0001 != 0,
                rcptto: mask & 0b0010 != 0,
                data: mask & 0b0100 != 0,
                msg: mask & 0b1000 != 0,
                ..Default::default()
            };

            assert_eq!(message.is_consistent(), mask == 0b1111, "mask {mask:04b}");
        }
    }

    #[test]
    fn test_is_consistent_ignores_other_stages() {
        let message = Message {
            helo: false,
            rset: false,
            noop: false,
            quit_sent: false,
            ..complete_message()
        };

        assert!(message.is_consistent());
    }

    #[test]
    fn test_helo_context() {
        let message = complete_message().helo_context();

        assert_eq!(message.helo_request(), "HELO example.com");
        assert_eq!(message.helo_domain(), "example.com");
        assert!(message.helo());
        assert_eq!(
            message,
            Message {
                helo_request: "HELO example.com".to_string(),
                helo_response: "250 Received".to_string(),
                helo_domain: "example.com".to_string(),
                helo: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_mailfrom_context() {
        let message = complete_message().mailfrom_context();

        assert!(message.helo());
        assert!(message.mailfrom());
        assert_eq!(message.mailfrom_request(), "MAIL FROM:<a@x.com>");
        assert!(message.rcptto_request_response().is_empty());
        assert!(!message.rcptto());
        assert!(!message.noop());
        assert!(!message.quit_sent());
    }

    #[test]
    fn test_envelope_context() {
        let message = complete_message().envelope_context();

        assert!(message.helo());
        assert!(message.mailfrom());
        assert!(message.rcptto());
        assert_eq!(message.rcptto_request_response().len(), 1);
        assert!(!message.data());
        assert!(!message.msg());
        assert!(message.msg_request().is_empty());
        assert!(!message.rset());
    }

    #[test]
    fn test_subject() {
        assert_eq!(complete_message().subject(), Some("Hi"));

        let message = Message {
            msg_request: "From: a@x.com\r\n\r\nSubject: not a header\r\n".to_string(),
            ..Default::default()
        };
        assert_eq!(message.subject(), None);
    }

    #[test]
    fn test_subject_header_name_is_case_insensitive() {
        for (body, subject) in [
            ("SUBJECT:Hi\r\n\r\nbody\r\n", "Hi"),
            ("subject:  spaced out\r\n\r\n", "spaced out"),
            ("From: a@x.com\r\nsUbJeCt: mixed\r\n\r\n", "mixed"),
        ] {
            let message = Message {
                msg_request: body.to_string(),
                ..Default::default()
            };
            assert_eq!(message.subject(), Some(subject), "{body:?}");
        }

        let message = Message {
            msg_request: "Subjects: no\r\nX-Subject: no\r\n\r\n".to_string(),
            ..Default::default()
        };
        assert_eq!(message.subject(), None);
    }
}
