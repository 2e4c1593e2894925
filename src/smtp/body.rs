//! Assembly of the message body sent after DATA

use thiserror::Error;

/// The body grew past the configured limit
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Message body exceeds {limit} bytes")]
pub struct BodyTooBig {
    pub limit: usize,
}

/// Outcome of feeding one line to a [`MessageBody`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyLine {
    /// Line stored, keep reading
    Continue,
    /// Lone period received, the body is complete
    End,
}

/// Collects body lines until the lone-period terminator
#[derive(Debug)]
pub struct MessageBody {
    data: Vec<u8>,
    limit: usize,
}

impl MessageBody {
    pub fn new(limit: usize) -> Self {
        Self {
            data: Vec::new(),
            limit,
        }
    }

    /// Feed one raw line, terminator included
    pub fn push_line(&mut self, line: &[u8]) -> Result<BodyLine, BodyTooBig> {
        if line == b".\r\n" || line == b".\n" {
            return Ok(BodyLine::End);
        }

        // Transparency: one leading period is removed (RFC 5321 section 4.5.2)
        let line = line.strip_prefix(b".").unwrap_or(line);

        if self.data.len() + line.len() > self.limit {
            return Err(BodyTooBig { limit: self.limit });
        }

        self.data.extend_from_slice(line);
        Ok(BodyLine::Continue)
    }

    /// Bytes collected so far
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The assembled body, invalid UTF-8 replaced
    pub fn into_string(self) -> String {
        match String::from_utf8(self.data) {
            Ok(body) => body,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        }
    }
}
