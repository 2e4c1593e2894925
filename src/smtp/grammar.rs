//! Command syntax checks.
//!
//! Every predicate takes a request line with surrounding whitespace already
//! trimmed.

use regex::Regex;
use std::sync::LazyLock;

static AVAILABLE_CMDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?:helo|ehlo|data|rset|noop|quit)\b|(?:mail\s+from|rcpt\s+to):)")
        .expect("available commands pattern")
});

static HELO_CMD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:helo|ehlo)\s+(?P<domain>[a-z0-9](?:[a-z0-9-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]*[a-z0-9])?)*\.?|\[[0-9a-f:.]+\])$",
    )
    .expect("HELO pattern")
});

static MAILFROM_CMD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^mail\s+from:\s?<(?P<email>[^\s<>@]+@[^\s<>@]+)?>(?:\s+[a-z0-9][a-z0-9-]*(?:=\S+)?)*$",
    )
    .expect("MAIL FROM pattern")
});

static RCPTTO_CMD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^rcpt\s+to:\s?<(?P<email>[^\s<>@]+@[^\s<>@]+)>(?:\s+[a-z0-9][a-z0-9-]*(?:=\S+)?)*$",
    )
    .expect("RCPT TO pattern")
});

static DATA_CMD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^data$").expect("DATA pattern"));
static RSET_CMD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^rset$").expect("RSET pattern"));
static NOOP_CMD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^noop$").expect("NOOP pattern"));
static QUIT_CMD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^quit$").expect("QUIT pattern"));

/// Whether the request starts with a verb the server knows about
pub fn is_available_command(request: &str) -> bool {
    AVAILABLE_CMDS.is_match(request)
}

/// Client domain of a well-formed HELO/EHLO request
pub fn helo_domain(request: &str) -> Option<&str> {
    capture(&HELO_CMD, request, "domain")
}

/// Sender of a well-formed MAIL FROM request. The null reverse-path `<>`
/// yields an empty string.
pub fn mailfrom_email(request: &str) -> Option<&str> {
    MAILFROM_CMD
        .captures(request)
        .map(|caps| caps.name("email").map_or("", |m| m.as_str()))
}

/// Recipient of a well-formed RCPT TO request
pub fn rcptto_email(request: &str) -> Option<&str> {
    capture(&RCPTTO_CMD, request, "email")
}

pub fn is_valid_data(request: &str) -> bool {
    DATA_CMD.is_match(request)
}

pub fn is_valid_rset(request: &str) -> bool {
    RSET_CMD.is_match(request)
}

pub fn is_valid_noop(request: &str) -> bool {
    NOOP_CMD.is_match(request)
}

pub fn is_valid_quit(request: &str) -> bool {
    QUIT_CMD.is_match(request)
}

fn capture<'r>(pattern: &Regex, request: &'r str, group: &str) -> Option<&'r str> {
    pattern
        .captures(request)
        .and_then(|caps| caps.name(group))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_commands() {
        for request in [
            "HELO example.com",
            "ehlo example.com",
            "MAIL FROM:<a@example.com>",
            "mail from: <a@example.com>",
            "RCPT TO:<b@example.com>",
            "DATA",
            "rset",
            "NOOP",
            "Quit",
            "DATA with junk",
        ] {
            assert!(is_available_command(request), "{request}");
        }

        for request in ["", "VRFY user", "MAIL a@example.com", "DATAX", "HELOexample.com"] {
            assert!(!is_available_command(request), "{request}");
        }
    }

    #[test]
    fn test_helo_domain() {
        assert_eq!(helo_domain("HELO example.com"), Some("example.com"));
        assert_eq!(helo_domain("ehlo localhost"), Some("localhost"));
        assert_eq!(helo_domain("EHLO [127.0.0.1]"), Some("[127.0.0.1]"));
        assert_eq!(helo_domain("HELO mail-1.example.org."), Some("mail-1.example.org."));

        assert_eq!(helo_domain("HELO"), None);
        assert_eq!(helo_domain("HELO example.com extra"), None);
        assert_eq!(helo_domain("HELO -example.com"), None);
        assert_eq!(helo_domain("HELO exa_mple.com"), None);
    }

    #[test]
    fn test_mailfrom_email() {
        assert_eq!(mailfrom_email("MAIL FROM:<a@x.com>"), Some("a@x.com"));
        assert_eq!(mailfrom_email("mail from: <a@x.com>"), Some("a@x.com"));
        assert_eq!(mailfrom_email("MAIL FROM:<a@x.com> SIZE=1024"), Some("a@x.com"));
        assert_eq!(mailfrom_email("MAIL FROM:<>"), Some(""));

        assert_eq!(mailfrom_email("MAIL FROM:a@x.com"), None);
        assert_eq!(mailfrom_email("MAIL FROM:<not-an-address>"), None);
        assert_eq!(mailfrom_email("MAIL FROM:<a@x.com"), None);
    }

    #[test]
    fn test_rcptto_email() {
        assert_eq!(rcptto_email("RCPT TO:<b@x.com>"), Some("b@x.com"));
        assert_eq!(rcptto_email("rcpt to: <b@x.com> NOTIFY=NEVER"), Some("b@x.com"));

        assert_eq!(rcptto_email("RCPT TO:<>"), None);
        assert_eq!(rcptto_email("RCPT TO:b@x.com"), None);
        assert_eq!(rcptto_email("RCPT TO:<b@x.com> <c@x.com>"), None);
    }

    #[test]
    fn test_bare_commands() {
        assert!(is_valid_data("DATA"));
        assert!(is_valid_data("data"));
        assert!(!is_valid_data("DATA now"));

        assert!(is_valid_rset("RSET"));
        assert!(!is_valid_rset("RSET all"));

        assert!(is_valid_noop("noop"));
        assert!(!is_valid_noop("NOOP please"));

        assert!(is_valid_quit("QUIT"));
        assert!(!is_valid_quit("QUIT now"));
    }
}
