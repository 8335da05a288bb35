//! Wire protocol tokens and formatting
//!
//! The relay speaks a line-oriented byte protocol with no framing beyond
//! "one write = one logical message". A client's first message is its raw
//! display name; the server answers with one of the join reply tokens and
//! from then on fans out announcement and relay lines.

use crate::types::Name;

/// Join accepted reply, NUL-terminated on the wire.
pub const JOIN_ACCEPTED: &[u8] = b"DONE\0";

/// Join rejected reply, NUL-terminated; the server closes the
/// connection right after sending it.
pub const JOIN_REJECTED: &[u8] = b"FAILED\0";

/// `"<name> joined\n"` announcement.
pub fn joined(name: &Name) -> Vec<u8> {
    format!("{name} joined\n").into_bytes()
}

/// `"<name> says:\n<body>\n"` relay line for one inbound message body.
pub fn says(name: &Name, body: &[u8]) -> Vec<u8> {
    let mut line = format!("{name} says:\n").into_bytes();
    line.extend_from_slice(body);
    line.push(b'\n');
    line
}

/// `"<name> left\n"` announcement.
pub fn left(name: &Name) -> Vec<u8> {
    format!("{name} left\n").into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(text: &str) -> Name {
        Name::parse(text.as_bytes()).unwrap()
    }

    #[test]
    fn test_reply_tokens_are_distinct_prefixes() {
        assert!(JOIN_ACCEPTED.starts_with(b"DONE"));
        assert!(JOIN_REJECTED.starts_with(b"FAILED"));
        assert!(!JOIN_REJECTED.starts_with(b"DONE"));
    }

    #[test]
    fn test_announcement_lines() {
        let alice = name("alice");
        assert_eq!(joined(&alice), b"alice joined\n");
        assert_eq!(left(&alice), b"alice left\n");
    }

    #[test]
    fn test_relay_line_wraps_raw_body() {
        let alice = name("alice");
        assert_eq!(says(&alice, b"hi"), b"alice says:\nhi\n");
    }
}
