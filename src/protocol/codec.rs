//! Request encoder
//!
//! Serializes a command name and its arguments into one protocol line.
//! Malformed arguments are rejected before anything reaches the wire,
//! so a request is never sent partially.

use std::fmt;

use crate::error::{MpdError, Result};
use crate::protocol::range::Range;

/// A single command argument: a quoted scalar or a bare range
#[derive(Debug, Clone)]
pub enum Arg {
    Text(String),
    Range(Range),
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Text(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Text(value)
    }
}

impl From<&String> for Arg {
    fn from(value: &String) -> Self {
        Arg::Text(value.clone())
    }
}

impl From<u64> for Arg {
    fn from(value: u64) -> Self {
        Arg::Text(value.to_string())
    }
}

impl From<u32> for Arg {
    fn from(value: u32) -> Self {
        Arg::Text(value.to_string())
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Arg::Text(value.to_string())
    }
}

impl From<i32> for Arg {
    fn from(value: i32) -> Self {
        Arg::Text(value.to_string())
    }
}

impl From<Range> for Arg {
    fn from(value: Range) -> Self {
        Arg::Range(value)
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Ranges render bare, scalars quoted and escaped
            Arg::Range(range) => write!(f, "{range}"),
            Arg::Text(text) => write!(f, "\"{}\"", escape(text)),
        }
    }
}

/// Backslash-escape `\` and `"` in an argument
pub fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Encode a command line (without the trailing newline).
///
/// Fails with a command error if the assembled line would itself
/// contain a newline, which would desynchronize the line framing.
pub fn encode_command(command: &str, args: &[Arg]) -> Result<String> {
    let mut line = String::from(command);
    for arg in args {
        line.push(' ');
        line.push_str(&arg.to_string());
    }
    if line.contains('\n') {
        return Err(MpdError::Command(
            "new line found in the command".to_string(),
        ));
    }
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"back\slash"#), r#"back\\slash"#);
        assert_eq!(escape(r#"quote"inside"#), r#"quote\"inside"#);
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_encode_no_args() {
        assert_eq!(encode_command("ping", &[]).unwrap(), "ping");
    }

    #[test]
    fn test_encode_quoted_args() {
        let line = encode_command("find", &["file".into(), 1i32.into()]).unwrap();
        assert_eq!(line, r#"find "file" "1""#);
    }

    #[test]
    fn test_encode_escaped_arg() {
        let line = encode_command("add", &[r#"he said "hi""#.into()]).unwrap();
        assert_eq!(line, r#"add "he said \"hi\"""#);
    }

    #[test]
    fn test_encode_range_arg_unquoted() {
        let range = Range::try_from(10..12).unwrap();
        let line = encode_command("playlistinfo", &[range.into()]).unwrap();
        assert_eq!(line, "playlistinfo 10:12");
    }

    #[test]
    fn test_encode_rejects_embedded_newline() {
        let result = encode_command("add", &["evil\ninjection".into()]);
        assert!(matches!(result, Err(MpdError::Command(_))));
    }

    #[test]
    fn test_encode_two_word_command() {
        let line = encode_command("sticker get", &["song".into(), "baz".into()]).unwrap();
        assert_eq!(line, r#"sticker get "song" "baz""#);
    }
}
