//! Response decoders
//!
//! Stateless, per-shape readers layered over the line transport:
//! line, then `key: value` pair, then typed aggregate. Every decoder
//! consumes exactly one response, up to and including its terminator.

use std::collections::HashMap;

use bytes::Bytes;

use crate::error::{MpdError, Result};
use crate::network::LineTransport;
use crate::protocol::command::ResponseKind;
use crate::protocol::{ERROR_PREFIX, NEXT, SUCCESS};

/// A decoded field value.
///
/// A key repeating within one object aggregates into `Many`, in wire
/// order. This only happens within a single object, never across
/// objects of a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Many(Vec<String>),
}

impl Value {
    /// The single value, or `None` for a repeated-key aggregate
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            Value::Many(_) => None,
        }
    }

    /// All values, in wire order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Value::Text(text) => std::slice::from_ref(text),
            Value::Many(values) => values,
        };
        slice.iter().map(String::as_str)
    }

    /// Fold another occurrence of the same key into this value
    pub(crate) fn push(&mut self, value: String) {
        match self {
            Value::Text(first) => {
                *self = Value::Many(vec![std::mem::take(first), value]);
            }
            Value::Many(values) => values.push(value),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

/// A decoded record: lowercase keys mapped to their values
pub type Object = HashMap<String, Value>;

/// A binary composite: textual headers plus the raw payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryChunk {
    /// Headers read before the payload (includes the `binary` length key)
    pub fields: Object,

    /// Exactly the number of bytes declared by the `binary` header
    pub data: Bytes,
}

/// A fully decoded response, one variant per decoder shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// No data beyond the terminator
    None,

    /// Single scalar, or `None` when the response had no single value
    Item(Option<String>),

    /// Flat ordered list (also the playlist shape)
    List(Vec<String>),

    /// Single key/value record
    Object(Object),

    /// Sequence of records split on delimiter keys
    Objects(Vec<Object>),

    /// Binary composite, or `None` when the server had no payload
    Binary(Option<BinaryChunk>),
}

/// How a response is terminated.
///
/// Inside a command-list batch each captured response ends at
/// `list_OK` and a bare `OK` is a framing violation; outside one,
/// `OK` is the terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    Single,
    CommandList,
}

// =============================================================================
// Line / pair primitives
// =============================================================================

/// Read one response line.
///
/// Returns `None` at the terminator. An `ACK ` line surfaces the
/// server message as a command error and is not a terminator.
pub(crate) fn read_response_line<T: LineTransport>(
    transport: &mut T,
    mode: Terminator,
) -> Result<Option<String>> {
    let line = transport.read_line()?;
    if let Some(message) = line.strip_prefix(ERROR_PREFIX) {
        return Err(MpdError::Command(message.trim().to_string()));
    }
    match mode {
        Terminator::CommandList => {
            if line == NEXT {
                return Ok(None);
            }
            if line == SUCCESS {
                return Err(MpdError::Protocol(format!("got unexpected '{SUCCESS}'")));
            }
        }
        Terminator::Single => {
            if line == SUCCESS {
                return Ok(None);
            }
        }
    }
    Ok(Some(line))
}

/// Read one `key<separator>value` pair, or `None` at the terminator
pub(crate) fn read_response_pair<T: LineTransport>(
    transport: &mut T,
    separator: &str,
    mode: Terminator,
) -> Result<Option<(String, String)>> {
    let Some(line) = read_response_line(transport, mode)? else {
        return Ok(None);
    };
    match line.split_once(separator) {
        Some((key, value)) => Ok(Some((key.to_string(), value.to_string()))),
        None => Err(MpdError::Protocol(format!("could not parse pair: '{line}'"))),
    }
}

// =============================================================================
// Object splitting
// =============================================================================

/// Incremental record splitter shared by the materialized decoder and
/// the lazy iterators.
///
/// Feeds pairs one at a time; a delimiter key reappearing once the
/// current record has content closes that record and starts the next.
/// A non-delimiter key repeating within a record aggregates into
/// [`Value::Many`].
pub(crate) struct ObjectSplitter {
    delimiters: &'static [&'static str],
    current: Object,
}

impl ObjectSplitter {
    pub(crate) fn new(delimiters: &'static [&'static str]) -> Self {
        Self {
            delimiters,
            current: Object::new(),
        }
    }

    /// Feed one pair; returns a completed record when the key closed one
    pub(crate) fn feed(&mut self, key: &str, value: String) -> Option<Object> {
        let key = key.to_lowercase();
        if !self.current.is_empty() {
            if self.delimiters.contains(&key.as_str()) {
                let done = std::mem::take(&mut self.current);
                self.current.insert(key, Value::Text(value));
                return Some(done);
            }
            if let Some(existing) = self.current.get_mut(&key) {
                existing.push(value);
                return None;
            }
        }
        self.current.insert(key, Value::Text(value));
        None
    }

    /// Flush the trailing record, if any
    pub(crate) fn finish(&mut self) -> Option<Object> {
        if self.current.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.current))
        }
    }
}

// =============================================================================
// Typed decoders
// =============================================================================

/// Decode one response of the given shape
pub fn decode<T: LineTransport>(
    transport: &mut T,
    kind: ResponseKind,
    mode: Terminator,
) -> Result<Reply> {
    match kind {
        ResponseKind::Nothing => decode_nothing(transport, mode).map(|()| Reply::None),
        ResponseKind::Item => decode_item(transport, mode).map(Reply::Item),
        ResponseKind::List => decode_list(transport, mode).map(Reply::List),
        ResponseKind::Playlist => decode_playlist(transport, mode).map(Reply::List),
        ResponseKind::Object => decode_object(transport, mode).map(Reply::Object),
        ResponseKind::Objects(delimiters) => {
            decode_objects(transport, delimiters, mode).map(Reply::Objects)
        }
        ResponseKind::Binary => decode_binary(transport, mode).map(Reply::Binary),
    }
}

/// Expect the lone terminator; any data line is a protocol error
fn decode_nothing<T: LineTransport>(transport: &mut T, mode: Terminator) -> Result<()> {
    match read_response_line(transport, mode)? {
        None => Ok(()),
        Some(line) => Err(MpdError::Protocol(format!(
            "got unexpected return value: '{line}'"
        ))),
    }
}

/// Expect exactly one pair; anything else folds to "no value"
fn decode_item<T: LineTransport>(
    transport: &mut T,
    mode: Terminator,
) -> Result<Option<String>> {
    let mut pairs = Vec::new();
    while let Some(pair) = read_response_pair(transport, ": ", mode)? {
        pairs.push(pair);
    }
    if pairs.len() != 1 {
        return Ok(None);
    }
    Ok(pairs.pop().map(|(_, value)| value))
}

/// All pairs must share one key; yields one value per pair
fn decode_list<T: LineTransport>(transport: &mut T, mode: Terminator) -> Result<Vec<String>> {
    let mut seen: Option<String> = None;
    let mut values = Vec::new();
    while let Some((key, value)) = read_response_pair(transport, ": ", mode)? {
        match &seen {
            Some(expected) if *expected != key => {
                return Err(MpdError::Protocol(format!(
                    "expected key '{expected}', got '{key}'"
                )));
            }
            Some(_) => {}
            None => seen = Some(key),
        }
        values.push(value);
    }
    Ok(values)
}

/// Positional colon-delimited pairs; values only, no key check
fn decode_playlist<T: LineTransport>(
    transport: &mut T,
    mode: Terminator,
) -> Result<Vec<String>> {
    let mut values = Vec::new();
    while let Some((_, value)) = read_response_pair(transport, ":", mode)? {
        values.push(value);
    }
    Ok(values)
}

/// Aggregate all pairs into a single record (empty if no pairs)
fn decode_object<T: LineTransport>(transport: &mut T, mode: Terminator) -> Result<Object> {
    let mut objects = decode_objects(transport, &[], mode)?;
    if objects.is_empty() {
        return Ok(Object::new());
    }
    Ok(objects.swap_remove(0))
}

/// Split pairs into records on the command family's delimiter keys
fn decode_objects<T: LineTransport>(
    transport: &mut T,
    delimiters: &'static [&'static str],
    mode: Terminator,
) -> Result<Vec<Object>> {
    let mut splitter = ObjectSplitter::new(delimiters);
    let mut objects = Vec::new();
    while let Some((key, value)) = read_response_pair(transport, ": ", mode)? {
        if let Some(object) = splitter.feed(&key, value) {
            objects.push(object);
        }
    }
    if let Some(object) = splitter.finish() {
        objects.push(object);
    }
    Ok(objects)
}

/// Read headers until the `binary` key, then exactly that many raw
/// bytes, the trailing newline, and the terminator.
///
/// Returns `None` when the response is successful but carries no
/// payload (the resource exists but has no picture, say).
fn decode_binary<T: LineTransport>(
    transport: &mut T,
    mode: Terminator,
) -> Result<Option<BinaryChunk>> {
    let mut fields = Object::new();
    let mut amount: Option<usize> = None;
    while let Some((key, value)) = read_response_pair(transport, ": ", mode)? {
        let key = key.to_lowercase();
        if key == "binary" {
            // Unlike the other decoders, pair collection stops here;
            // the payload follows immediately.
            amount = Some(value.parse::<usize>().map_err(|_| {
                MpdError::Protocol(format!("invalid binary length: '{value}'"))
            })?);
            fields.insert(key, Value::Text(value));
            break;
        }
        fields.insert(key, Value::Text(value));
    }

    let Some(amount) = amount else {
        if fields.is_empty() {
            return Ok(None);
        }
        return Err(MpdError::Protocol(
            "binary response without a binary header".to_string(),
        ));
    };

    // A short read is a fatal connection error: the stream cannot be
    // resynchronized in-protocol.
    let data = transport.read_bytes(amount)?;

    // Trailing newline after the payload, then the terminator line.
    // Anything else means the payload length lied and the stream is
    // desynchronized.
    match read_response_line(transport, mode)? {
        Some(line) if line.is_empty() => {}
        Some(line) => {
            return Err(MpdError::Protocol(format!(
                "expected empty line after binary payload, got: '{line}'"
            )));
        }
        None => {
            return Err(MpdError::Protocol(
                "missing newline after binary payload".to_string(),
            ));
        }
    }
    if let Some(line) = read_response_line(transport, mode)? {
        return Err(MpdError::Protocol(format!(
            "got unexpected return value: '{line}'"
        )));
    }

    Ok(Some(BinaryChunk { fields, data }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::transport::testing::ScriptTransport;

    fn object(pairs: &[(&str, Value)]) -> Object {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_nothing_accepts_terminator() {
        let mut t = ScriptTransport::new("OK\n");
        assert_eq!(
            decode(&mut t, ResponseKind::Nothing, Terminator::Single).unwrap(),
            Reply::None
        );
    }

    #[test]
    fn test_nothing_rejects_data_line() {
        let mut t = ScriptTransport::new("volume: 63\nOK\n");
        let err = decode(&mut t, ResponseKind::Nothing, Terminator::Single).unwrap_err();
        assert!(matches!(err, MpdError::Protocol(_)));
    }

    #[test]
    fn test_error_line_surfaces_server_message() {
        let mut t = ScriptTransport::new("ACK [50@0] {sticker} no such sticker\n");
        let err = decode(&mut t, ResponseKind::Item, Terminator::Single).unwrap_err();
        match err {
            MpdError::Command(msg) => assert_eq!(msg, "[50@0] {sticker} no such sticker"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_item_single_pair() {
        let mut t = ScriptTransport::new("updating_db: 42\nOK\n");
        assert_eq!(
            decode(&mut t, ResponseKind::Item, Terminator::Single).unwrap(),
            Reply::Item(Some("42".to_string()))
        );
    }

    #[test]
    fn test_item_no_pairs_is_no_value() {
        let mut t = ScriptTransport::new("OK\n");
        assert_eq!(
            decode(&mut t, ResponseKind::Item, Terminator::Single).unwrap(),
            Reply::Item(None)
        );
    }

    #[test]
    fn test_item_multiple_pairs_is_no_value() {
        // Deliberate leniency: more than one pair is not a hard error
        let mut t = ScriptTransport::new("a: 1\nb: 2\nOK\n");
        assert_eq!(
            decode(&mut t, ResponseKind::Item, Terminator::Single).unwrap(),
            Reply::Item(None)
        );
    }

    #[test]
    fn test_list_values() {
        let mut t = ScriptTransport::new("tag: a\ntag: b\ntag: c\nOK\n");
        assert_eq!(
            decode(&mut t, ResponseKind::List, Terminator::Single).unwrap(),
            Reply::List(vec!["a".into(), "b".into(), "c".into()])
        );
    }

    #[test]
    fn test_list_rejects_second_key() {
        let mut t = ScriptTransport::new("tag: a\nother: b\nOK\n");
        let err = decode(&mut t, ResponseKind::List, Terminator::Single).unwrap_err();
        assert!(matches!(err, MpdError::Protocol(_)));
    }

    #[test]
    fn test_playlist_positional_values() {
        let mut t = ScriptTransport::new("0:first.ogg\n1:second.ogg\nOK\n");
        assert_eq!(
            decode(&mut t, ResponseKind::Playlist, Terminator::Single).unwrap(),
            Reply::List(vec!["first.ogg".into(), "second.ogg".into()])
        );
    }

    #[test]
    fn test_object_lowercases_keys() {
        let mut t = ScriptTransport::new("Volume: 63\nOK\n");
        assert_eq!(
            decode(&mut t, ResponseKind::Object, Terminator::Single).unwrap(),
            Reply::Object(object(&[("volume", "63".into())]))
        );
    }

    #[test]
    fn test_object_empty_response() {
        let mut t = ScriptTransport::new("OK\n");
        assert_eq!(
            decode(&mut t, ResponseKind::Object, Terminator::Single).unwrap(),
            Reply::Object(Object::new())
        );
    }

    #[test]
    fn test_object_repeated_key_aggregates() {
        let mut t = ScriptTransport::new("artist: A\nartist: B\nartist: C\nOK\n");
        assert_eq!(
            decode(&mut t, ResponseKind::Object, Terminator::Single).unwrap(),
            Reply::Object(object(&[(
                "artist",
                Value::Many(vec!["A".into(), "B".into(), "C".into()])
            )]))
        );
    }

    #[test]
    fn test_objects_split_on_delimiter() {
        let mut t = ScriptTransport::new(
            "file: a.ogg\npos: 0\nfile: b.ogg\npos: 1\nfile: c.ogg\nOK\n",
        );
        let reply = decode(
            &mut t,
            ResponseKind::Objects(&["file"]),
            Terminator::Single,
        )
        .unwrap();
        match reply {
            Reply::Objects(objects) => {
                assert_eq!(objects.len(), 3);
                assert_eq!(objects[0]["file"].as_str(), Some("a.ogg"));
                assert_eq!(objects[0]["pos"].as_str(), Some("0"));
                assert_eq!(objects[1]["file"].as_str(), Some("b.ogg"));
                assert_eq!(objects[2]["file"].as_str(), Some("c.ogg"));
                assert!(!objects[2].contains_key("pos"));
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn test_objects_multiple_delimiter_keys() {
        let mut t = ScriptTransport::new(
            "directory: albums\nfile: a.ogg\nfile: b.ogg\nOK\n",
        );
        let reply = decode(
            &mut t,
            ResponseKind::Objects(&["file", "directory", "playlist"]),
            Terminator::Single,
        )
        .unwrap();
        match reply {
            Reply::Objects(objects) => {
                assert_eq!(objects.len(), 3);
                assert_eq!(objects[0]["directory"].as_str(), Some("albums"));
                assert_eq!(objects[1]["file"].as_str(), Some("a.ogg"));
                assert_eq!(objects[2]["file"].as_str(), Some("b.ogg"));
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn test_binary_composite() {
        let mut input = b"size: 3\nbinary: 3\n".to_vec();
        input.extend_from_slice(b"\x01\x02\x03");
        input.extend_from_slice(b"\nOK\n");
        let mut t = ScriptTransport::from_bytes(input);
        let reply = decode(&mut t, ResponseKind::Binary, Terminator::Single).unwrap();
        match reply {
            Reply::Binary(Some(chunk)) => {
                assert_eq!(chunk.data.as_ref(), &[1, 2, 3]);
                assert_eq!(chunk.fields["size"].as_str(), Some("3"));
                assert_eq!(chunk.fields["binary"].as_str(), Some("3"));
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn test_binary_empty_response_is_no_payload() {
        let mut t = ScriptTransport::new("OK\n");
        assert_eq!(
            decode(&mut t, ResponseKind::Binary, Terminator::Single).unwrap(),
            Reply::Binary(None)
        );
    }

    #[test]
    fn test_binary_junk_after_payload_rejected() {
        // A data line where the empty line should be: the declared
        // length did not cover the payload
        let mut input = b"binary: 3\n".to_vec();
        input.extend_from_slice(b"\x01\x02\x03");
        input.extend_from_slice(b"junk\nOK\n");
        let mut t = ScriptTransport::from_bytes(input);
        let err = decode(&mut t, ResponseKind::Binary, Terminator::Single).unwrap_err();
        assert!(matches!(err, MpdError::Protocol(_)));
    }

    #[test]
    fn test_binary_missing_trailing_newline_rejected() {
        // Terminator arrives where the empty line should be
        let mut input = b"binary: 3\n".to_vec();
        input.extend_from_slice(b"\x01\x02\x03");
        input.extend_from_slice(b"OK\n");
        let mut t = ScriptTransport::from_bytes(input);
        let err = decode(&mut t, ResponseKind::Binary, Terminator::Single).unwrap_err();
        assert!(matches!(err, MpdError::Protocol(_)));
    }

    #[test]
    fn test_binary_data_line_instead_of_terminator_rejected() {
        let mut input = b"binary: 3\n".to_vec();
        input.extend_from_slice(b"\x01\x02\x03");
        input.extend_from_slice(b"\nextra: 1\nOK\n");
        let mut t = ScriptTransport::from_bytes(input);
        let err = decode(&mut t, ResponseKind::Binary, Terminator::Single).unwrap_err();
        assert!(matches!(err, MpdError::Protocol(_)));
    }

    #[test]
    fn test_binary_short_read_is_fatal() {
        // Declares 10 bytes but the stream ends after 2
        let mut input = b"binary: 10\n".to_vec();
        input.extend_from_slice(b"\x01\x02");
        let mut t = ScriptTransport::from_bytes(input);
        let err = decode(&mut t, ResponseKind::Binary, Terminator::Single).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_command_list_mode_terminators() {
        let mut t = ScriptTransport::new("volume: 63\nlist_OK\n");
        assert_eq!(
            decode(&mut t, ResponseKind::Object, Terminator::CommandList).unwrap(),
            Reply::Object(object(&[("volume", "63".into())]))
        );

        // A bare OK inside a command list is a framing violation
        let mut t = ScriptTransport::new("OK\n");
        let err = decode(&mut t, ResponseKind::Nothing, Terminator::CommandList).unwrap_err();
        assert!(matches!(err, MpdError::Protocol(_)));
    }

    #[test]
    fn test_malformed_pair_is_protocol_error() {
        let mut t = ScriptTransport::new("no-separator-here\nOK\n");
        let err = decode(&mut t, ResponseKind::Object, Terminator::Single).unwrap_err();
        assert!(matches!(err, MpdError::Protocol(_)));
    }

    #[test]
    fn test_connection_lost_mid_response() {
        // Stream ends without a terminator
        let mut t = ScriptTransport::new("volume: 63\n");
        let err = decode(&mut t, ResponseKind::Object, Terminator::Single).unwrap_err();
        assert!(matches!(err, MpdError::Connection(_)));
    }
}
