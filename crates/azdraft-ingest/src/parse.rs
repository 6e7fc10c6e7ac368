//! Best-effort snapshots of a JSON document that arrives in arbitrary slices.
//!
//! The whole accumulated buffer is the unit of parsing: a pass either reads a
//! complete document or extracts nothing, so a half-received resource list is
//! never emitted. Fields that are absent from a successful pass keep their
//! previous values.
//!
//! Reparsing after every chunk is quadratic in stream length. `BalanceScanner`
//! tracks bracket nesting across chunks so that a parse is only attempted when
//! the buffer is a balanced top-level object; every other state is one the
//! full parse would reject anyway.

use azdraft_core::{Connection, Resource};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::wire::{WireConnection, WireResource};
use crate::IngestError;

/// The parser's current best understanding of the generated architecture.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub description: String,
    pub resources: Vec<Resource>,
    pub connections: Vec<Connection>,
}

/// Which fields a successful pass replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Changes {
    pub description: bool,
    pub resources: bool,
    pub connections: bool,
}

impl Changes {
    pub fn any(&self) -> bool {
        self.description || self.resources || self.connections
    }

    pub fn graph(&self) -> bool {
        self.resources || self.connections
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotUpdate {
    pub changes: Changes,
    pub snapshot: Snapshot,
}

#[derive(Debug, Default)]
pub struct StreamingParser {
    decoder: Utf8Decoder,
    buffer: String,
    scanner: BalanceScanner,
    snapshot: Snapshot,
    attempts: usize,
}

impl StreamingParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes. A multi-byte character split across chunks is held
    /// back until the rest of it arrives.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> Option<SnapshotUpdate> {
        let start = self.buffer.len();
        self.decoder.decode(chunk, &mut self.buffer);
        self.after_append(start)
    }

    pub fn push_str(&mut self, chunk: &str) -> Option<SnapshotUpdate> {
        self.push_bytes(chunk.as_bytes())
    }

    /// Flush any held-back bytes at end of stream. Never fails; a document
    /// that is still incomplete simply leaves the last snapshot standing.
    pub fn finish(&mut self) -> Option<SnapshotUpdate> {
        let start = self.buffer.len();
        self.decoder.finish(&mut self.buffer);
        if self.buffer.len() == start {
            return None;
        }
        self.after_append(start)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Number of whole-buffer parses performed so far.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    fn after_append(&mut self, start: usize) -> Option<SnapshotUpdate> {
        self.scanner.feed(&self.buffer[start..]);
        if !self.scanner.is_complete() {
            return None;
        }
        self.attempts += 1;
        let doc = match parse_document(&self.buffer) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::trace!(error = %e, len = self.buffer.len(), "buffer not yet a document");
                return None;
            }
        };
        let changes = self.absorb(&doc);
        if !changes.any() {
            return None;
        }
        Some(SnapshotUpdate {
            changes,
            snapshot: self.snapshot.clone(),
        })
    }

    fn absorb(&mut self, doc: &Value) -> Changes {
        let mut changes = Changes::default();

        if let Some(description) = doc.get("description").and_then(Value::as_str) {
            if self.snapshot.description != description {
                self.snapshot.description = description.to_string();
                changes.description = true;
            }
        }

        // A valid prefix may omit `architecture`, or carry something other
        // than an object there; `Value::get` yields None in both cases.
        let architecture = doc.get("architecture");

        if let Some(raw) = architecture.and_then(|a| a.get("resources")) {
            match read_resources(raw) {
                Ok(resources) => {
                    if self.snapshot.resources != resources {
                        self.snapshot.resources = resources;
                        changes.resources = true;
                    }
                }
                Err(e) => tracing::debug!(error = %e, "skipping unreadable resources"),
            }
        }

        if let Some(raw) = architecture.and_then(|a| a.get("connections")) {
            match read_connections(raw) {
                Ok(connections) => {
                    if self.snapshot.connections != connections {
                        self.snapshot.connections = connections;
                        changes.connections = true;
                    }
                }
                Err(e) => tracing::debug!(error = %e, "skipping unreadable connections"),
            }
        }

        changes
    }
}

fn parse_document(buffer: &str) -> Result<Value, IngestError> {
    serde_json::from_str(buffer).map_err(|_| IngestError::ParseIncomplete)
}

fn read_resources(raw: &Value) -> Result<Vec<Resource>, serde_json::Error> {
    let wire = Vec::<WireResource>::deserialize(raw)?;
    Ok(wire
        .into_iter()
        .enumerate()
        .map(|(i, r)| r.into_resource(i))
        .collect())
}

fn read_connections(raw: &Value) -> Result<Vec<Connection>, serde_json::Error> {
    let wire = Vec::<WireConnection>::deserialize(raw)?;
    Ok(wire
        .into_iter()
        .enumerate()
        .map(|(i, c)| c.into_connection(i))
        .collect())
}

/// Incremental UTF-8 decoding across chunk boundaries.
#[derive(Debug, Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    fn decode(&mut self, chunk: &[u8], out: &mut String) {
        self.pending.extend_from_slice(chunk);
        let mut start = 0;
        while start < self.pending.len() {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(text) => {
                    out.push_str(text);
                    start = self.pending.len();
                }
                Err(e) => {
                    let valid = start + e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[start..valid]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            start = valid + len;
                        }
                        // Truncated sequence at the end: wait for more bytes.
                        None => {
                            start = valid;
                            break;
                        }
                    }
                }
            }
        }
        self.pending.drain(..start);
    }

    fn finish(&mut self, out: &mut String) {
        if !self.pending.is_empty() {
            out.push(char::REPLACEMENT_CHARACTER);
            self.pending.clear();
        }
    }
}

/// String-aware bracket tracking over the appended text.
#[derive(Debug, Default)]
struct BalanceScanner {
    depth: usize,
    in_string: bool,
    escaped: bool,
    opened: bool,
    complete: bool,
    /// The buffer can never become a JSON object again.
    dead: bool,
}

impl BalanceScanner {
    fn feed(&mut self, text: &str) {
        for ch in text.chars() {
            if self.dead {
                return;
            }
            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if ch == '\\' {
                    self.escaped = true;
                } else if ch == '"' {
                    self.in_string = false;
                }
                continue;
            }
            match ch {
                c if c.is_whitespace() => {}
                '{' | '[' => {
                    // Only a single top-level object can parse.
                    if self.depth == 0 && (self.opened || ch == '[') {
                        self.dead = true;
                        return;
                    }
                    self.opened = true;
                    self.depth += 1;
                    self.complete = false;
                }
                '}' | ']' => {
                    if self.depth == 0 {
                        self.dead = true;
                        return;
                    }
                    self.depth -= 1;
                    self.complete = self.depth == 0;
                }
                '"' if self.depth > 0 => {
                    self.in_string = true;
                    self.complete = false;
                }
                _ if self.depth == 0 => {
                    self.dead = true;
                    return;
                }
                _ => self.complete = false,
            }
        }
    }

    fn is_complete(&self) -> bool {
        self.complete && !self.dead
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use azdraft_core::ResourceType;

    const DOC: &str = r#"{"description":"Web app with a database - ünïcödé ✓","architecture":{"resources":[{"id":"resource-1","name":"Web","type":"appService"},{"id":"resource-2","name":"Db","type":"sqlDatabase","description":"primary {store}"}],"connections":[{"id":"connection-1","source":"resource-1","target":"resource-2","type":"dataFlow","label":"SQL \"tds\""}]}}"#;

    fn feed_all(parser: &mut StreamingParser, chunks: &[&[u8]]) -> Vec<SnapshotUpdate> {
        let mut updates: Vec<SnapshotUpdate> =
            chunks.iter().filter_map(|c| parser.push_bytes(c)).collect();
        updates.extend(parser.finish());
        updates
    }

    #[test]
    fn whole_document_in_one_chunk() {
        let mut parser = StreamingParser::new();
        let update = parser.push_str(DOC).unwrap();
        assert!(update.changes.description && update.changes.resources && update.changes.connections);
        assert_eq!(update.snapshot.resources.len(), 2);
        assert_eq!(update.snapshot.resources[1].resource_type, ResourceType::SqlDatabase);
        assert_eq!(update.snapshot.connections[0].label.as_deref(), Some("SQL \"tds\""));
    }

    #[test]
    fn every_byte_split_yields_the_same_final_snapshot() {
        let mut whole = StreamingParser::new();
        whole.push_str(DOC);
        let expected = whole.snapshot().clone();

        let bytes = DOC.as_bytes();
        for split in 0..=bytes.len() {
            let mut parser = StreamingParser::new();
            feed_all(&mut parser, &[&bytes[..split], &bytes[split..]]);
            assert_eq!(parser.snapshot(), &expected, "split at byte {split}");
        }
    }

    #[test]
    fn single_byte_chunks_match_whole_parse() {
        let mut whole = StreamingParser::new();
        whole.push_str(DOC);

        let mut parser = StreamingParser::new();
        let chunks: Vec<&[u8]> = DOC.as_bytes().chunks(1).collect();
        let updates = feed_all(&mut parser, &chunks);

        assert_eq!(parser.snapshot(), whole.snapshot());
        assert_eq!(updates.len(), 1);
        // Only the closing brace produced a balanced buffer.
        assert_eq!(parser.attempts(), 1);
    }

    #[test]
    fn malformed_prefixes_never_raise() {
        let mut parser = StreamingParser::new();
        let chunks = [
            r#"{"desc"#,
            r#"ription":"a""#,
            r#","architecture":{"resources":["#,
            r#"]}}"#,
        ];
        let updates: Vec<_> = chunks.iter().filter_map(|c| parser.push_str(c)).collect();
        assert_eq!(updates.len(), 1);
        assert_eq!(parser.snapshot().description, "a");
        assert!(parser.snapshot().resources.is_empty());
    }

    #[test]
    fn missing_architecture_is_not_an_error() {
        let mut parser = StreamingParser::new();
        let update = parser.push_str(r#"{"description": "partial"}"#).unwrap();
        assert_eq!(
            update.changes,
            Changes {
                description: true,
                ..Changes::default()
            }
        );
        assert!(update.snapshot.resources.is_empty());

        let mut parser = StreamingParser::new();
        assert!(parser.push_str(r#"{"architecture": 7}"#).is_none());
        let mut parser = StreamingParser::new();
        assert!(parser.push_str(r#"{"architecture": {"resources": null}}"#).is_none());
    }

    #[test]
    fn trailing_content_stops_further_snapshots() {
        let mut parser = StreamingParser::new();
        assert!(parser.push_str(r#"{"description":"first"}"#).is_some());
        assert!(parser.push_str(r#",{"description":"second"}"#).is_none());
        assert_eq!(parser.snapshot().description, "first");
    }

    #[test]
    fn garbage_input_is_swallowed() {
        let mut parser = StreamingParser::new();
        for chunk in ["}}]", "not json", "\u{0}\u{1}", "{\"a\":"] {
            assert!(parser.push_str(chunk).is_none());
        }
        assert!(parser.push_bytes(&[0xff, 0xfe, b'{']).is_none());
        assert!(parser.finish().is_none());
        assert_eq!(parser.snapshot(), &Snapshot::default());
        assert_eq!(parser.attempts(), 0);
    }

    #[test]
    fn unreadable_field_is_skipped_without_losing_others() {
        let mut parser = StreamingParser::new();
        let update = parser
            .push_str(
                r#"{"description":"d","architecture":{"resources":[{"name":"x","type":"keyVault"}],"connections":[{"id":"c","target":"resource-1","type":"network"}]}}"#,
            )
            .unwrap();
        assert!(update.changes.resources);
        assert!(!update.changes.connections);
        assert_eq!(update.snapshot.resources[0].id, "resource-1");
    }

    #[test]
    fn split_multibyte_character_is_reassembled() {
        let text = r#"{"description":"✓"}"#;
        let bytes = text.as_bytes();
        let check = bytes.iter().position(|b| *b == 0xE2).unwrap();
        let mut parser = StreamingParser::new();
        assert!(parser.push_bytes(&bytes[..check + 1]).is_none());
        let update = parser.push_bytes(&bytes[check + 1..]).unwrap();
        assert_eq!(update.snapshot.description, "✓");
    }

    #[test]
    fn braces_inside_strings_do_not_close_the_document() {
        let mut parser = StreamingParser::new();
        assert!(parser.push_str(r#"{"description":"}"#).is_none());
        assert!(parser.push_str(r#"\"}"#).is_none());
        let update = parser.push_str(r#""}"#).unwrap();
        assert_eq!(update.snapshot.description, "}\"}");
    }

    #[test]
    fn unchanged_fields_do_not_emit() {
        let mut parser = StreamingParser::new();
        assert!(parser.push_str(r#"{"description":"same"}   "#).is_some());
        assert!(parser.push_str("\n").is_none());
    }
}
