//! Tolerant parsing of generator output into draft nodes.
//!
//! The generator is asked for a single JSON object of the form
//! `{ "title": ..., "nodes": [{ "id", "text", "parentId", "level", "isDetailNode" }] }`
//! but nothing guarantees it complies: replies arrive wrapped in markdown
//! fences, prefixed with chatter, with numeric ids or missing fields. Parsing
//! only insists on an object with a `nodes` array; everything else falls back
//! to a default.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ImportError;
use crate::graph::MAX_LEVEL;

/// A node description from an import that has not been placed yet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DraftNode {
    /// External id, only meaningful inside the imported document.
    pub id: Option<String>,
    pub label: String,
    pub level: u8,
    pub parent_id: Option<String>,
    /// Explicit `isDetailNode: true` from the document.
    pub is_detail: bool,
}

impl DraftNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>, level: u8, parent_id: Option<&str>) -> Self {
        Self {
            id: Some(id.into()),
            label: label.into(),
            level,
            parent_id: parent_id.map(str::to_string),
            is_detail: false,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, is_detail: bool) -> Self {
        self.is_detail = is_detail;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportDocument {
    pub title: Option<String>,
    pub nodes: Vec<DraftNode>,
}

/// Parse raw generator text into an [`ImportDocument`].
pub fn parse_import(raw: &str) -> Result<ImportDocument, ImportError> {
    let cleaned = strip_code_fences(raw);
    let object = decode_first_object(&cleaned)?;

    let entries = object
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or_else(|| ImportError::SchemaFailure("missing 'nodes' list".to_string()))?;

    let nodes: Vec<DraftNode> = entries
        .iter()
        .filter_map(|entry| entry.as_object().map(draft_from_object))
        .collect();

    if nodes.len() != entries.len() {
        debug!("Skipped {} non-object node entries", entries.len() - nodes.len());
    }

    let title = object
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    Ok(ImportDocument { title, nodes })
}

/// Drop markdown fences (and a language tag right after them) anywhere in the text.
fn strip_code_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text.trim();
    while let Some(pos) = rest.find("```") {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 3..];
        let tag_len = rest
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric())
            .count();
        rest = rest[tag_len..].trim_start();
    }
    out.push_str(rest);
    out
}

fn decode_first_object(text: &str) -> Result<Map<String, Value>, ImportError> {
    let start = text
        .find('{')
        .ok_or_else(|| ImportError::ParseFailure("no JSON object in response".to_string()))?;

    // Prefer the first balanced object; fall back to the widest `{...}` span
    // for replies whose prose happens to contain stray braces.
    let mut candidates = Vec::with_capacity(2);
    if let Some(end) = balanced_object_end(text, start) {
        candidates.push(&text[start..end]);
    }
    if let Some(end) = text.rfind('}').filter(|&end| end > start) {
        let widest = &text[start..=end];
        if candidates.first() != Some(&widest) {
            candidates.push(widest);
        }
    }

    let mut last_error = "unterminated JSON object".to_string();
    for candidate in candidates {
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(map)) => return Ok(map),
            Ok(_) => last_error = "response is not a JSON object".to_string(),
            Err(e) => last_error = e.to_string(),
        }
    }
    Err(ImportError::ParseFailure(last_error))
}

/// Byte offset one past the brace closing the object that opens at `start`.
fn balanced_object_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn draft_from_object(entry: &Map<String, Value>) -> DraftNode {
    let label = entry
        .get("text")
        .or_else(|| entry.get("label"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    DraftNode {
        id: reference(entry.get("id")),
        label,
        level: level_of(entry.get("level")),
        parent_id: reference(entry.get("parentId")),
        is_detail: entry.get("isDetailNode").and_then(Value::as_bool).unwrap_or(false),
    }
}

/// Ids come as strings or numbers; null and empty strings mean "none".
fn reference(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn level_of(value: Option<&Value>) -> u8 {
    let level = match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    level.unwrap_or(0).min(u64::from(MAX_LEVEL)) as u8
}
