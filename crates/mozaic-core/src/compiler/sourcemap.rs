//! Source map v3 model and base64 VLQ mapping encoder.

use serde::{Deserialize, Serialize};

const BASE64_DIGITS: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const VLQ_SHIFT: u32 = 5;
const VLQ_CONTINUATION: i64 = 1 << VLQ_SHIFT;
const VLQ_MASK: i64 = VLQ_CONTINUATION - 1;

/// A v3 source map, serialized with the field order compilers emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u32,
    pub file: String,
    #[serde(default)]
    pub source_root: String,
    pub sources: Vec<String>,
    #[serde(default)]
    pub names: Vec<String>,
    pub mappings: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sources_content: Option<Vec<String>>,
}

impl SourceMap {
    /// Create an empty map for `file`.
    #[must_use]
    pub fn new(file: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            version: 3,
            file: file.into(),
            source_root: String::new(),
            sources,
            names: Vec::new(),
            mappings: String::new(),
            sources_content: None,
        }
    }

    /// Set the encoded mappings.
    #[must_use]
    pub fn with_mappings(mut self, mappings: impl Into<String>) -> Self {
        self.mappings = mappings.into();
        self
    }

    /// Embed the original sources.
    #[must_use]
    pub fn with_sources_content(mut self, content: Vec<String>) -> Self {
        self.sources_content = Some(content);
        self
    }

    /// Serialize to compact JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        // A struct of strings and numbers always serializes
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Append the base64 VLQ encoding of `value` to `out`.
pub fn encode_vlq(value: i64, out: &mut String) {
    // Sign lives in the lowest bit
    let mut vlq = if value < 0 {
        ((-value) << 1) | 1
    } else {
        value << 1
    };

    loop {
        let mut digit = vlq & VLQ_MASK;
        vlq >>= VLQ_SHIFT;
        if vlq > 0 {
            digit |= VLQ_CONTINUATION;
        }
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        out.push(BASE64_DIGITS[digit as usize] as char);
        if vlq == 0 {
            break;
        }
    }
}

/// Incremental builder for the `mappings` field.
///
/// Segments are `[generated column, source index, source line, source column]`,
/// each stored relative to the previous segment as the format requires. The
/// generated column resets at every new line.
#[derive(Debug, Default)]
pub struct MappingsBuilder {
    out: String,
    line_has_segment: bool,
    prev_column: i64,
    prev_source: i64,
    prev_source_line: i64,
    prev_source_column: i64,
}

impl MappingsBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to the next generated line.
    pub fn next_line(&mut self) {
        self.out.push(';');
        self.line_has_segment = false;
        self.prev_column = 0;
    }

    /// Add a segment on the current generated line. All positions are 0-indexed.
    pub fn add(&mut self, column: u32, source: u32, source_line: u32, source_column: u32) {
        if self.line_has_segment {
            self.out.push(',');
        }
        let (column, source, source_line, source_column) = (
            i64::from(column),
            i64::from(source),
            i64::from(source_line),
            i64::from(source_column),
        );

        encode_vlq(column - self.prev_column, &mut self.out);
        encode_vlq(source - self.prev_source, &mut self.out);
        encode_vlq(source_line - self.prev_source_line, &mut self.out);
        encode_vlq(source_column - self.prev_source_column, &mut self.out);

        self.prev_column = column;
        self.prev_source = source;
        self.prev_source_line = source_line;
        self.prev_source_column = source_column;
        self.line_has_segment = true;
    }

    #[must_use]
    pub fn finish(self) -> String {
        self.out
    }
}
