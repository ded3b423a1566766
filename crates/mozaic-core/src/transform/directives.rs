//! Debugger directives appended to compiled modules.
//!
//! ```text
//! (compiled javascript)
//! //@ sourceURL=some/file.js
//! //@ sourceMappingURL=data:application/json;base64,(source map)
//! ```
//!
//! The first line names the evaluated text for stack traces, the second maps
//! it back to the original source.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;

pub const SOURCE_URL_DIRECTIVE: &str = "\n//@ sourceURL=";
pub const SOURCE_MAP_DIRECTIVE: &str = "\n//@ sourceMappingURL=data:application/json;base64,";

/// What happened to the inline source map of an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MapEmbedding {
    /// The map is embedded as a data URI.
    Embedded,
    /// The compiler produced no map.
    NoSourceMap,
    /// The host has no base64 encoder.
    EncoderUnavailable,
    /// The encoder rejected the map; the artifact ships without it.
    EncodingFailed { reason: String },
}

impl MapEmbedding {
    #[must_use]
    pub fn is_embedded(&self) -> bool {
        matches!(self, Self::Embedded)
    }
}

/// Base64-encode a source map with the host encoder's contract: the text is
/// taken as Latin-1, so any character above U+00FF is rejected.
pub fn encode_source_map(map: &str) -> Result<String, String> {
    let mut bytes = Vec::with_capacity(map.len());
    for (offset, ch) in map.chars().enumerate() {
        let byte = u8::try_from(u32::from(ch)).map_err(|_| {
            format!(
                "character U+{:04X} at offset {offset} is outside the Latin-1 range",
                u32::from(ch)
            )
        })?;
        bytes.push(byte);
    }
    Ok(STANDARD.encode(bytes))
}

/// Append the source URL directive and, when possible, the inline map.
///
/// Returns the final text and how the map was handled.
#[must_use]
pub fn append_directives(
    js: &str,
    output_path: &str,
    source_map: Option<&str>,
    base64_available: bool,
) -> (String, MapEmbedding) {
    let mut text = String::with_capacity(js.len() + output_path.len() + 32);
    text.push_str(js);
    text.push_str(SOURCE_URL_DIRECTIVE);
    text.push_str(output_path);

    let embedding = match source_map {
        None => MapEmbedding::NoSourceMap,
        Some(_) if !base64_available => MapEmbedding::EncoderUnavailable,
        Some(map) => match encode_source_map(map) {
            Ok(encoded) => {
                text.push_str(SOURCE_MAP_DIRECTIVE);
                text.push_str(&encoded);
                MapEmbedding::Embedded
            }
            Err(reason) => MapEmbedding::EncodingFailed { reason },
        },
    };

    (text, embedding)
}
