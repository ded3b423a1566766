//! Compile request and result types.
//!
//! Field names on the wire follow the CoffeeScript compiler's option names so
//! the structs can be handed to it unchanged.

use serde::{Deserialize, Serialize};

/// Options passed to a compiler backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompileOptions {
    /// Produce a v3 source map alongside the compiled text.
    #[serde(rename = "sourceMap")]
    pub produce_source_map: bool,
    /// Embed the original sources in the map instead of referencing files.
    #[serde(rename = "inline")]
    pub inline_map: bool,
    /// Original source paths recorded in the map.
    #[serde(rename = "sourceFiles")]
    pub original_sources: Vec<String>,
    /// Name of the generated file recorded in the map.
    #[serde(rename = "generatedFile")]
    pub generated_file: String,
}

impl CompileOptions {
    /// Options for an inline source map of a single source file.
    #[must_use]
    pub fn inline(source_path: impl Into<String>, generated_file: impl Into<String>) -> Self {
        Self {
            produce_source_map: true,
            inline_map: true,
            original_sources: vec![source_path.into()],
            generated_file: generated_file.into(),
        }
    }

    /// Disable source map generation.
    #[must_use]
    pub fn without_source_map(mut self) -> Self {
        self.produce_source_map = false;
        self.inline_map = false;
        self
    }
}

/// Output of a successful compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileOutput {
    /// Compiled JavaScript.
    pub js: String,
    /// Serialized v3 source map, when one was requested.
    #[serde(rename = "v3SourceMap", skip_serializing_if = "Option::is_none", default)]
    pub v3_source_map: Option<String>,
}

impl CompileOutput {
    /// Create an output with compiled text only.
    #[must_use]
    pub fn new(js: impl Into<String>) -> Self {
        Self {
            js: js.into(),
            v3_source_map: None,
        }
    }

    /// Set the source map.
    #[must_use]
    pub fn with_source_map(mut self, map: impl Into<String>) -> Self {
        self.v3_source_map = Some(map.into());
        self
    }
}
