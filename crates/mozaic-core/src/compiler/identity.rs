//! Pass-through compiler backend.
//!
//! For module sources that are already JavaScript. The text is returned
//! unchanged and the source map maps every generated line to the same line of
//! the original file, so the loader pipeline (directives, bundling, debugger
//! naming) works the same as for compiled sources.

use super::sourcemap::{MappingsBuilder, SourceMap};
use super::{CompileOptions, CompileOutput, CompilerBackend, CompilerError};

#[derive(Debug, Clone, Default)]
pub struct IdentityBackend {
    _private: (),
}

impl IdentityBackend {
    #[must_use]
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn line_mappings(source: &str) -> String {
        let mut builder = MappingsBuilder::new();
        for (index, _) in source.split('\n').enumerate() {
            if index > 0 {
                builder.next_line();
            }
            #[allow(clippy::cast_possible_truncation)]
            builder.add(0, 0, index as u32, 0);
        }
        builder.finish()
    }
}

impl CompilerBackend for IdentityBackend {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn compile(
        &self,
        source: &str,
        options: &CompileOptions,
    ) -> Result<CompileOutput, CompilerError> {
        let mut output = CompileOutput::new(source);

        if options.produce_source_map {
            let mappings = if source.is_empty() {
                String::new()
            } else {
                Self::line_mappings(source)
            };
            let mut map = SourceMap::new(
                options.generated_file.clone(),
                options.original_sources.clone(),
            )
            .with_mappings(mappings);
            if options.inline_map {
                map = map.with_sources_content(vec![source.to_string()]);
            }
            output = output.with_source_map(map.to_json());
        }

        Ok(output)
    }
}
