//! The `cs!` loader plugin: module name in, executable text out.
//!
//! `load` runs resolve → fetch → compile → annotate → (cache) → define →
//! request. Each stage is also exposed on its own so loaders and tools can
//! drive the pipeline piecemeal.

pub mod cache;
pub mod directives;

pub use cache::BuildCache;
pub use directives::{append_directives, encode_source_map, MapEmbedding};

use crate::bundle::BundleWriter;
use crate::compiler::{CompileOptions, CompileOutput, CompilerBackend, CompilerError};
use crate::config::ProjectConfig;
use crate::fetch::{FetchError, Fetcher, HostCapabilities};
use crate::loader::{HostLoader, LoadedModule, LoaderError};
use mozaic_util::hash::short_hash;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Namespace prefix modules are addressed with (`cs!core/constants`).
pub const PLUGIN_NAME: &str = "cs";

/// Version of the loader plugin contract implemented here.
pub const PLUGIN_VERSION: &str = "0.4.3";

/// Error while loading one module.
#[derive(Error, Debug)]
pub enum TransformError {
    /// The loader could not map the module name to a path.
    #[error(transparent)]
    Resolve(LoaderError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The compiler rejected the source.
    #[error("In {path}, {}", .source.message)]
    Compile {
        path: String,
        #[source]
        source: CompilerError,
    },

    /// The loader refused the compiled text or could not return the module.
    #[error("failed to register module `{name}`: {source}")]
    Register {
        name: String,
        #[source]
        source: LoaderError,
    },
}

impl TransformError {
    /// Stable error code for JSON output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Resolve(_) => "TRANSFORM_RESOLVE_ERROR",
            Self::Fetch(e) => e.code(),
            Self::Compile { source, .. } => source.code,
            Self::Register { .. } => "TRANSFORM_REGISTER_ERROR",
        }
    }
}

/// Raw text of a module source and the paths derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    pub module_name: String,
    /// Path the text was fetched from.
    pub fetch_path: String,
    /// Path recorded in the source map and error messages.
    pub source_path: String,
    /// Virtual path of the compiled output.
    pub output_path: String,
    pub text: String,
    /// Short BLAKE3 hash of `text`.
    pub hash: String,
}

/// Compiled module text with its debugging annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledArtifact {
    pub module_name: String,
    pub source_path: String,
    pub output_path: String,
    /// Compiled JavaScript followed by the debugger directives.
    pub text: String,
    /// Raw v3 source map as returned by the compiler.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_map: Option<String>,
    pub embedding: MapEmbedding,
}

/// Result of [`ModuleTransformer::load`].
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    /// The module as returned by the host loader.
    pub module: LoadedModule,
    pub artifact: Arc<CompiledArtifact>,
    /// The artifact came from the build cache instead of a fresh compile.
    pub reused: bool,
}

/// Drop the leading `.` of a `./` path before it is recorded.
fn display_path(path: &str) -> &str {
    if path.starts_with("./") {
        &path[1..]
    } else {
        path
    }
}

/// Swap the source extension for the target one, or append it when absent.
fn derive_output_path(path: &str, source_ext: &str, target_ext: &str) -> String {
    let suffix = format!(".{source_ext}");
    match path.strip_suffix(&suffix) {
        Some(stem) => format!("{stem}.{target_ext}"),
        None => format!("{path}.{target_ext}"),
    }
}

/// Compiles module sources for a host loader.
pub struct ModuleTransformer {
    fetcher: Fetcher,
    compiler: Arc<dyn CompilerBackend>,
    cache: Arc<BuildCache>,
    base64: bool,
    source_ext: String,
    target_ext: String,
}

impl std::fmt::Debug for ModuleTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleTransformer")
            .field("fetcher", &self.fetcher.kind())
            .field("compiler", &self.compiler.name())
            .field("cached", &self.cache.len())
            .field("base64", &self.base64)
            .field("source_ext", &self.source_ext)
            .field("target_ext", &self.target_ext)
            .finish()
    }
}

impl ModuleTransformer {
    /// Create a transformer compiling `.coffee` to `.js` with a base64 encoder available.
    #[must_use]
    pub fn new(
        fetcher: Fetcher,
        compiler: Arc<dyn CompilerBackend>,
        cache: Arc<BuildCache>,
    ) -> Self {
        Self {
            fetcher,
            compiler,
            cache,
            base64: true,
            source_ext: "coffee".to_string(),
            target_ext: "js".to_string(),
        }
    }

    /// Build a transformer for a host with `caps`, using extensions from `config`.
    pub fn for_host(
        caps: &HostCapabilities,
        config: &ProjectConfig,
        compiler: Arc<dyn CompilerBackend>,
        cache: Arc<BuildCache>,
    ) -> Result<Self, FetchError> {
        let fetcher = Fetcher::select(caps)?;
        Ok(Self::new(fetcher, compiler, cache)
            .with_base64(caps.base64)
            .with_extensions(&config.source_ext, &config.target_ext))
    }

    /// Resolve relative fetch paths against `root` instead of the process directory.
    #[must_use]
    pub fn with_fetch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.fetcher = self.fetcher.with_root(root);
        self
    }

    /// Whether the host can base64-encode source maps.
    #[must_use]
    pub fn with_base64(mut self, available: bool) -> Self {
        self.base64 = available;
        self
    }

    /// Source and target extensions, without dots.
    #[must_use]
    pub fn with_extensions(mut self, source_ext: &str, target_ext: &str) -> Self {
        self.source_ext = source_ext.trim_start_matches('.').to_string();
        self.target_ext = target_ext.trim_start_matches('.').to_string();
        self
    }

    #[must_use]
    pub fn compiler(&self) -> &dyn CompilerBackend {
        self.compiler.as_ref()
    }

    #[must_use]
    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<BuildCache> {
        &self.cache
    }

    /// Ask the loader where `module_name`'s source lives.
    pub fn resolve_source_path(
        &self,
        module_name: &str,
        loader: &dyn HostLoader,
    ) -> Result<String, TransformError> {
        loader
            .to_url(&format!("{module_name}.{}", self.source_ext))
            .map_err(TransformError::Resolve)
    }

    /// Fetch text through the host's strategy.
    pub async fn fetch_text(&self, path: &str) -> Result<String, TransformError> {
        Ok(self.fetcher.fetch_text(path).await?)
    }

    /// Compile `text` read from `path` with an inline source map.
    ///
    /// A compiler error is reported as `In <path>, <compiler message>`.
    pub fn compile(&self, text: &str, path: &str) -> Result<CompileOutput, TransformError> {
        self.compiler
            .compile(text, &self.compile_options(path))
            .map_err(|source| TransformError::Compile {
                path: path.to_string(),
                source,
            })
    }

    /// [`compile`](Self::compile) on the blocking pool, so a backend that
    /// waits on a subprocess does not stall the async runtime.
    pub async fn compile_blocking(
        &self,
        text: &str,
        path: &str,
    ) -> Result<CompileOutput, TransformError> {
        let compiler = Arc::clone(&self.compiler);
        let options = self.compile_options(path);
        let text = text.to_string();

        let result = tokio::task::spawn_blocking(move || compiler.compile(&text, &options))
            .await
            .unwrap_or_else(|e| Err(CompilerError::io_error(format!("compiler task failed: {e}"))));

        result.map_err(|source| TransformError::Compile {
            path: path.to_string(),
            source,
        })
    }

    fn compile_options(&self, path: &str) -> CompileOptions {
        CompileOptions::inline(
            path,
            derive_output_path(path, &self.source_ext, &self.target_ext),
        )
    }

    /// Resolve and fetch a module source.
    pub async fn fetch_source(
        &self,
        module_name: &str,
        loader: &dyn HostLoader,
    ) -> Result<SourceRecord, TransformError> {
        let fetch_path = self.resolve_source_path(module_name, loader)?;
        let text = self.fetch_text(&fetch_path).await?;

        let source_path = display_path(&fetch_path).to_string();
        let output_path = derive_output_path(&source_path, &self.source_ext, &self.target_ext);
        let hash = short_hash(text.as_bytes());

        debug!(module = module_name, path = %fetch_path, hash = %hash, "fetched module source");

        Ok(SourceRecord {
            module_name: module_name.to_string(),
            fetch_path,
            source_path,
            output_path,
            text,
            hash,
        })
    }

    /// Compile a fetched source and attach the debugger directives.
    pub fn build_artifact(&self, record: &SourceRecord) -> Result<CompiledArtifact, TransformError> {
        let compiled = self.compile(&record.text, &record.source_path)?;
        Ok(self.annotate(record, compiled))
    }

    fn annotate(&self, record: &SourceRecord, compiled: CompileOutput) -> CompiledArtifact {
        let (text, embedding) = append_directives(
            &compiled.js,
            &record.output_path,
            compiled.v3_source_map.as_deref(),
            self.base64,
        );

        if let MapEmbedding::EncodingFailed { reason } = &embedding {
            debug!(module = %record.module_name, reason = %reason, "source map not embedded");
        }

        CompiledArtifact {
            module_name: record.module_name.clone(),
            source_path: record.source_path.clone(),
            output_path: record.output_path.clone(),
            text,
            source_map: compiled.v3_source_map,
            embedding,
        }
    }

    /// Load `module_name` into `loader`.
    ///
    /// With `config.is_build` set the artifact is kept in the build cache, and
    /// a module already in the cache is not fetched or compiled again.
    pub async fn load(
        &self,
        module_name: &str,
        loader: &dyn HostLoader,
        config: &ProjectConfig,
    ) -> Result<LoadOutcome, TransformError> {
        let cached = if config.is_build {
            self.cache.get(module_name)
        } else {
            None
        };
        let reused = cached.is_some();

        let artifact = match cached {
            Some(artifact) => {
                debug!(module = module_name, "reusing cached artifact");
                artifact
            }
            None => {
                let record = self.fetch_source(module_name, loader).await?;
                let compiled = self
                    .compile_blocking(&record.text, &record.source_path)
                    .await?;
                let artifact = Arc::new(self.annotate(&record, compiled));
                debug!(
                    module = module_name,
                    compiler = self.compiler.name(),
                    bytes = artifact.text.len(),
                    "compiled module"
                );
                if config.is_build {
                    self.cache.insert(module_name, artifact)
                } else {
                    artifact
                }
            }
        };

        let register_err = |source| TransformError::Register {
            name: module_name.to_string(),
            source,
        };
        loader
            .define_from_text(module_name, &artifact.text)
            .map_err(register_err)?;
        let module = loader.request(module_name).map_err(register_err)?;

        Ok(LoadOutcome {
            module,
            artifact,
            reused,
        })
    }

    /// Emit a cached module as `<plugin_name>!<module_name>`.
    ///
    /// Returns `false` and writes nothing when the module was never cached.
    pub fn write(&self, plugin_name: &str, module_name: &str, writer: &mut dyn BundleWriter) -> bool {
        match self.cache.get(module_name) {
            Some(artifact) => {
                writer.as_module(&format!("{plugin_name}!{module_name}"), &artifact.text);
                true
            }
            None => false,
        }
    }

    /// Emit every cached module in name order. Returns how many were written.
    pub fn write_all(&self, plugin_name: &str, writer: &mut dyn BundleWriter) -> usize {
        let entries = self.cache.entries();
        for (name, artifact) in &entries {
            writer.as_module(&format!("{plugin_name}!{name}"), &artifact.text);
        }
        entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_path() {
        assert_eq!(display_path("./core/constants.coffee"), "/core/constants.coffee");
        assert_eq!(display_path("src/main.coffee"), "src/main.coffee");
        assert_eq!(display_path("../lib/x.coffee"), "../lib/x.coffee");
    }

    #[test]
    fn test_derive_output_path() {
        assert_eq!(derive_output_path("src/a.coffee", "coffee", "js"), "src/a.js");
        assert_eq!(
            derive_output_path("src/a.coffee.coffee", "coffee", "js"),
            "src/a.coffee.js"
        );
        assert_eq!(derive_output_path("src/a", "coffee", "js"), "src/a.js");
    }

    #[test]
    fn test_compile_error_message() {
        let err = TransformError::Compile {
            path: "src/main.coffee".to_string(),
            source: CompilerError::parse_error("unexpected indentation").with_location(2, 1),
        };
        assert_eq!(err.to_string(), "In src/main.coffee, unexpected indentation");
        assert_eq!(err.code(), "COMPILER_PARSE_ERROR");
    }
}
