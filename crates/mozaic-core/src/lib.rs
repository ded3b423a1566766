#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::return_self_not_must_use)]

//! Module source transformer for AMD-style loaders.
//!
//! Turns a logical module name into executable text: resolve the source path
//! through the host loader, fetch it with the strategy the host supports,
//! compile it, attach debugging directives and hand it back to the loader.
//! In bundling mode the artifacts are kept in a [`BuildCache`] and emitted
//! into a static bundle afterwards.

pub mod bundle;
pub mod compiler;
pub mod config;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod transform;
pub mod version;

pub use bundle::{Bundle, BundleWriter};
pub use compiler::{CompileOptions, CompileOutput, CompilerBackend, CompilerError};
pub use config::{Config, HostKind, ProjectConfig};
pub use error::Error;
pub use fetch::{FetchError, Fetcher, HostCapabilities};
pub use loader::{HostLoader, LoadedModule, LoaderError, ModuleRegistry, PathConfig};
pub use transform::{
    BuildCache, CompiledArtifact, LoadOutcome, MapEmbedding, ModuleTransformer, SourceRecord,
    TransformError, PLUGIN_NAME, PLUGIN_VERSION,
};
pub use version::VERSION;
