//! Compiler backend abstraction for module sources.
//!
//! The transformer never calls a compiler directly. It builds
//! [`CompileOptions`] and hands the source to a [`CompilerBackend`], so the
//! CoffeeScript compiler (run through `node`) and the pass-through backend are
//! interchangeable.
//!
//! ## Usage
//!
//! ```ignore
//! use mozaic_core::compiler::{CompileOptions, CompilerBackend, IdentityBackend};
//!
//! let backend = IdentityBackend::new();
//! let options = CompileOptions::inline("src/main.coffee", "src/main.js");
//! let output = backend.compile("x = 1", &options)?;
//! println!("{}", output.js);
//! ```

pub mod identity;
pub mod node;
pub mod sourcemap;
pub mod spec;

pub use identity::IdentityBackend;
pub use node::NodeBackend;
pub use sourcemap::SourceMap;
pub use spec::{CompileOptions, CompileOutput};

use std::fmt;

/// Error raised by a compiler backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerError {
    /// Error code.
    pub code: &'static str,
    /// Message as reported by the compiler.
    pub message: String,
    /// Line of the offending token (1-indexed), when the compiler reports one.
    pub line: Option<u32>,
    /// Column of the offending token (1-indexed), when the compiler reports one.
    pub column: Option<u32>,
}

impl CompilerError {
    /// Create a new compiler error.
    #[must_use]
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            line: None,
            column: None,
        }
    }

    /// Attach a source location.
    #[must_use]
    pub fn with_location(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// The source text was rejected by the compiler.
    #[must_use]
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new("COMPILER_PARSE_ERROR", message)
    }

    /// The compiler could not be started or talked to.
    #[must_use]
    pub fn io_error(message: impl Into<String>) -> Self {
        Self::new("COMPILER_IO_ERROR", message)
    }

    /// The compiler ran but produced something unusable.
    #[must_use]
    pub fn protocol_error(message: impl Into<String>) -> Self {
        Self::new("COMPILER_PROTOCOL_ERROR", message)
    }
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let (Some(line), Some(col)) = (self.line, self.column) {
            write!(f, " at {line}:{col}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompilerError {}

/// A synchronous source-to-source compiler.
///
/// Implementations must be deterministic: the same source and options always
/// yield the same output.
pub trait CompilerBackend: Send + Sync {
    /// Backend name (e.g. "node", "identity").
    fn name(&self) -> &'static str;

    /// Compile `source` according to `options`.
    ///
    /// # Errors
    ///
    /// Returns a `CompilerError` carrying the compiler's own message when the
    /// source is rejected or the compiler cannot be run.
    fn compile(&self, source: &str, options: &CompileOptions)
        -> Result<CompileOutput, CompilerError>;
}
