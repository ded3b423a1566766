//! CoffeeScript compiler backend running in a `node` subprocess.
//!
//! Each compile spawns `node`, writes `{source, options}` as JSON to stdin and
//! reads one JSON object from stdout:
//!
//! ```text
//! ok:    {"js": "...", "v3SourceMap": "..."}
//! error: {"error": "unexpected indentation", "line": 3, "column": 5}
//! ```
//!
//! The `coffeescript` package (or the older `coffee-script`) must be
//! resolvable from the working directory.

use super::{CompileOptions, CompileOutput, CompilerBackend, CompilerError};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

const DRIVER: &str = r"
const chunks = [];
process.stdin.on('data', (c) => chunks.push(c));
process.stdin.on('end', () => {
  const req = JSON.parse(Buffer.concat(chunks).toString('utf8'));
  let cs;
  try { cs = require('coffeescript'); } catch (_) { cs = require('coffee-script'); }
  let res;
  try {
    const out = cs.compile(req.source, req.options);
    res = typeof out === 'string' ? { js: out } : { js: out.js, v3SourceMap: out.v3SourceMap };
  } catch (e) {
    const loc = e.location || {};
    res = {
      error: String(e.message),
      line: loc.first_line === undefined ? null : loc.first_line + 1,
      column: loc.first_column === undefined ? null : loc.first_column + 1,
    };
  }
  process.stdout.write(JSON.stringify(res));
});
";

#[derive(Serialize)]
struct NodeRequest<'a> {
    source: &'a str,
    options: &'a CompileOptions,
}

#[derive(Deserialize)]
struct NodeResponse {
    js: Option<String>,
    #[serde(rename = "v3SourceMap")]
    v3_source_map: Option<String>,
    error: Option<String>,
    line: Option<u32>,
    column: Option<u32>,
}

/// CoffeeScript through `node`.
#[derive(Debug, Clone)]
pub struct NodeBackend {
    node: String,
    cwd: Option<PathBuf>,
}

impl Default for NodeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeBackend {
    /// Use `node` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            node: "node".to_string(),
            cwd: None,
        }
    }

    /// Use a specific `node` executable.
    #[must_use]
    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = node.into();
        self
    }

    /// Resolve the compiler package from `cwd`.
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    fn encode_request(source: &str, options: &CompileOptions) -> Result<Vec<u8>, CompilerError> {
        serde_json::to_vec(&NodeRequest { source, options })
            .map_err(|e| CompilerError::protocol_error(format!("failed to encode request: {e}")))
    }

    fn decode_response(stdout: &[u8]) -> Result<CompileOutput, CompilerError> {
        let response: NodeResponse = serde_json::from_slice(stdout).map_err(|e| {
            CompilerError::protocol_error(format!("invalid compiler response: {e}"))
        })?;

        if let Some(message) = response.error {
            let mut err = CompilerError::parse_error(message);
            if let (Some(line), Some(column)) = (response.line, response.column) {
                err = err.with_location(line, column);
            }
            return Err(err);
        }

        let js = response
            .js
            .ok_or_else(|| CompilerError::protocol_error("compiler response has no `js` field"))?;
        let mut output = CompileOutput::new(js);
        if let Some(map) = response.v3_source_map {
            output = output.with_source_map(map);
        }
        Ok(output)
    }
}

impl CompilerBackend for NodeBackend {
    fn name(&self) -> &'static str {
        "node"
    }

    fn compile(
        &self,
        source: &str,
        options: &CompileOptions,
    ) -> Result<CompileOutput, CompilerError> {
        let request = Self::encode_request(source, options)?;

        let mut cmd = Command::new(&self.node);
        cmd.arg("-e")
            .arg(DRIVER)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|e| {
            CompilerError::io_error(format!("failed to execute {}: {e}", self.node))
        })?;

        // The driver reads all of stdin before writing, so this cannot block on a full stdout pipe
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&request)
                .map_err(|e| CompilerError::io_error(format!("failed to write to compiler: {e}")))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| CompilerError::io_error(format!("failed to wait for compiler: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CompilerError::io_error(format!(
                "compiler exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Self::decode_response(&output.stdout)
    }
}
