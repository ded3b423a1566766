use crate::error::Error;
use crate::loader::PathConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Project configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "mozaic.json";

/// Runtime configuration for the mozaic CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Current working directory.
    pub cwd: PathBuf,

    /// Whether to emit JSON logs.
    pub json_logs: bool,

    /// Verbosity level (0 = INFO, 1 = DEBUG, 2+ = TRACE).
    pub verbosity: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            json_logs: false,
            verbosity: 0,
        }
    }
}

impl Config {
    /// Create a new config with the given working directory.
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            ..Default::default()
        }
    }

    /// Set verbosity level.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set JSON log output.
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }
}

/// Which fetch strategy the host should use.
///
/// `Auto` probes the running process; the other variants pin a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HostKind {
    #[default]
    Auto,
    Filesystem,
    Network,
    Embedded,
}

impl HostKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Filesystem => "filesystem",
            Self::Network => "network",
            Self::Embedded => "embedded",
        }
    }
}

impl std::fmt::Display for HostKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which compiler backend compiles module sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompilerKind {
    /// CoffeeScript through a `node` subprocess.
    #[default]
    Node,
    /// Pass-through for sources already in the target syntax.
    Identity,
}

impl CompilerKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Identity => "identity",
        }
    }
}

impl std::fmt::Display for CompilerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Project configuration loaded from `mozaic.json`.
///
/// ```json
/// {
///   "baseUrl": "src/",
///   "paths": { "model/todo": "modules/todo_model" },
///   "isBuild": false,
///   "host": "auto",
///   "compiler": "node"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
    /// Prefix applied to every resolved module path.
    pub base_url: String,
    /// Module-name prefix to path substitutions.
    pub paths: BTreeMap<String, String>,
    /// Keep compiled artifacts for static bundling.
    pub is_build: bool,
    /// Extension of module sources, without the dot.
    pub source_ext: String,
    /// Extension of compiled output, without the dot.
    pub target_ext: String,
    /// Fetch strategy override.
    pub host: HostKind,
    /// Compiler backend.
    pub compiler: CompilerKind,
    /// `node` executable used by the node compiler backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_binary: Option<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            base_url: "./".to_string(),
            paths: BTreeMap::new(),
            is_build: false,
            source_ext: "coffee".to_string(),
            target_ext: "js".to_string(),
            host: HostKind::default(),
            compiler: CompilerKind::default(),
            node_binary: None,
        }
    }
}

impl ProjectConfig {
    /// Read and parse a config file.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `mozaic.json` from `cwd`, falling back to defaults when absent.
    pub fn load(cwd: &Path) -> Result<Self, Error> {
        let path = cwd.join(CONFIG_FILE);
        if path.is_file() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Set bundling mode.
    #[must_use]
    pub fn with_build(mut self, is_build: bool) -> Self {
        self.is_build = is_build;
        self
    }

    /// Path resolution settings for the module registry.
    #[must_use]
    pub fn path_config(&self) -> PathConfig {
        PathConfig::new(self.base_url.clone()).with_paths(self.paths.clone())
    }
}
