pub mod bundle;
pub mod compile;
pub mod probe;
pub mod version;

use miette::{IntoDiagnostic, Result};
use mozaic_core::compiler::{IdentityBackend, NodeBackend};
use mozaic_core::config::{CompilerKind, HostKind};
use mozaic_core::{
    BuildCache, CompilerBackend, Config, HostCapabilities, ModuleRegistry, ModuleTransformer,
    ProjectConfig, TransformError,
};
use serde::Serialize;
use std::sync::Arc;

/// Command-line overrides layered over `mozaic.json`.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<HostKind>,
    pub compiler: Option<CompilerKind>,
    pub base_url: Option<String>,
}

impl Overrides {
    fn apply(&self, mut project: ProjectConfig) -> ProjectConfig {
        if let Some(host) = self.host {
            project.host = host;
        }
        if let Some(compiler) = self.compiler {
            project.compiler = compiler;
        }
        if let Some(base_url) = &self.base_url {
            project.base_url.clone_from(base_url);
        }
        project
    }
}

/// Everything a command needs to load modules.
pub struct Pipeline {
    pub project: ProjectConfig,
    pub transformer: ModuleTransformer,
    pub registry: ModuleRegistry,
}

/// Load `mozaic.json` from the working directory and wire up a transformer.
pub fn pipeline(config: &Config, overrides: &Overrides, is_build: bool) -> Result<Pipeline> {
    let project = overrides
        .apply(ProjectConfig::load(&config.cwd).into_diagnostic()?)
        .with_build(is_build);

    let transformer = ModuleTransformer::for_host(
        &HostCapabilities::for_host(project.host),
        &project,
        compiler_for(config, &project),
        Arc::new(BuildCache::new()),
    )
    .into_diagnostic()?
    // Relative paths resolve against --cwd rather than the process directory
    .with_fetch_root(&config.cwd);

    let registry = ModuleRegistry::new(project.path_config());

    tracing::debug!(
        host = %project.host,
        strategy = transformer.fetcher().kind(),
        compiler = transformer.compiler().name(),
        base_url = %project.base_url,
        "pipeline ready"
    );

    Ok(Pipeline {
        project,
        transformer,
        registry,
    })
}

fn compiler_for(config: &Config, project: &ProjectConfig) -> Arc<dyn CompilerBackend> {
    match project.compiler {
        CompilerKind::Node => {
            let mut backend = NodeBackend::new().with_cwd(&config.cwd);
            if let Some(node) = &project.node_binary {
                backend = backend.with_node(node.clone());
            }
            Arc::new(backend)
        }
        CompilerKind::Identity => Arc::new(IdentityBackend::new()),
    }
}

/// Error payload shared by JSON command results.
#[derive(Debug, Serialize)]
pub struct ErrorJson {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

impl ErrorJson {
    pub fn from_transform(module: &str, err: &TransformError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            module: Some(module.to_string()),
        }
    }
}
