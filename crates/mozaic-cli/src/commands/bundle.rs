//! `mozaic bundle` command implementation.
//!
//! Loads modules in bundling mode, then writes every cached artifact as a
//! named `define` into a single file.

use super::{pipeline, ErrorJson, Overrides};
use miette::{IntoDiagnostic, Result};
use mozaic_core::{Bundle, Config};
use mozaic_util::fs::{atomic_write, find_sources, module_name_for};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

/// Bundle command action.
#[derive(Debug, Clone)]
pub struct BundleAction {
    /// Module names given on the command line.
    pub modules: Vec<String>,
    /// Also include every source file under the base URL.
    pub all: bool,
    /// Output file (if None, prints to stdout).
    pub outfile: Option<PathBuf>,
    pub overrides: Overrides,
}

/// JSON output for bundle command.
#[derive(Serialize)]
struct BundleResultJson {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    outfile: Option<String>,
    modules: Vec<String>,
    size_bytes: usize,
    duration_ms: u64,
    errors: Vec<ErrorJson>,
}

/// Run the bundle command.
pub fn run(config: &Config, action: BundleAction, json: bool) -> Result<()> {
    let start = Instant::now();
    let pipeline = pipeline(config, &action.overrides, true)?;

    let mut modules = action.modules.clone();
    if action.all {
        let base_url = pipeline.project.base_url.as_str();
        if base_url.contains("://") {
            return Err(miette::miette!(
                "--all needs a local baseUrl, got `{base_url}`"
            ));
        }
        let root = config.cwd.join(base_url);
        for path in find_sources(&root, &pipeline.project.source_ext) {
            if let Some(name) = module_name_for(&root, &path) {
                if !modules.contains(&name) {
                    modules.push(name);
                }
            }
        }
    }

    if modules.is_empty() {
        return Err(miette::miette!(
            "no modules to bundle (name some, or pass --all)"
        ));
    }

    let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
    let mut errors = Vec::new();
    runtime.block_on(async {
        for name in &modules {
            match pipeline
                .transformer
                .load(name, &pipeline.registry, &pipeline.project)
                .await
            {
                Ok(outcome) => {
                    tracing::info!(module = %name, reused = outcome.reused, "loaded");
                }
                Err(e) => {
                    tracing::warn!(module = %name, error = %e, "load failed");
                    errors.push(ErrorJson::from_transform(name, &e));
                }
            }
        }
    });

    let mut bundle = Bundle::new();
    let written = pipeline
        .transformer
        .write_all(mozaic_core::PLUGIN_NAME, &mut bundle);
    let code = bundle.finish();
    let duration_ms = start.elapsed().as_millis() as u64;
    let ok = errors.is_empty();

    // A partial bundle is never written
    if ok {
        if let Some(outfile) = &action.outfile {
            let outfile = config.cwd.join(outfile);
            if let Some(parent) = outfile.parent() {
                if !parent.exists() {
                    std::fs::create_dir_all(parent).into_diagnostic()?;
                }
            }
            atomic_write(&outfile, code.as_bytes()).into_diagnostic()?;
        }
    }

    if json {
        let result = BundleResultJson {
            ok,
            outfile: action.outfile.as_ref().map(|p| p.display().to_string()),
            modules: bundle.ids().into_iter().map(str::to_string).collect(),
            size_bytes: if ok { code.len() } else { 0 },
            duration_ms,
            errors,
        };
        println!("{}", serde_json::to_string(&result).into_diagnostic()?);
    } else if !ok {
        for error in &errors {
            eprintln!("error: {}", error.message);
        }
    } else if let Some(outfile) = &action.outfile {
        println!(
            "  {} modules -> {} ({:.1}KB, {}ms)",
            written,
            outfile.display(),
            code.len() as f64 / 1024.0,
            duration_ms
        );
    } else {
        print!("{code}");
    }

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
