//! `mozaic compile`: load one module and print its compiled text.

use super::{pipeline, ErrorJson, Overrides};
use miette::{IntoDiagnostic, Result};
use mozaic_core::{Config, MapEmbedding};
use serde::Serialize;
use std::time::Instant;

#[derive(Serialize)]
struct CompileResultJson {
    ok: bool,
    module: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    embedding: Option<MapEmbedding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorJson>,
}

/// Run the compile command.
pub fn run(config: &Config, module: &str, overrides: Overrides, json: bool) -> Result<()> {
    let start = Instant::now();
    let pipeline = pipeline(config, &overrides, false)?;

    let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
    let result = runtime.block_on(pipeline.transformer.load(
        module,
        &pipeline.registry,
        &pipeline.project,
    ));

    let duration_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(outcome) => {
            let artifact = outcome.artifact;
            if json {
                let result = CompileResultJson {
                    ok: true,
                    module: module.to_string(),
                    source_path: Some(artifact.source_path.clone()),
                    output_path: Some(artifact.output_path.clone()),
                    embedding: Some(artifact.embedding.clone()),
                    text: Some(artifact.text.clone()),
                    duration_ms,
                    error: None,
                };
                println!("{}", serde_json::to_string(&result).into_diagnostic()?);
            } else {
                print!("{}", artifact.text);
                if !artifact.text.ends_with('\n') {
                    println!();
                }
            }
            Ok(())
        }
        Err(e) => {
            if json {
                let result = CompileResultJson {
                    ok: false,
                    module: module.to_string(),
                    source_path: None,
                    output_path: None,
                    embedding: None,
                    text: None,
                    duration_ms,
                    error: Some(ErrorJson::from_transform(module, &e)),
                };
                println!("{}", serde_json::to_string(&result).into_diagnostic()?);
            } else {
                eprintln!("error: {e}");
            }
            std::process::exit(1);
        }
    }
}
