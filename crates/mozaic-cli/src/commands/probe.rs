//! `mozaic probe`: report which fetch strategy a host gets.

use miette::{IntoDiagnostic, Result};
use mozaic_core::config::HostKind;
use mozaic_core::{Config, HostCapabilities, ProjectConfig};
use serde::Serialize;

#[derive(Serialize)]
struct ProbeResult {
    ok: bool,
    host: HostKind,
    strategy: &'static str,
    capabilities: HostCapabilities,
    inline_source_maps: bool,
}

/// Run the probe command.
///
/// `host` overrides the `host` field of `mozaic.json`.
pub fn run(config: &Config, host: Option<HostKind>, json: bool) -> Result<()> {
    let project = ProjectConfig::load(&config.cwd).into_diagnostic()?;
    let host = host.unwrap_or(project.host);
    let capabilities = HostCapabilities::for_host(host);
    let strategy = capabilities.strategy();

    let result = ProbeResult {
        ok: strategy != "unsupported",
        host,
        strategy,
        inline_source_maps: capabilities.base64,
        capabilities,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result).into_diagnostic()?);
    } else {
        println!("host:     {}", result.host);
        println!("strategy: {}", result.strategy);
        println!(
            "maps:     {}",
            if result.inline_source_maps {
                "inline"
            } else {
                "none (no base64 encoder)"
            }
        );
    }

    if !result.ok {
        std::process::exit(1);
    }
    Ok(())
}
