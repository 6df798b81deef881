use std::path::PathBuf;

use amapi_bridge::config::{HarnessConfig, ReportFormat};
use amapi_bridge::harness::Harness;
use amapi_bridge::logging::init_logging;

fn main() {
    let (mut config, source) = match HarnessConfig::load_or_default() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };
    config.apply_env_overrides();
    if let Some(path) = std::env::args().nth(1) {
        config.module.path = PathBuf::from(path);
    }

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Logging setup failed: {}", e);
    }
    tracing::info!(target: "config", %source, "Configuration loaded");

    if let Err(e) = config.validate() {
        eprintln!("{}", e);
        std::process::exit(2);
    }

    let harness = Harness::new();
    let selected = harness.select_module(&config.module.path);
    if let Some(message) = &selected.message {
        tracing::info!(target: "harness", ok = selected.ok, "{}", message);
    }

    let report = harness.run_sweep(&config);
    match config.probe.report_format {
        ReportFormat::Text => print!("{}", report),
        ReportFormat::Json => match report.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to render report: {}", e),
        },
    }

    if !selected.ok {
        std::process::exit(1);
    }
}
