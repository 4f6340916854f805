use std::path::{Path, PathBuf};
use std::process;

use relight_bench::report;
use relight_bench::runner::BenchmarkRunner;
use relight_bench::scenes;
use relight_core::{load_config_from_str, BackendPreference, RenderConfig};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    let mut baseline_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut regression_threshold = 10.0f64;
    let mut tick_count = 60u32;
    let mut backend: Option<BackendPreference> = None;

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        if matches!(flag, "--help" | "-h") {
            print_usage();
            process::exit(0);
        }
        i += 1;
        let Some(value) = args.get(i) else {
            eprintln!("Missing value for {flag}");
            process::exit(1);
        };
        match flag {
            "--baseline" => baseline_path = Some(PathBuf::from(value)),
            "--output" => output_path = Some(PathBuf::from(value)),
            "--config" => config_path = Some(PathBuf::from(value)),
            "--regression-threshold" => regression_threshold = parse_or_exit(flag, value),
            "--ticks" => tick_count = parse_or_exit(flag, value),
            "--backend" => backend = Some(parse_or_exit(flag, value)),
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => load_config(&path),
        None => RenderConfig::default(),
    };
    // Command line wins over the config file.
    let preference = backend.unwrap_or(config.backend);

    let runner = BenchmarkRunner::new(preference, tick_count, config);
    let mut results = Vec::new();
    for scene in &scenes::standard_scenes() {
        match runner.run_scene(scene) {
            Ok(result) => results.push(result),
            Err(e) => {
                log::error!("Renderer init failed: {e}");
                process::exit(1);
            }
        }
    }

    println!("\n## Benchmark Results\n");
    println!("{}", report::format_markdown(&results));

    if let Some(ref path) = output_path {
        let baseline = report::Baseline {
            timestamp: timestamp(),
            results: results.clone(),
        };
        match report::save_baseline(path, &baseline) {
            Ok(()) => log::info!("Saved baseline to {}", path.display()),
            Err(e) => {
                log::error!("Failed to save baseline {}: {e}", path.display());
                process::exit(1);
            }
        }
    }

    if let Some(ref path) = baseline_path {
        if let Some(baseline) = report::load_baseline(path) {
            let regressions = report::compare(&results, &baseline, regression_threshold);
            println!(
                "{}",
                report::format_comparison(&regressions, regression_threshold)
            );
            if !regressions.is_empty() {
                eprintln!(
                    "ERROR: {} regressions detected, exiting with code 1",
                    regressions.len()
                );
                process::exit(1);
            }
        } else {
            log::warn!("Baseline file not found: {}", path.display());
        }
    }

    log::info!("Benchmark complete.");
}

fn print_usage() {
    eprintln!("Usage: relight-bench [OPTIONS]");
    eprintln!("  --baseline <path>              Load baseline JSON for comparison");
    eprintln!("  --output <path>                Save current results as JSON baseline");
    eprintln!("  --regression-threshold <pct>   Regression threshold percentage (default: 10)");
    eprintln!("  --ticks <n>                    Renders per scene (default: 60)");
    eprintln!("  --backend <auto|gpu|cpu>       Compose backend (default: config or auto)");
    eprintln!("  --config <path>                RON render config (settings, lights, normals)");
}

fn parse_or_exit<T: std::str::FromStr>(flag: &str, value: &str) -> T {
    match value.parse() {
        Ok(v) => v,
        Err(_) => {
            eprintln!("Invalid value for {flag}: {value}");
            process::exit(1);
        }
    }
}

fn load_config(path: &Path) -> RenderConfig {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Cannot read config {}: {e}", path.display());
            process::exit(1);
        }
    };
    match load_config_from_str(&contents) {
        Ok(config) => {
            log::info!("Loaded render config from {}", path.display());
            config
        }
        Err(e) => {
            eprintln!("Invalid config {}: {e}", path.display());
            process::exit(1);
        }
    }
}

/// Seconds since the Unix epoch, without a date-time dependency.
fn timestamp() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("bench-{secs}")
}
