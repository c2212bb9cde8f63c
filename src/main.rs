//! Micro-grid simulator entry point: CLI wiring and config-driven engine construction.

use std::fmt::Display;
use std::path::Path;
use std::process;

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use microgrid_sim::config::RunConfig;
use microgrid_sim::io::export::export_csv;
use microgrid_sim::io::layout::{Layout, scenario_from_json_file};
use microgrid_sim::profile;
use microgrid_sim::sim::engine::Engine;
use microgrid_sim::sim::kpi::KpiReport;

/// Parsed CLI arguments.
struct CliArgs {
    config_path: Option<String>,
    preset: Option<String>,
    steps_override: Option<usize>,
    seed_override: Option<u64>,
    telemetry_out: Option<String>,
}

fn print_help() {
    eprintln!("microgrid-sim - grid-based energy micro-grid simulator");
    eprintln!();
    eprintln!("Usage: microgrid-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>          Load run configuration from a TOML file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        RunConfig::PRESETS.join(", ")
    );
    eprintln!("  --steps <n>              Override the number of 15-minute steps");
    eprintln!("  --seed <u64>             Override the synthetic profile seed");
    eprintln!("  --telemetry-out <path>   Export step results to CSV");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --config or --preset is given, the demo preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

fn fail(message: impl Display) -> ! {
    eprintln!("error: {message}");
    process::exit(1);
}

/// Returns the value following a flag, or exits.
fn flag_value(args: &[String], i: usize, flag: &str, what: &str) -> String {
    match args.get(i) {
        Some(v) => v.clone(),
        None => fail(format!("{flag} requires a {what} argument")),
    }
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        preset: None,
        steps_override: None,
        seed_override: None,
        telemetry_out: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--config" => {
                i += 1;
                cli.config_path = Some(flag_value(&args, i, "--config", "path"));
            }
            "--preset" => {
                i += 1;
                cli.preset = Some(flag_value(&args, i, "--preset", "name"));
            }
            "--steps" => {
                i += 1;
                let raw = flag_value(&args, i, "--steps", "count");
                match raw.parse::<usize>() {
                    Ok(n) => cli.steps_override = Some(n),
                    Err(_) => fail(format!("--steps value \"{raw}\" is not a valid count")),
                }
            }
            "--seed" => {
                i += 1;
                let raw = flag_value(&args, i, "--seed", "u64");
                match raw.parse::<u64>() {
                    Ok(s) => cli.seed_override = Some(s),
                    Err(_) => fail(format!("--seed value \"{raw}\" is not a valid u64")),
                }
            }
            "--telemetry-out" => {
                i += 1;
                cli.telemetry_out = Some(flag_value(&args, i, "--telemetry-out", "path"));
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Loads the layout and scenario named by `cfg` and wires up an engine.
fn build_engine(cfg: &RunConfig) -> Engine {
    let layout = match &cfg.layout.path {
        Some(path) => Layout::from_json_file(path),
        None => Layout::demo(),
    }
    .unwrap_or_else(|e| fail(e));
    let loaded = layout.build(cfg.simulation.grid_size);

    let scenario = match &cfg.scenario.path {
        Some(path) => scenario_from_json_file(path).unwrap_or_else(|e| fail(e)),
        None => profile::synthesize(&loaded.registry, &cfg.profile),
    };
    info!(entries = scenario.len(), "scenario ready");

    let mut engine = Engine::new(
        loaded.grid,
        loaded.registry,
        scenario,
        cfg.simulation.start_time,
    );
    for &[x, y] in &cfg.layout.disabled_cells {
        if let Err(e) = engine.set_cell(x, y, false) {
            fail(e);
        }
    }
    if !cfg.layout.disabled_cells.is_empty() {
        info!(
            disabled = cfg.layout.disabled_cells.len(),
            subgroups = engine.subgroups().len(),
            "cells switched off"
        );
    }
    engine
}

fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = parse_args();

    // --config takes priority, then --preset, then the demo default
    let mut cfg = if let Some(ref path) = cli.config_path {
        RunConfig::from_toml_file(Path::new(path)).unwrap_or_else(|e| fail(e))
    } else if let Some(ref name) = cli.preset {
        RunConfig::from_preset(name).unwrap_or_else(|e| fail(e))
    } else {
        RunConfig::demo()
    };

    if let Some(steps) = cli.steps_override {
        cfg.simulation.steps = steps;
    }
    if let Some(seed) = cli.seed_override {
        cfg.profile.seed = seed;
    }

    let errors = cfg.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let mut engine = build_engine(&cfg);
    let results = engine.run(cfg.simulation.steps);

    for r in &results {
        println!("{r}");
    }

    println!("\n--- Dependencies ---");
    if engine.dependencies().is_empty() {
        println!("(none)");
    } else {
        println!("{}", engine.dependencies());
    }

    let kpi = KpiReport::from_results(&results);
    println!("\n{kpi}");

    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_csv(&results, Path::new(path)) {
            fail(format!("failed to write CSV: {e}"));
        }
        info!(path = %path, rows = results.len(), "telemetry written");
    }
}
