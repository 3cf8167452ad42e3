//! CLI entry point: loads a JSON [`holdem_gto_core::SolveConfig`], runs the
//! solver, and prints progress and a final strategy summary to stdout.
//! Grounded on the teacher's `batch_solve.rs`: a `clap::Parser` struct
//! reading a JSON config file via `serde_json`, with per-field overrides
//! instead of the teacher's board-list batching (spec's scope is a single
//! board per run).

use std::sync::atomic::AtomicBool;

use clap::Parser;
use holdem_gto_core::solver::Progress;
use holdem_gto_core::SolveConfig;

/// Solves a single heads-up postflop spot from a JSON config file.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a JSON config file deserializing to `SolveConfig`.
    #[arg(required = true)]
    config: String,

    /// Override the OOP range string from the config file.
    #[arg(long)]
    oop_range: Option<String>,

    /// Override the IP range string from the config file.
    #[arg(long)]
    ip_range: Option<String>,

    /// Override the board string from the config file.
    #[arg(long)]
    board: Option<String>,

    /// Override the max iteration count from the config file.
    #[arg(short = 'n', long)]
    max_iterations: Option<u32>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let raw = std::fs::read_to_string(&args.config).unwrap_or_else(|e| {
        eprintln!("unable to read config file `{}`: {e}", args.config);
        std::process::exit(1);
    });
    let mut config: SolveConfig = serde_json::from_str(&raw).unwrap_or_else(|e| {
        eprintln!("unable to parse config file `{}`: {e}", args.config);
        std::process::exit(1);
    });

    if let Some(oop) = args.oop_range {
        config.oop_range = oop;
    }
    if let Some(ip) = args.ip_range {
        config.ip_range = ip;
    }
    if let Some(board) = args.board {
        config.board = board;
    }
    if let Some(max_iterations) = args.max_iterations {
        config.solver.max_iterations = max_iterations;
    }

    let cancel = AtomicBool::new(false);
    let mut report_progress = |p: &Progress| {
        println!(
            "iteration {}/{}: exploitability = {:.6} ({} ms elapsed)",
            p.iteration, p.max_iterations, p.exploitability, p.elapsed_ms
        );
    };

    match holdem_gto_core::solve(&config, Some(&mut report_progress), Some(&cancel)) {
        Ok(result) => {
            println!(
                "done: {:?} after {} iterations, exploitability = {:.6}, {} ms",
                result.status,
                result.iterations,
                result.exploitability,
                result.elapsed.as_millis()
            );
            println!("root strategy:");
            if let Some(root) = result.strategies.get("r") {
                for (i, combo) in root.per_combo.iter().enumerate() {
                    println!("  combo {i}: {combo:?}");
                }
            }
        }
        Err(e) => {
            eprintln!("solve failed: {e}");
            std::process::exit(1);
        }
    }
}
