//! Timing driver: runs every strategy on the same inputs, checks that they
//! agree, and prints average times.

use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use matmul_pool::{Matrix, Strategy, WorkerPool, compare_all, create_seeded, multiply};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Multiply two random square matrices with every strategy and compare times.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Side length of the square matrices
    #[arg(short, long, default_value_t = 1000)]
    size: usize,

    /// Worker threads in the shared pool
    #[arg(short, long, default_value_t = 10)]
    threads: usize,

    /// Number of timed passes
    #[arg(short, long, default_value_t = 5)]
    passes: usize,

    /// Seed for the input matrices (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Only run these strategies (repeatable); runs all by default
    #[arg(long = "strategy")]
    strategies: Vec<Strategy>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!(error = %err, "run failed");
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` if the strategies disagreed.
fn run(args: &Args) -> matmul_pool::Result<bool> {
    let strategies: Vec<Strategy> = if args.strategies.is_empty() {
        Strategy::ALL.to_vec()
    } else {
        args.strategies.clone()
    };
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(size = args.size, threads = args.threads, seed, "generating inputs");

    let a = create_seeded(args.size, seed)?;
    let b = create_seeded(args.size, seed.wrapping_add(1))?;
    let pool = WorkerPool::new(args.threads)?;

    let mut totals = vec![0.0f64; strategies.len()];
    let mut completed = 0;
    let mut agreed = true;

    println!("=== Matrix Multiplication Strategies ===\n");
    println!("Matrix: {}×{}, pool: {} threads, seed: {}\n", args.size, args.size, args.threads, seed);

    for pass in 1..=args.passes {
        println!("Pass {}", pass);
        println!("{}", "-".repeat(50));

        let mut results: Vec<Matrix> = Vec::with_capacity(strategies.len());
        for (i, &strategy) in strategies.iter().enumerate() {
            let start = Instant::now();
            let c = multiply(&a, &b, strategy, Some(&pool))?;
            let secs = start.elapsed().as_secs_f64();

            println!("{:24} {:8.3} s", strategy.name(), secs);
            totals[i] += secs;
            results.push(c);
        }
        println!();
        completed += 1;

        let refs: Vec<&Matrix> = results.iter().collect();
        if !compare_all(&refs) {
            error!(pass, "comparison failed: strategies disagree");
            agreed = false;
            break;
        }
    }

    pool.shutdown();
    print_summary(&strategies, &totals, completed);
    Ok(agreed)
}

fn print_summary(strategies: &[Strategy], totals: &[f64], passes: usize) {
    if passes == 0 {
        return;
    }
    println!("{}", "=".repeat(50));
    println!("AVERAGE OVER {} PASSES", passes);
    println!("{}", "=".repeat(50));

    let baseline = totals[0] / passes as f64;
    for (strategy, total) in strategies.iter().zip(totals) {
        let avg = total / passes as f64;
        println!(
            "{:24} {:8.3} s  ({:.1}×)",
            strategy.name(),
            avg,
            baseline / avg
        );
    }
    println!("{}", "=".repeat(50));
    println!("\nSpeedup relative to {}. Higher is better.\n", strategies[0].name());
}
