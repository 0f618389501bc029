//! CLI tool to run the scheduled jobs once, for cron or manual use.
//!
//! Usage:
//!   cargo run --bin clipinsight-jobs -- batch [--limit <n>] [--delay-ms <ms>]
//!   cargo run --bin clipinsight-jobs -- generate
//!   cargo run --bin clipinsight-jobs -- recover

use std::env;

use clipinsight_lib::config::Config;
use clipinsight_lib::db::DbPool;
use clipinsight_lib::services::batch::{batch_analyze, recover_stale_analyses};
use clipinsight_lib::services::global_insights::generate_global_insights;
use clipinsight_lib::services::provider;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let command = args[1].as_str();
    if matches!(command, "help" | "--help" | "-h") {
        print_usage();
        return;
    }

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match DbPool::new(&config).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error connecting to database: {}", e);
            std::process::exit(1);
        }
    };

    match command {
        "batch" => {
            let limit = parse_u64_arg(&args, "--limit").unwrap_or(config.batch.limit);
            let delay_ms = parse_u64_arg(&args, "--delay-ms").unwrap_or(config.batch.delay_ms);

            let provider = match provider::from_settings(&config.provider) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("Error creating analysis provider: {}", e);
                    std::process::exit(1);
                }
            };

            match batch_analyze(&pool, provider.as_ref(), &config.batch, limit, delay_ms).await {
                Ok(summary) => println!(
                    "Processed {} videos: {} successful, {} failed",
                    summary.processed, summary.successful, summary.failed
                ),
                Err(e) => fail("batch analysis", e),
            }
        }
        "generate" => match generate_global_insights(&pool, &config.global_insights).await {
            Ok(summary) => {
                println!("Videos considered:       {}", summary.videos_considered);
                println!("Global average:          {:.2}%", summary.global_avg);
                println!("Insights generated:      {}", summary.insights_generated);
                println!("Best practices found:    {}", summary.best_practices_found);
                println!("Best practices created:  {}", summary.best_practices_created);
            }
            Err(e) => fail("insight generation", e),
        },
        "recover" => match recover_stale_analyses(&pool, &config.batch).await {
            Ok(reset) => println!("Requeued {} stale videos", reset),
            Err(e) => fail("stale recovery", e),
        },
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            std::process::exit(1);
        }
    }
}

fn parse_u64_arg(args: &[String], flag: &str) -> Option<u64> {
    let value = args
        .iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))?;

    match value.parse() {
        Ok(n) => Some(n),
        Err(_) => {
            eprintln!("Error: {} expects a non-negative integer, got '{}'", flag, value);
            std::process::exit(1);
        }
    }
}

fn fail(job: &str, error: impl std::fmt::Display) -> ! {
    eprintln!("Error running {}: {}", job, error);
    std::process::exit(1);
}

fn print_usage() {
    println!("Clip insight job runner");
    println!();
    println!("Usage:");
    println!("  clipinsight-jobs batch [--limit <n>] [--delay-ms <ms>]   Analyze pending videos");
    println!("  clipinsight-jobs generate                                Generate global insights");
    println!("  clipinsight-jobs recover                                 Requeue stuck analyses");
    println!("  clipinsight-jobs help                                    Show this help message");
}
