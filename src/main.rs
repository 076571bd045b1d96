use anyhow::{anyhow, Context, Result};
use clap::Parser;
use proxy_vet::{
    logging::truncate_log, CandidateVerdict, CheckError, Config, Logger, Pipeline, RunReport,
    SourceReport, TargetEndpoint,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// Gathers proxy lists and keeps the proxies that reach every target URL
#[derive(Parser)]
#[command(name = "proxy-vet")]
#[command(about = "Gathers proxy lists and keeps the proxies that reach every target URL")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Protocol menu key (prompted for when omitted)
    #[arg(short, long)]
    protocol: Option<String>,

    /// Number of concurrent checks (prompted for when omitted)
    #[arg(short = 'n', long)]
    threads: Option<usize>,

    /// Output file for good proxies
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip the pause between source downloads
    #[arg(long)]
    no_delay: bool,

    /// Log per-attempt details
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(output) = cli.output {
        config.output_filename = output;
    }

    truncate_log(&config.log_file)?;
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let logger = Logger::to_file(&config.log_file, level)?;

    let selection = match cli.protocol {
        Some(key) => key,
        None => prompt_protocol(&config)?,
    };
    let protocol = match config.resolve_protocol(&selection) {
        Ok(protocol) => protocol,
        Err(e) => {
            println!("Invalid selection.");
            logger.error(&e);
            return Ok(());
        }
    };

    let mut pipeline = Pipeline::from_config(&config, logger.clone())?;
    if cli.no_delay {
        pipeline = pipeline.with_courtesy_delay(Duration::ZERO);
    }

    println!("Gathering proxies for {} protocol", protocol);
    let gathered = pipeline.gather(protocol).await;
    print_sources(&gathered.sources);
    if gathered.is_empty() {
        logger.error(CheckError::NoCandidates(protocol));
        println!("No proxies were downloaded. Exiting.");
        return Ok(());
    }
    println!("Gathered {} candidates", gathered.candidate_count());

    let threads = match cli.threads {
        Some(n) => n,
        None => parse_threads(
            &read_line(&format!("Enter the number of threads to use [{}]:", config.threads))?,
            config.threads,
        )?,
    };
    if threads == 0 {
        return Err(anyhow!("Thread count must be at least 1"));
    }

    println!("Checking with {} threads, timeout: {}s", threads, config.timeout);
    println!();

    let targets = config.targets();
    let report = pipeline
        .check(gathered, threads, |verdict| print_verdict(verdict, &targets))
        .await;
    print_summary(&report, &config);

    Ok(())
}

fn read_line(prompt: &str) -> Result<String> {
    println!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

fn prompt_protocol(config: &Config) -> Result<String> {
    for (key, name) in config.protocol_menu() {
        println!("{}. {}", key, name);
    }
    read_line("Select a protocol:")
}

/// Empty input keeps the configured default
fn parse_threads(input: &str, default: usize) -> Result<usize> {
    if input.is_empty() {
        return Ok(default);
    }
    input
        .parse::<usize>()
        .with_context(|| format!("Invalid thread count: {}", input))
}

fn print_sources(reports: &[SourceReport]) {
    for report in reports {
        if report.is_success() {
            println!("  found {} from {}", report.candidates.len(), report.source);
        } else {
            let reason = report.error.as_deref().unwrap_or("unknown error");
            println!("  failed {}: {}", report.source, reason);
        }
    }
}

fn print_verdict(verdict: &CandidateVerdict, targets: &[TargetEndpoint]) {
    let label = if verdict.is_good { "GOOD" } else { "BAD " };
    for (outcome, target) in verdict.outcomes.iter().zip(targets) {
        let elapsed = outcome
            .elapsed
            .map_or_else(|| "N/A".to_string(), |d| format!("{:.2} s", d.as_secs_f64()));
        println!(
            "{} {} | {} | {} | {}",
            label, verdict.candidate, outcome.status, target, elapsed
        );
    }
}

fn print_summary(report: &RunReport, config: &Config) {
    println!();
    println!("Proxy Testing Summary:");
    println!("----------------------");
    println!("{:<24} | {}", "Result", "Count");
    println!("{:<24} | {}", "Good Proxies", report.summary.good);
    println!("{:<24} | {}", "Bad Proxies", report.summary.bad);
    println!(
        "{:<24} | {:.2} seconds",
        "Script Execution Time",
        report.elapsed.as_secs_f64()
    );
    println!();
    println!(
        "Saved {} good proxies to {}",
        report.written,
        config.output_filename.display()
    );
}
