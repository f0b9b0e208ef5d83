//! Financier read/write benchmark against an in-process store.
//!
//! Run:      `cargo run --release --bin financier-bench -- run`
//! Skewed:   `cargo run --release --bin financier-bench -- run --zipf 1.1`
//! Replay:   `cargo run --release --bin financier-bench -- run --task-file tasks.json`
//! Paced:    `cargo run --release --bin financier-bench -- run --tps 500,1000 --duration 10`
//! Generate: `cargo run --release --bin financier-bench -- generate --out tasks.json`

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use financier_bench::driver::{plan_rounds, Driver, Round, RunSummary};
use financier_bench::generator::{save_tasks, Distribution, TaskFile, TaskSpec};
use financier_bench::recorder::ResultRecorder;
use financier_bench::{BenchError, MemoryStore, Seeder, TracingObserver};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const DEFAULT_RECORDS: u64 = 10_000;
const DEFAULT_RECORD_SIZE: usize = 1000;
const DEFAULT_TXNS: usize = 10_000;
const DEFAULT_READS: usize = 4;
const DEFAULT_WRITES: usize = 4;
const DEFAULT_UPDATE_SIZE: usize = 1000;
const DEFAULT_SEED: u64 = 0xF1_2026;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "financier-bench", about = "Seeded key-value read/write benchmark")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed a fresh store and drive a task batch against it
    Run(RunArgs),
    /// Generate a task batch and write it to a file
    Generate(GenerateArgs),
}

#[derive(Args, Clone, Debug)]
struct TaskArgs {
    /// Number of seeded records (also the sampled keyspace)
    #[arg(long, default_value_t = DEFAULT_RECORDS, env = "FINANCIER_RECORDS")]
    records: u64,
    /// Transactions per batch
    #[arg(long, default_value_t = DEFAULT_TXNS, env = "FINANCIER_TXNS")]
    txns: usize,
    /// Reads per transaction
    #[arg(long, default_value_t = DEFAULT_READS, env = "FINANCIER_READS")]
    reads: usize,
    /// Writes per transaction
    #[arg(long, default_value_t = DEFAULT_WRITES, env = "FINANCIER_WRITES")]
    writes: usize,
    /// Bytes written per update
    #[arg(long, default_value_t = DEFAULT_UPDATE_SIZE, env = "FINANCIER_UPDATE_SIZE")]
    update_size: usize,
    /// Injected delay per transaction
    #[arg(long, default_value_t = 0, env = "FINANCIER_DELAY_MS")]
    delay_ms: u64,
    /// Zipf exponent; keys are uniform when omitted
    #[arg(long, env = "FINANCIER_ZIPF")]
    zipf: Option<f64>,
    #[arg(long, default_value_t = DEFAULT_SEED, env = "FINANCIER_SEED")]
    seed: u64,
}

impl TaskArgs {
    fn spec(&self) -> TaskSpec {
        TaskSpec {
            n_txn: self.txns,
            n_accounts: usize::try_from(self.records).unwrap_or(usize::MAX),
            delay_millis: self.delay_ms,
            n_reads: self.reads,
            n_writes: self.writes,
            update_size: self.update_size,
            distribution: match self.zipf {
                Some(s) => Distribution::Zipf { s },
                None => Distribution::Uniform,
            },
            seed: self.seed,
        }
    }
}

#[derive(Args, Clone, Debug)]
struct RunArgs {
    #[command(flatten)]
    tasks: TaskArgs,
    /// Bytes per seeded record
    #[arg(long, default_value_t = DEFAULT_RECORD_SIZE, env = "FINANCIER_RECORD_SIZE")]
    record_size: usize,
    /// Worker threads; defaults to available parallelism
    #[arg(long, env = "FINANCIER_THREADS")]
    threads: Option<usize>,
    /// Task file to replay; generated and saved first if missing.
    /// A replayed file's own parameters override the task flags.
    #[arg(long, env = "FINANCIER_TASKS")]
    task_file: Option<PathBuf>,
    /// Fixed submission rate per round (comma-separated); unpaced when omitted
    #[arg(long, value_delimiter = ',', env = "FINANCIER_TPS")]
    tps: Vec<f64>,
    /// Seconds to keep cycling the batch per round (comma-separated);
    /// every task runs once when omitted
    #[arg(long, value_delimiter = ',', env = "FINANCIER_DURATION")]
    duration: Vec<f64>,
    #[arg(long, default_value = "results", env = "FINANCIER_RESULTS_DIR")]
    results_dir: PathBuf,
    /// Skip writing the JSON report
    #[arg(long)]
    no_record: bool,
    /// One summary line instead of the table
    #[arg(short)]
    quiet: bool,
}

#[derive(Args, Clone, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    tasks: TaskArgs,
    #[arg(long)]
    out: PathBuf,
}

// ---------------------------------------------------------------------------
// Output helpers
// ---------------------------------------------------------------------------

fn fmt_num(n: u64) -> String {
    let s = n.to_string();
    let mut out = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn ms(d: std::time::Duration) -> f64 {
    d.as_nanos() as f64 / 1_000_000.0
}

fn print_summary(round: &Round, summary: &RunSummary) {
    eprintln!(
        "  {} ({}, {})",
        round.label,
        round.mode.label(),
        round.rate.label()
    );
    eprintln!(
        "  {:<10} {:>8}  {:>8}  {:>10}  {:>10}  {:>9}  {:>9}  {:>9}  {:>9}",
        "threads", "ok", "failed", "send/sec", "txn/sec", "p50", "p95", "p99", "max"
    );
    eprintln!("  {}", "-".repeat(98));
    match summary.stats() {
        Some(s) => eprintln!(
            "  {:<10} {:>8}  {:>8}  {:>10}  {:>10}  {:>7.3}ms  {:>7.3}ms  {:>7.3}ms  {:>7.3}ms",
            summary.threads,
            fmt_num(summary.succeeded as u64),
            fmt_num(summary.failed as u64),
            fmt_num(summary.send_rate() as u64),
            fmt_num(s.ops_per_sec as u64),
            ms(s.p50),
            ms(s.p95),
            ms(s.p99),
            ms(s.max),
        ),
        None => eprintln!(
            "  {:<10} {:>8}  {:>8}  {:>10}  (no successful transactions)",
            summary.threads,
            0,
            fmt_num(summary.failed as u64),
            fmt_num(summary.send_rate() as u64),
        ),
    }
    eprintln!(
        "  reads: {} hits, {} misses, {} errors; writes: {}",
        fmt_num(summary.totals.hits),
        fmt_num(summary.totals.misses),
        fmt_num(summary.totals.read_errors),
        fmt_num(summary.totals.writes),
    );
    eprintln!();
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn obtain_tasks(args: &RunArgs) -> Result<TaskFile, BenchError> {
    let spec = args.tasks.spec();
    match &args.task_file {
        Some(path) => TaskFile::load_or_generate(path, &spec),
        None => TaskFile::generate(&spec),
    }
}

fn run(args: RunArgs) -> Result<(), BenchError> {
    let rounds = plan_rounds(&args.tps, &args.duration)?;
    let TaskFile { spec, tasks } = obtain_tasks(&args)?;
    let records = spec.n_accounts as u64;
    let store = MemoryStore::new();

    if !args.quiet {
        eprintln!("=== Financier read/write benchmark ===");
        eprintln!(
            "  records={}  record={}B  txns={}  r{}w{}  update={}B  delay={}ms  keys={}",
            fmt_num(records),
            args.record_size,
            fmt_num(tasks.len() as u64),
            spec.n_reads,
            spec.n_writes,
            spec.update_size,
            spec.delay_millis,
            spec.distribution.label(),
        );
        eprintln!();
    }

    let seed_start = Instant::now();
    let seeded = Seeder::new(&store, TracingObserver).seed(records, args.record_size)?;
    let seed_elapsed = seed_start.elapsed();

    let threads = args.threads.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    });
    let summaries = Driver::new(threads).run_rounds(&store, TracingObserver, &tasks, &rounds);

    if args.quiet {
        for (round, summary) in rounds.iter().zip(&summaries) {
            let (tps, p50, p99) = summary
                .stats()
                .map(|s| (s.ops_per_sec, ms(s.p50), ms(s.p99)))
                .unwrap_or_default();
            eprintln!(
                "financier {}: seeded={} ok={} failed={} send/s={} txn/s={} \
                 p50={:.3}ms p99={:.3}ms",
                round.label,
                fmt_num(seeded),
                fmt_num(summary.succeeded as u64),
                fmt_num(summary.failed as u64),
                fmt_num(summary.send_rate() as u64),
                fmt_num(tps as u64),
                p50,
                p99,
            );
        }
    } else {
        eprintln!(
            "  Seed: {} records in {:.3}s",
            fmt_num(seeded),
            seed_elapsed.as_secs_f64()
        );
        eprintln!();
        for (round, summary) in rounds.iter().zip(&summaries) {
            print_summary(round, summary);
        }
    }

    if !args.no_record {
        let base = format!(
            "financier/{}/r{}w{}/{}",
            seeded,
            spec.n_reads,
            spec.n_writes,
            spec.distribution.label()
        );
        let mut recorder = ResultRecorder::new("financier");
        for (round, summary) in rounds.iter().zip(&summaries) {
            let mut params = HashMap::new();
            params.insert("records".into(), serde_json::json!(seeded));
            params.insert("record_size".into(), serde_json::json!(args.record_size));
            params.insert("txns".into(), serde_json::json!(tasks.len()));
            params.insert("reads".into(), serde_json::json!(spec.n_reads));
            params.insert("writes".into(), serde_json::json!(spec.n_writes));
            params.insert("update_size".into(), serde_json::json!(spec.update_size));
            params.insert("delay_ms".into(), serde_json::json!(spec.delay_millis));
            params.insert("distribution".into(), serde_json::json!(spec.distribution.label()));
            params.insert("seed".into(), serde_json::json!(spec.seed));
            params.insert("round".into(), serde_json::json!(round.label));
            params.insert("mode".into(), serde_json::json!(round.mode.label()));
            params.insert("rate".into(), serde_json::json!(round.rate.label()));
            params.insert(
                "seed_elapsed_ms".into(),
                serde_json::json!(seed_elapsed.as_millis() as u64),
            );

            let name = if rounds.len() > 1 {
                format!("{}/{}", base, round.label)
            } else {
                base.clone()
            };
            recorder.record_run(&name, params, summary);
        }
        recorder.save_to(&args.results_dir)?;
    }

    Ok(())
}

fn generate(args: GenerateArgs) -> Result<(), BenchError> {
    let file = TaskFile::generate(&args.tasks.spec())?;
    save_tasks(&args.out, &file)?;
    eprintln!(
        "Wrote {} tasks to {}",
        fmt_num(file.tasks.len() as u64),
        args.out.display()
    );
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => run(args),
        Commands::Generate(args) => generate(args),
    };
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(if e.is_argument_error() { 2 } else { 1 });
    }
}
