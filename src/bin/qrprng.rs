//! Minimal CLI for drawing from and inspecting quadratic-residue permutations.
//!
//! Parameters come from an optional JSON config (`--config <file>`), then
//! `QRPRNG_PRIME`, `QRPRNG_INTERMEDIATE_OFFSET` and `QRPRNG_OFFSET`, and
//! otherwise the default generator.

use qrprng::{check_full_period, GeneratorConfig, QuadraticResiduePrng};
use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};
use std::{
    env, fs,
    hint::black_box,
    io::Write,
    path::PathBuf,
    time::{Duration, Instant},
};
use tracing::{debug, info};

const BENCH_PRIME: u64 = 9_021_057_379;
const BENCH_INTERMEDIATE_OFFSET: u64 = 2_947_624_585;
const BENCH_OFFSET: u64 = 1_000_014_012;

fn fatal(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn print_help() {
    println!("Usage: qrprng <stream|index|check|params|sample|bench> ...");
    println!("  stream [--config <file>] [--seed <i64>] [--count <N>] [--out <file>]");
    println!("  index <i> [--config <file>]");
    println!("  check [--config <file>]");
    println!("  params [--config <file>]");
    println!("  sample --lo <u64> --hi <u64> [--config <file>] [--seed <i64>] [--count <N>]");
    println!("  bench [--iters <N>]");
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let mut args = env::args().skip(1);
    let command = args.next();
    let tail: Vec<String> = args.collect();
    match command.as_deref() {
        Some("stream") => cmd_stream(tail),
        Some("index") => cmd_index(tail),
        Some("check") => cmd_check(tail),
        Some("params") => cmd_params(tail),
        Some("sample") => cmd_sample(tail),
        Some("bench") => cmd_bench(tail),
        Some("-h") | Some("--help") => print_help(),
        _ => {
            print_help();
            std::process::exit(1);
        }
    }
}

/// Flags shared by the generator-driven commands.
#[derive(Default)]
struct CommonArgs {
    config: Option<PathBuf>,
    seed: Option<i64>,
    count: Option<usize>,
    out: Option<PathBuf>,
    lo: Option<u64>,
    hi: Option<u64>,
    iters: Option<u64>,
    positional: Vec<String>,
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> T {
    let value = value.unwrap_or_else(|| fatal(&format!("{flag} expects a value")));
    value
        .replace('_', "")
        .parse()
        .unwrap_or_else(|_| fatal(&format!("invalid {flag} value: {value}")))
}

fn parse_common(args: Vec<String>) -> CommonArgs {
    let mut parsed = CommonArgs::default();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter
                    .next()
                    .unwrap_or_else(|| fatal("--config expects a path"));
                parsed.config = Some(PathBuf::from(path));
            }
            "--out" => {
                let path = iter.next().unwrap_or_else(|| fatal("--out expects a path"));
                parsed.out = Some(PathBuf::from(path));
            }
            "--seed" => parsed.seed = Some(parse_value("--seed", iter.next())),
            "--count" => parsed.count = Some(parse_value("--count", iter.next())),
            "--lo" => parsed.lo = Some(parse_value("--lo", iter.next())),
            "--hi" => parsed.hi = Some(parse_value("--hi", iter.next())),
            "--iters" => parsed.iters = Some(parse_value("--iters", iter.next())),
            other if other.starts_with("--") => fatal(&format!("unknown argument: {other}")),
            other => parsed.positional.push(other.to_string()),
        }
    }
    parsed
}

fn load_config(args: &CommonArgs) -> GeneratorConfig {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::load(path)
            .unwrap_or_else(|err| fatal(&format!("failed to load {}: {err}", path.display()))),
        None => GeneratorConfig::default(),
    };
    config
        .apply_env()
        .unwrap_or_else(|err| fatal(&format!("invalid environment override: {err}")));
    config
}

fn build_generator(args: &CommonArgs) -> QuadraticResiduePrng {
    let config = load_config(args);
    let mut rng = config
        .build()
        .unwrap_or_else(|err| fatal(&format!("invalid parameters: {err}")));
    if let Some(seed) = args.seed {
        rng.reseed(seed);
    }
    rng
}

fn cmd_stream(args: Vec<String>) {
    let args = parse_common(args);
    let mut rng = build_generator(&args);
    let count = args.count.unwrap_or(10);
    let lines = render_stream(&mut rng, count);
    match &args.out {
        Some(path) => {
            fs::write(path, lines).unwrap_or_else(|err| {
                fatal(&format!("failed to write {}: {err}", path.display()))
            });
            info!(count, path = %path.display(), "wrote stream");
        }
        None => print!("{lines}"),
    }
}

fn render_stream(rng: &mut QuadraticResiduePrng, count: usize) -> String {
    let mut lines = String::new();
    for _ in 0..count {
        lines.push_str(&format!("{}\n", rng.next_u64()));
    }
    lines
}

fn cmd_index(args: Vec<String>) {
    let args = parse_common(args);
    let raw = args
        .positional
        .first()
        .cloned()
        .unwrap_or_else(|| fatal("Usage: qrprng index <i> [--config <file>]"));
    let i: u64 = parse_value("index", Some(raw));
    let rng = build_generator(&args);
    match rng.index(i) {
        Ok(value) => println!("{value}"),
        Err(err) => {
            let prime = rng.params().prime();
            eprintln!("{err}; the sequence cycles, showing index {}", i % prime);
            println!("{}", rng.params().evaluate(i % prime));
        }
    }
}

fn cmd_check(args: Vec<String>) {
    let args = parse_common(args);
    let params = *build_generator(&args).params();
    let start = Instant::now();
    match check_full_period(&params) {
        Ok(()) => {
            info!(
                prime = params.prime(),
                elapsed_ms = ms(&start.elapsed()),
                "full period verified"
            );
            println!("ok: {} distinct values", params.prime());
        }
        Err(err) => fatal(&format!("period check failed: {err}")),
    }
}

fn cmd_params(args: Vec<String>) {
    let args = parse_common(args);
    let rng = build_generator(&args);
    let json = serde_json::to_string_pretty(rng.params())
        .unwrap_or_else(|err| fatal(&format!("failed to encode parameters: {err}")));
    println!("{json}");
}

fn cmd_sample(args: Vec<String>) {
    let args = parse_common(args);
    let lo = args.lo.unwrap_or_else(|| fatal("--lo is required"));
    let hi = args.hi.unwrap_or_else(|| fatal("--hi is required"));
    if lo >= hi {
        fatal("--lo must be less than --hi");
    }
    let mut rng = build_generator(&args);
    for _ in 0..args.count.unwrap_or(10) {
        println!("{}", rng.gen_range(lo..hi));
    }
}

fn cmd_bench(args: Vec<String>) {
    let args = parse_common(args);
    let iters = args.iters.unwrap_or(10_000_000);
    if iters == 0 {
        fatal("--iters must be positive");
    }
    let mut rows = Vec::new();
    println!("{:>12} | {:>12} | {:>10}", "case", "total(ms)", "ns/op");
    println!("{}", "-".repeat(40));

    let mut custom = QuadraticResiduePrng::new(BENCH_PRIME, BENCH_INTERMEDIATE_OFFSET, BENCH_OFFSET)
        .unwrap_or_else(|err| fatal(&format!("invalid bench parameters: {err}")));
    rows.push(("uint64", time_draws(iters, || custom.next_u64())));

    let mut default = QuadraticResiduePrng::default();
    rows.push(("default", time_draws(iters, || default.next_u64())));

    let mut adapted = QuadraticResiduePrng::default();
    rows.push(("rand_source", time_draws(iters, || adapted.gen::<u64>())));

    let mut baseline = StdRng::seed_from_u64(BENCH_INTERMEDIATE_OFFSET);
    rows.push(("stdrng", time_draws(iters, || baseline.next_u64())));

    for (name, elapsed) in &rows {
        println!(
            "{:>12} | {:>12.3} | {:>10.3}",
            name,
            ms(elapsed),
            elapsed.as_nanos() as f64 / iters as f64
        );
    }

    if let Ok(path) = env::var("QRPRNG_BENCH_OUT") {
        let mut file = fs::File::create(&path)
            .unwrap_or_else(|err| fatal(&format!("failed to create {path}: {err}")));
        let mut csv = String::from("case,iters,total_ms,ns_per_op\n");
        for (name, elapsed) in &rows {
            csv.push_str(&format!(
                "{},{},{:.3},{:.3}\n",
                name,
                iters,
                ms(elapsed),
                elapsed.as_nanos() as f64 / iters as f64
            ));
        }
        file.write_all(csv.as_bytes())
            .unwrap_or_else(|err| fatal(&format!("failed to write {path}: {err}")));
        info!(path = %path, "wrote benchmark csv");
    }
}

fn time_draws<F: FnMut() -> u64>(iters: u64, mut draw: F) -> Duration {
    let start = Instant::now();
    for _ in 0..iters {
        black_box(draw());
    }
    let elapsed = start.elapsed();
    debug!(iters, elapsed_ms = ms(&elapsed), "benchmark case finished");
    elapsed
}

fn ms(duration: &Duration) -> f64 {
    duration.as_secs_f64() * 1_000.0
}
