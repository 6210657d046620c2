/// CLI tool for composing records from JSON source definitions
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use smart_random::{build_generator, diagnostic, parse, ComposeError, Record};
use std::fs;
use std::io::{self, Read};
use std::process;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "smart-random")]
#[command(about = "Compose random records from weighted, tag-filtered sources")]
#[command(version)]
struct Args {
    /// Path to a JSON file of source definitions ('-' reads stdin)
    file: String,

    /// Seed for deterministic output (default: random)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of records to generate
    #[arg(short = 'n', long, default_value = "1")]
    count: usize,

    /// Print the trace of each draw instead of the record
    #[arg(long)]
    trace: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let text = if args.file == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).unwrap_or_else(|e| {
            eprintln!("Error reading from stdin: {}", e);
            process::exit(1);
        });
        buffer
    } else {
        fs::read_to_string(&args.file).unwrap_or_else(|e| {
            eprintln!("Error reading file '{}': {}", args.file, e);
            process::exit(1);
        })
    };

    let source_name = if args.file == "-" {
        "<stdin>"
    } else {
        &args.file
    };

    let generator = parse(&text)
        .map_err(ComposeError::from)
        .and_then(|definitions| build_generator(&definitions).map_err(ComposeError::from))
        .unwrap_or_else(|e| {
            eprint!("{}", diagnostic::report_compose_error(source_name, &text, &e));
            process::exit(1);
        });

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    debug!(sources = generator.sources().len(), count = args.count, "generating");

    for _ in 0..args.count {
        let output = if args.trace {
            let (_, trace) = generator.generate_traced(Record::new(), &mut rng);
            to_json(&trace, args.pretty)
        } else {
            to_json(&generator.generate(&mut rng), args.pretty)
        };
        match output {
            Ok(line) => println!("{}", line),
            Err(e) => {
                eprintln!("Error writing output: {}", e);
                process::exit(1);
            }
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}
