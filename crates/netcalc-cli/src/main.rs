use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use netcalc_cidr::{analyze, analyze_parts, expand_range, RangeReport, SubnetReport};
use netcalc_core::config::{self, Settings};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod batch;

use batch::{BatchProcessor, BatchResult, Outcome};

/// IPv4 subnet calculator and range expander
#[derive(Parser)]
#[command(name = "netcalc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "human", global = true)]
    output: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Describe the subnet containing an address
    Subnet(SubnetArgs),
    /// Expand an address range to the smallest covering CIDR block
    Range(RangeArgs),
    /// Batch process subnets and ranges from file or stdin
    Batch(BatchArgs),
}

#[derive(Parser)]
struct SubnetArgs {
    /// IPv4 address, optionally with /prefix
    #[arg(value_name = "ADDRESS[/PREFIX]")]
    target: String,

    /// Prefix length used when ADDRESS has none; an explicit /PREFIX in ADDRESS wins
    #[arg(short, long)]
    prefix: Option<u8>,
}

#[derive(Parser)]
struct RangeArgs {
    /// First address of the range
    #[arg(value_name = "START")]
    start: String,

    /// Last address of the range
    #[arg(value_name = "END")]
    end: String,
}

#[derive(Parser)]
struct BatchArgs {
    /// Input file (use '-' for stdin)
    #[arg(short, long, value_name = "FILE")]
    file: Option<String>,

    /// Number of worker threads
    #[arg(short, long)]
    workers: Option<usize>,

    /// Prefix length used for lines without one; an explicit /PREFIX on a line wins
    #[arg(short, long)]
    prefix: Option<u8>,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable table output
    Human,
    /// JSON output (pretty-printed)
    Json,
    /// JSON output (compact)
    JsonCompact,
    /// CSV output
    Csv,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, config::log_filter_from_env().as_deref());

    match cli.command {
        Commands::Subnet(args) => {
            handle_subnet(args, &Settings::from_env()?, cli.output, cli.verbose)?
        }
        Commands::Range(args) => handle_range(args, cli.output, cli.verbose)?,
        Commands::Batch(args) => {
            handle_batch(args, &Settings::from_env()?, cli.output, cli.verbose)?
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool, log_filter: Option<&str>) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(log_filter.unwrap_or("warn"))
    };

    // A subscriber may already be installed when running under tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_subnet(
    args: SubnetArgs,
    settings: &Settings,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    if verbose {
        eprintln!("{} Analyzing: {}", "›".blue(), args.target);
    }

    let report = if args.target.contains('/') {
        analyze(&args.target)?
    } else {
        analyze_parts(
            &args.target,
            Some(args.prefix.unwrap_or(settings.default_prefix)),
        )?
    };

    match format {
        OutputFormat::Human => print_subnet_human(&report),
        OutputFormat::Json => print_json(&report, true)?,
        OutputFormat::JsonCompact => print_json(&report, false)?,
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            wtr.write_record(SUBNET_CSV_HEADER)?;
            wtr.write_record(subnet_csv_row(&report))?;
            wtr.flush()?;
        }
    }
    Ok(())
}

fn handle_range(args: RangeArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    if verbose {
        eprintln!("{} Expanding: {} - {}", "›".blue(), args.start, args.end);
    }

    let report = expand_range(&args.start, &args.end)?;

    match format {
        OutputFormat::Human => print_range_human(&report),
        OutputFormat::Json => print_json(&report, true)?,
        OutputFormat::JsonCompact => print_json(&report, false)?,
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            wtr.write_record(RANGE_CSV_HEADER)?;
            wtr.write_record(range_csv_row(&report))?;
            wtr.flush()?;
        }
    }
    Ok(())
}

fn handle_batch(
    args: BatchArgs,
    settings: &Settings,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let processor = BatchProcessor::new(
        args.workers,
        args.prefix.unwrap_or(settings.default_prefix),
    )?;

    if verbose {
        eprintln!(
            "{} Batch processing with {} workers",
            "›".blue(),
            processor.thread_count()
        );
        match args.file.as_deref() {
            Some(file) if file != "-" => eprintln!("{} Reading from: {}", "›".blue(), file),
            _ => eprintln!("{} Reading from stdin", "›".blue()),
        }
    }

    let lines = batch::read_lines(args.file.as_deref())?;
    let results = processor.process(lines);

    match format {
        OutputFormat::Human => print_batch_human(&results),
        OutputFormat::Json => print_json(&results, true)?,
        OutputFormat::JsonCompact => print_json(&results, false)?,
        OutputFormat::Csv => print_batch_csv(&results)?,
    }
    Ok(())
}

fn print_subnet_human(report: &SubnetReport) {
    println!();
    println!("{}", "Subnet Report".bold().cyan());
    println!("{}", "─".repeat(60).dimmed());
    println!("{:>17}: {}", "Address".bold(), report.address);
    println!("{:>17}: {}", "CIDR".bold(), report.cidr.to_string().green());
    println!("{:>17}: {}", "Subnet mask".bold(), report.subnet_mask);
    println!("{:>17}: {}", "Wildcard mask".bold(), report.wildcard_mask);
    println!("{:>17}: {}", "Network".bold(), report.network);
    println!("{:>17}: {}", "Broadcast".bold(), report.broadcast);
    println!(
        "{:>17}: {} - {}",
        "Usable hosts".bold(),
        report.first_usable,
        report.last_usable
    );
    println!("{:>17}: {}", "Host count".bold(), report.host_count);
    println!("{:>17}: {}", "Total addresses".bold(), report.total_addresses);
    println!("{:>17}: {}", "Class".bold(), report.class);

    if let Some(previous) = report.previous_block {
        println!("{:>17}: {}", "Previous block".bold(), previous);
    }
    if let Some(next) = report.next_block {
        println!("{:>17}: {}", "Next block".bold(), next);
    }

    println!("{}", "─".repeat(60).dimmed());
    println!("{:>17}: {}", "Address (bin)".bold(), report.address_binary.dimmed());
    println!("{:>17}: {}", "Mask (bin)".bold(), report.subnet_mask_binary.dimmed());
    println!("{:>17}: {}", "Network (bin)".bold(), report.network_binary.dimmed());
    println!("{:>17}: {}", "Broadcast (bin)".bold(), report.broadcast_binary.dimmed());
    println!();
}

fn print_range_human(report: &RangeReport) {
    println!();
    println!("{}", "Range Expansion".bold().cyan());
    println!("{}", "─".repeat(50).dimmed());
    println!("{:>17}: {} - {}", "Requested".bold(), report.start, report.end);
    println!("{:>17}: {}", "Requested size".bold(), report.requested_size);
    println!("{:>17}: {}", "CIDR".bold(), report.cidr.to_string().green());
    println!("{:>17}: {}", "Subnet mask".bold(), report.subnet_mask);
    println!(
        "{:>17}: {} - {}",
        "Aligned block".bold(),
        report.aligned_start,
        report.aligned_end
    );
    println!("{:>17}: {}", "Addresses".bold(), report.addresses_in_range);
    println!();
}

fn print_batch_human(results: &[BatchResult]) {
    for result in results {
        let prefix = format!("{:>5}", result.line).dimmed();
        match (&result.report, &result.error) {
            (Some(Outcome::Subnet(report)), _) => println!(
                "{} {} {} ({} hosts, class {})",
                prefix,
                result.input,
                report.cidr.to_string().green(),
                report.host_count,
                report.class
            ),
            (Some(Outcome::Range(report)), _) => println!(
                "{} {} {} ({} addresses)",
                prefix,
                result.input,
                report.cidr.to_string().green(),
                report.addresses_in_range
            ),
            (None, Some(error)) => println!("{} {} {}", prefix, result.input, error.red()),
            (None, None) => println!("{} {}", prefix, result.input),
        }
    }

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    eprintln!(
        "{} {} processed, {} failed",
        "›".blue(),
        results.len(),
        failed
    );
}

fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<()> {
    if pretty {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", serde_json::to_string(value)?);
    }
    Ok(())
}

const SUBNET_CSV_HEADER: [&str; 13] = [
    "input",
    "cidr",
    "subnet_mask",
    "wildcard_mask",
    "network",
    "broadcast",
    "first_usable",
    "last_usable",
    "host_count",
    "total_addresses",
    "class",
    "previous_block",
    "next_block",
];

fn subnet_csv_row(report: &SubnetReport) -> Vec<String> {
    vec![
        report.input.clone(),
        report.cidr.to_string(),
        report.subnet_mask.to_string(),
        report.wildcard_mask.to_string(),
        report.network.to_string(),
        report.broadcast.to_string(),
        report.first_usable.to_string(),
        report.last_usable.to_string(),
        report.host_count.to_string(),
        report.total_addresses.to_string(),
        report.class.to_string(),
        report.previous_block.map_or(String::new(), |c| c.to_string()),
        report.next_block.map_or(String::new(), |c| c.to_string()),
    ]
}

const RANGE_CSV_HEADER: [&str; 8] = [
    "start",
    "end",
    "requested_size",
    "cidr",
    "subnet_mask",
    "aligned_start",
    "aligned_end",
    "addresses_in_range",
];

fn range_csv_row(report: &RangeReport) -> Vec<String> {
    vec![
        report.start.to_string(),
        report.end.to_string(),
        report.requested_size.to_string(),
        report.cidr.to_string(),
        report.subnet_mask.to_string(),
        report.aligned_start.to_string(),
        report.aligned_end.to_string(),
        report.addresses_in_range.to_string(),
    ]
}

fn print_batch_csv(results: &[BatchResult]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    wtr.write_record(["line", "input", "kind", "cidr", "first", "last", "count", "error"])?;

    for result in results {
        let line = result.line.to_string();
        let row: [String; 6] = match &result.report {
            Some(Outcome::Subnet(report)) => [
                "subnet".to_string(),
                report.cidr.to_string(),
                report.first_usable.to_string(),
                report.last_usable.to_string(),
                report.host_count.to_string(),
                String::new(),
            ],
            Some(Outcome::Range(report)) => [
                "range".to_string(),
                report.cidr.to_string(),
                report.aligned_start.to_string(),
                report.aligned_end.to_string(),
                report.addresses_in_range.to_string(),
                String::new(),
            ],
            None => [
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                result.error.clone().unwrap_or_default(),
            ],
        };

        wtr.write_record(
            [line.as_str(), result.input.as_str()]
                .into_iter()
                .chain(row.iter().map(String::as_str)),
        )?;
    }

    wtr.flush()?;
    Ok(())
}
