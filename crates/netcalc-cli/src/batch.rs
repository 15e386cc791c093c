//! Parallel batch processing using Rayon
//!
//! Each input line is one job:
//! - `address[/prefix]` - subnet analysis
//! - `start-end` or `start end` - range expansion
//!
//! Blank lines and `#` comments are skipped. A failing line is reported on
//! its own and never aborts the batch.

use anyhow::{Context, Result};
use netcalc_cidr::{analyze_with_default, expand_range, RangeReport, SubnetReport};
use rayon::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

/// One unit of batch work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    Subnet(String),
    Range(String, String),
}

impl Job {
    /// Classify an input line, `None` for blank lines and comments
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        if let Some((start, end)) = line.split_once('-') {
            return Some(Job::Range(start.trim().to_string(), end.trim().to_string()));
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            [start, end] => Some(Job::Range(start.to_string(), end.to_string())),
            _ => Some(Job::Subnet(line.to_string())),
        }
    }
}

/// Successful job output
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Subnet(SubnetReport),
    Range(RangeReport),
}

/// Batch processing result
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    /// 1-based line number in the input
    pub line: usize,
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Batch processor with parallel execution
pub struct BatchProcessor {
    default_prefix: u8,
    thread_pool: rayon::ThreadPool,
}

impl BatchProcessor {
    /// Create a new batch processor
    ///
    /// # Arguments
    ///
    /// * `num_threads` - Number of threads (default: CPU cores)
    /// * `default_prefix` - Prefix for subnet lines without one
    pub fn new(num_threads: Option<usize>, default_prefix: u8) -> Result<Self> {
        let num_threads = num_threads.unwrap_or_else(num_cpus::get).max(1);

        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()?;

        Ok(Self {
            default_prefix,
            thread_pool,
        })
    }

    /// Process input lines in parallel, preserving input order
    pub fn process(&self, lines: Vec<String>) -> Vec<BatchResult> {
        let jobs: Vec<(usize, String, Job)> = lines
            .into_iter()
            .enumerate()
            .filter_map(|(i, line)| Job::parse_line(&line).map(|job| (i + 1, line, job)))
            .collect();

        let total = jobs.len();
        let processed = AtomicUsize::new(0);

        self.thread_pool.install(|| {
            jobs.into_par_iter()
                .map(|(line, input, job)| {
                    let result = self.run(&job);

                    let count = processed.fetch_add(1, Ordering::Relaxed) + 1;
                    if count % 1000 == 0 || count == total {
                        info!("Processed {}/{} lines", count, total);
                    }

                    let input = input.trim().to_string();
                    match result {
                        Ok(report) => BatchResult {
                            line,
                            input,
                            report: Some(report),
                            error: None,
                        },
                        Err(e) => BatchResult {
                            line,
                            input,
                            report: None,
                            error: Some(e),
                        },
                    }
                })
                .collect()
        })
    }

    fn run(&self, job: &Job) -> std::result::Result<Outcome, String> {
        match job {
            Job::Subnet(input) => analyze_with_default(input, self.default_prefix)
                .map(Outcome::Subnet)
                .map_err(|e| e.to_string()),
            Job::Range(start, end) => expand_range(start, end)
                .map(Outcome::Range)
                .map_err(|e| e.to_string()),
        }
    }

    /// Get thread pool info
    pub fn thread_count(&self) -> usize {
        self.thread_pool.current_num_threads()
    }
}

/// Read all lines from a file, or stdin for `None` / `-`
pub fn read_lines(file: Option<&str>) -> Result<Vec<String>> {
    match file {
        None | Some("-") => read_lines_from(BufReader::new(io::stdin())),
        Some(path) => read_lines_from(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path))?,
        )),
    }
}

/// Split a reader into lines
///
/// Each line is decoded on its own; invalid UTF-8 becomes U+FFFD so the
/// line fails validation instead of the whole read.
pub fn read_lines_from<R: BufRead>(reader: R) -> Result<Vec<String>> {
    reader
        .split(b'\n')
        .map(|line| -> Result<String> {
            let mut bytes = line.context("Failed to read input")?;
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        })
        .collect()
}
