//! vc-stress: push from many threads at once, then account for every value.
//!
//! Each producer thread pushes exactly one distinct value. After all
//! producers are joined, the container is drained either from the main
//! thread or by a set of concurrent consumer threads.
//!
//! # Usage
//!
//! ```bash
//! vc-stress --container queue
//! vc-stress --container stack --threads 1024 --quiet
//! vc-stress --container queue --consumers 8
//! RUST_LOG=debug vc-stress --container stack
//! ```
//!
//! Drained values go to stdout one per line, followed by a JSON summary.
//! Exits 1 if any value was lost or delivered twice.

use std::collections::HashMap;
use std::process;
use std::thread;

use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use vc_containers::{ConcurrentQueue, ConcurrentStack};

/// Maximum producer or consumer threads.
const THREADS_COUNT_MAX: u16 = 1024;

/// Default producer threads.
const THREADS_COUNT_DEFAULT: u16 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
enum ContainerKind {
    Queue,
    Stack,
}

/// Concurrent push integrity check for the queue and stack.
#[derive(Parser, Debug)]
#[command(name = "vc-stress")]
#[command(about = "Push from many threads, drain, and check nothing was lost")]
struct Cli {
    /// Container under test.
    #[arg(long, value_enum)]
    container: ContainerKind,

    /// Producer threads, one push each.
    #[arg(
        long,
        default_value_t = THREADS_COUNT_DEFAULT,
        value_parser = clap::value_parser!(u16).range(1..=i64::from(THREADS_COUNT_MAX))
    )]
    threads: u16,

    /// Consumer threads draining concurrently. 0 drains from the main thread.
    #[arg(
        long,
        default_value_t = 0,
        value_parser = clap::value_parser!(u16).range(0..=i64::from(THREADS_COUNT_MAX))
    )]
    consumers: u16,

    /// Print only the JSON summary.
    #[arg(long)]
    quiet: bool,
}

/// JSON summary printed after the drained values.
#[derive(Debug, Serialize)]
struct Summary {
    container: ContainerKind,
    producers: usize,
    consumers: usize,
    pushed: usize,
    drained: usize,
    duplicates: Vec<String>,
    missing: Vec<String>,
    passed: bool,
}

fn value_for(producer: usize) -> String {
    producer.to_string()
}

/// Split `total` pops as evenly as possible across `consumers`.
fn quotas(total: usize, consumers: usize) -> Vec<usize> {
    (0..consumers)
        .map(|i| total / consumers + usize::from(i < total % consumers))
        .collect()
}

fn run_queue(producers: usize, consumers: usize) -> Vec<String> {
    let queue = ConcurrentQueue::new();

    thread::scope(|s| {
        for i in 0..producers {
            let queue = &queue;
            s.spawn(move || queue.push(value_for(i)));
        }
    });
    tracing::debug!(len = queue.len(), "producers joined");

    if consumers == 0 {
        return queue.drain();
    }

    thread::scope(|s| {
        let handles: Vec<_> = quotas(producers, consumers)
            .into_iter()
            .map(|quota| {
                let queue = &queue;
                s.spawn(move || (0..quota).map(|_| queue.wait_and_pop()).collect::<Vec<_>>())
            })
            .collect();
        join_all(handles)
    })
}

fn run_stack(producers: usize, consumers: usize) -> Vec<String> {
    let stack = ConcurrentStack::new();

    thread::scope(|s| {
        for i in 0..producers {
            let stack = &stack;
            s.spawn(move || stack.push(value_for(i)));
        }
    });
    tracing::debug!(len = stack.len(), "producers joined");

    if consumers == 0 {
        let mut drained = Vec::with_capacity(producers);
        while let Ok(value) = stack.pop() {
            drained.push(value);
        }
        return drained;
    }

    thread::scope(|s| {
        let handles: Vec<_> = quotas(producers, consumers)
            .into_iter()
            .map(|quota| {
                let stack = &stack;
                s.spawn(move || {
                    let mut taken = Vec::with_capacity(quota);
                    let mut empty_pops: u64 = 0;
                    while taken.len() < quota {
                        match stack.pop() {
                            Ok(value) => taken.push(value),
                            Err(_) => {
                                empty_pops += 1;
                                thread::yield_now();
                            }
                        }
                    }
                    tracing::trace!(quota, empty_pops, "consumer done");
                    taken
                })
            })
            .collect();
        join_all(handles)
    })
}

fn join_all(handles: Vec<thread::ScopedJoinHandle<'_, Vec<String>>>) -> Vec<String> {
    let mut drained = Vec::new();
    for handle in handles {
        match handle.join() {
            Ok(values) => drained.extend(values),
            Err(_) => {
                eprintln!("Error: consumer thread panicked");
                process::exit(1);
            }
        }
    }
    drained
}

fn summarize(cli: &Cli, drained: &[String]) -> Summary {
    let producers = usize::from(cli.threads);

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in drained {
        *counts.entry(value.as_str()).or_insert(0) += 1;
    }

    let mut duplicates: Vec<String> = counts
        .iter()
        .filter(|(_, n)| **n > 1)
        .map(|(v, _)| (*v).to_string())
        .collect();
    duplicates.sort_unstable();

    let missing: Vec<String> = (0..producers)
        .map(value_for)
        .filter(|v| !counts.contains_key(v.as_str()))
        .collect();

    Summary {
        container: cli.container,
        producers,
        consumers: usize::from(cli.consumers),
        pushed: producers,
        drained: drained.len(),
        passed: duplicates.is_empty() && missing.is_empty() && drained.len() == producers,
        duplicates,
        missing,
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let producers = usize::from(cli.threads);
    let consumers = usize::from(cli.consumers);
    tracing::info!(container = ?cli.container, producers, consumers, "starting");

    let drained = match cli.container {
        ContainerKind::Queue => run_queue(producers, consumers),
        ContainerKind::Stack => run_stack(producers, consumers),
    };

    if !cli.quiet {
        for value in &drained {
            println!("{}", value);
        }
    }

    let summary = summarize(&cli, &drained);
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }

    if !summary.passed {
        tracing::warn!(
            missing = summary.missing.len(),
            duplicates = summary.duplicates.len(),
            "integrity check failed"
        );
        process::exit(1);
    }
}
