//! Functions command implementation.
//!
//! Ranks the profile's functions by total self time and prints the
//! slowest ones, the same aggregation the occurrence pipeline consumes.

use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;

use crate::calltree::CallTreeFunction;
use crate::output::read_raw_profile;

/// Arguments for the functions command
#[derive(Debug, Clone)]
pub struct FunctionsArgs {
    /// Path to the raw profile envelope JSON
    pub input: PathBuf,

    /// Number of functions to print
    pub top: usize,

    /// Only list application functions
    pub application_only: bool,
}

/// Execute the functions command
pub fn execute_functions(args: FunctionsArgs) -> Result<()> {
    let raw = read_raw_profile(&args.input).context("failed to read the raw profile envelope")?;
    let profile = raw.parse().context("failed to decode the profile payload")?;

    let functions = profile
        .functions()
        .context("failed to aggregate functions")?;
    info!("aggregated {} distinct functions", functions.len());

    let mut ranked: Vec<CallTreeFunction> = functions.into_values().collect();
    if args.application_only {
        ranked.retain(|function| function.in_app);
    }
    ranked.sort_by_key(|function| std::cmp::Reverse(total_self_time_ns(function)));

    println!(
        "{:<60} {:>12} {:>6} {:>8}",
        "FUNCTION", "SELF TIME", "CALLS", "IN APP"
    );
    for function in ranked.iter().take(args.top) {
        println!(
            "{:<60} {:>10}ms {:>6} {:>8}",
            display_name(function),
            total_self_time_ns(function) / 1_000_000,
            function.self_times_ns.len(),
            if function.in_app { "yes" } else { "no" }
        );
    }
    if ranked.len() > args.top {
        println!("(showing top {} of {} functions)", args.top, ranked.len());
    }

    Ok(())
}

fn total_self_time_ns(function: &CallTreeFunction) -> u64 {
    function.self_times_ns.iter().sum()
}

fn display_name(function: &CallTreeFunction) -> String {
    if function.package.is_empty() {
        function.function.clone()
    } else {
        format!("{} ({})", function.function, function.package)
    }
}
