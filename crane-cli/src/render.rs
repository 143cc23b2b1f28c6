//! Terminal rendering of plans and aggregated results.

use colored::Colorize;
use crane_core::{CommandResult, InvocationPlan, OverallStatus};
use std::collections::HashSet;
use tabled::{settings::Style, Table, Tabled};

/// Print a dry-run plan, one command line per step.
pub fn print_plan(plan: &InvocationPlan) {
    for line in plan.render() {
        println!("{} {}", "→".cyan().bold(), line);
    }
}

/// Print captured backend output and, for multi-target commands, a
/// per-target summary.
pub fn print_result(result: &CommandResult) {
    let failed = failed_targets(result);

    for outcome in &result.outcomes {
        if !outcome.stdout.is_empty() {
            print!("{}", outcome.stdout);
        }
        if failed.contains(outcome.target.as_str()) && !outcome.stderr.is_empty() {
            eprint!("{}", outcome.stderr.red());
        }
    }

    if result.outcomes.len() > 1 {
        print_summary(result, &failed);
    } else if let Some(outcome) = result.outcomes.first() {
        if failed.contains(outcome.target.as_str()) {
            eprintln!("{} {} failed", "✗".red().bold(), outcome.target.bold());
        }
    }
}

fn print_summary(result: &CommandResult, failed: &HashSet<&str>) {
    #[derive(Tabled)]
    struct TargetRow {
        #[tabled(rename = "TARGET")]
        target: String,
        #[tabled(rename = "STATUS")]
        status: String,
    }

    let rows: Vec<TargetRow> = result
        .outcomes
        .iter()
        .map(|outcome| TargetRow {
            target: outcome.target.clone(),
            status: if failed.contains(outcome.target.as_str()) {
                "failed".red().to_string()
            } else {
                "ok".green().to_string()
            },
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let succeeded = result.outcomes.len() - failed.len();
    let glyph = match result.status {
        OverallStatus::AllSucceeded => "✓".green().bold(),
        OverallStatus::PartialFailure(_) => "⚠".yellow().bold(),
        OverallStatus::AllFailed => "✗".red().bold(),
    };
    println!("{} {} succeeded, {} failed", glyph, succeeded, failed.len());
}

fn failed_targets(result: &CommandResult) -> HashSet<&str> {
    match &result.status {
        OverallStatus::AllSucceeded => HashSet::new(),
        OverallStatus::PartialFailure(names) => names.iter().map(String::as_str).collect(),
        OverallStatus::AllFailed => {
            result.outcomes.iter().map(|outcome| outcome.target.as_str()).collect()
        }
    }
}
