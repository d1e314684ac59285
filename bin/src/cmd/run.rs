//! Run command implementation.

use super::{Metric, data_source, metric_selection, pipeline_config};
use crate::{Format, RunArgs};
use anyhow::Result;
use sagres::eval::MetricOutcome;
use sagres::{Pipeline, QmjReport};
use sagres_io::FileReporter;
use std::fmt::Display;
use std::path::PathBuf;

/// Run the pipeline and print the evaluation.
pub(crate) fn run_pipeline(
    args: &RunArgs,
    metrics: &[Metric],
    output: Option<PathBuf>,
    format: Format,
) -> Result<()> {
    let mut config = pipeline_config(args)?;
    config.metrics = metric_selection(metrics);

    let source = data_source(args);
    let pipeline = Pipeline::new(config);
    let report = match output {
        Some(dir) => pipeline.run_and_report(&source, &mut FileReporter::new(dir))?,
        None => pipeline.run(&source)?,
    };

    match format {
        Format::Json => {
            let json = serde_json::to_string_pretty(&serde_json::json!({
                "config": report.config,
                "quintiles": report.quintile_summary(),
                "evaluation": report.evaluation,
                "diagnostics": report.diagnostics,
            }))?;
            println!("{json}");
        }
        Format::Text => print_summary(&report),
    }
    Ok(())
}

fn print_summary(report: &QmjReport) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                   Quality Minus Junk                         ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let diagnostics = &report.diagnostics;
    println!(
        "Period:      {} to {}",
        report.config.start_date, report.config.end_date
    );
    println!(
        "Panel:       {} rows, {} linked, {} with fundamentals, {} scored",
        diagnostics.link.n_rows,
        diagnostics.link.n_linked,
        diagnostics.merge.n_with_fundamentals,
        diagnostics.score.n_scored
    );
    println!(
        "Months:      {} bucketed, {} degenerate, {} in spread",
        diagnostics.quintiles.n_months,
        diagnostics.quintiles.degenerate_months.len(),
        diagnostics.n_spread_months
    );
    println!();

    println!("{:<10} {:>14} {:>8}", "Quintile", "Mean Return", "Months");
    println!("{}", "-".repeat(34));
    for q in report.quintile_summary() {
        println!(
            "{:<10} {:>13.4}% {:>8}",
            format!("Q{}", q.quintile),
            q.mean_return * 100.0,
            q.n_months
        );
    }
    println!();

    let evaluation = &report.evaluation;
    println!("Spread (Q5 - Q1), {} months", evaluation.n_months);
    println!("{}", "-".repeat(34));
    if let Some(outcome) = &evaluation.t_test {
        print_metric("t-test", outcome, |t| {
            format!(
                "mean {:.4}%, t = {:.3}, p = {:.4}",
                t.mean * 100.0,
                t.t_statistic,
                t.p_value
            )
        });
    }
    if let Some(outcome) = &evaluation.regression {
        print_metric("regression", outcome, |r| {
            format!(
                "alpha {:.4}% (se {:.4}%), t = {:.3}, p = {:.4}",
                r.intercept * 100.0,
                r.std_error * 100.0,
                r.t_statistic,
                r.p_value
            )
        });
    }
    if let Some(outcome) = &evaluation.sharpe {
        print_metric("sharpe", outcome, |s| {
            format!("monthly {:.4}, annualized {:.4}", s.monthly, s.annualized)
        });
    }
    println!();
}

fn print_metric<T, D: Display>(name: &str, outcome: &MetricOutcome<T>, describe: impl Fn(&T) -> D) {
    match outcome {
        MetricOutcome::Computed(value) => println!("  {name:<12} {}", describe(value)),
        MetricOutcome::Undefined { reason } => println!("  {name:<12} undefined ({reason})"),
    }
}
