//! CLI subcommand modules.
//!
//! This module contains the implementations for all sagres CLI subcommands.

pub(crate) mod run;
pub(crate) mod validate;

use crate::RunArgs;
use anyhow::{Context, Result};
use clap::ValueEnum;
use sagres::PipelineConfig;
use sagres::eval::MetricSelection;
use sagres::traits::frame::parse_date;
use sagres_io::{CsvDataSource, SourceFilters};

/// A selectable spread metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Metric {
    TTest,
    Regression,
    Sharpe,
}

pub(crate) fn metric_selection(metrics: &[Metric]) -> MetricSelection {
    MetricSelection {
        t_test: metrics.contains(&Metric::TTest),
        regression: metrics.contains(&Metric::Regression),
        sharpe: metrics.contains(&Metric::Sharpe),
    }
}

/// Build the run configuration from flags, falling back to the environment.
pub(crate) fn pipeline_config(args: &RunArgs) -> Result<PipelineConfig> {
    let start = args
        .start
        .as_deref()
        .map(parse_date)
        .transpose()
        .context("invalid --start")?;
    let end = args
        .end
        .as_deref()
        .map(parse_date)
        .transpose()
        .context("invalid --end")?;

    let mut config = match (start, end) {
        (Some(start), Some(end)) => PipelineConfig::with_range(start, end),
        _ => PipelineConfig::from_env_with(start, end)
            .context("pass --start and --end or set SAGRES_START_DATE and SAGRES_END_DATE")?,
    };

    if let Some(rate) = args.risk_free_rate {
        config.risk_free_rate = rate;
    }
    config.fundamental_lag_months = args.lag_months;
    Ok(config)
}

pub(crate) fn data_source(args: &RunArgs) -> CsvDataSource {
    let source = CsvDataSource::new(&args.data_dir);
    if args.no_filters {
        source.with_filters(SourceFilters::none())
    } else {
        source
    }
}
