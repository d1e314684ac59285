//! Validate command implementation.

use super::{data_source, pipeline_config};
use crate::RunArgs;
use anyhow::Result;
use sagres::DataSource;

/// Load the inputs and report their sizes and key overlaps.
pub(crate) fn validate_inputs(args: &RunArgs) -> Result<()> {
    let config = pipeline_config(args)?;
    config.validate()?;

    let source = data_source(args);
    let tables = source.load(config.date_range())?;
    let availability = tables.check_availability()?;

    println!("Source:      {}", source.name());
    println!(
        "Period:      {} to {}",
        config.start_date, config.end_date
    );
    println!("Returns:     {} rows, {} securities", availability.n_returns, availability.n_securities);
    println!("Fundamentals: {} rows", availability.n_fundamentals);
    println!("Links:       {} rows", availability.n_links);
    println!(
        "Overlap:     {} linked securities, {} firms with fundamentals",
        availability.n_linked_securities, availability.n_firms_with_fundamentals
    );
    println!("\nInputs are joinable.");
    Ok(())
}
