//! Conversion between polars `DataFrame`s and pipeline records.
//!
//! Input frames may carry dates either as polars `Date` columns or as
//! `YYYY-MM-DD` strings, and numeric columns in any dtype castable to the
//! target type (CSV readers often deliver everything as strings). Output
//! frames use `Date` columns and nullable numeric columns.

use crate::source::check_unique_security_months;
use crate::{
    CE_TO_UNIX_EPOCH_DAYS, Date, FundamentalRecord, LinkRecord, PortfolioReturn, Result,
    ReturnObservation, SagresError, ScoredObservation, SpreadObservation, month_end,
};
use chrono::Datelike;
use polars::prelude::*;

/// Required columns of the returns table.
pub const RETURN_COLUMNS: &[&str] = &["security_id", "date", "return"];

/// Required columns of the fundamentals table.
pub const FUNDAMENTAL_COLUMNS: &[&str] = &["firm_id", "report_date", "total_assets"];

/// Required columns of the links table.
pub const LINK_COLUMNS: &[&str] = &["firm_id", "security_id", "link_start", "link_end"];

/// Parse a date in `YYYY-MM-DD` or `YYYYMMDD` form.
pub fn parse_date(text: &str) -> Result<Date> {
    Date::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| Date::parse_from_str(text, "%Y%m%d"))
        .map_err(|e| SagresError::InvalidData(format!("Invalid date '{text}': {e}")))
}

/// Convert a returns frame into observations, truncating dates to month end.
///
/// `shares_outstanding` and `price` are optional columns.
///
/// # Errors
///
/// Returns [`SagresError::MissingColumn`] for absent required columns and
/// [`SagresError::InvalidData`] for null identifiers or dates, unparseable
/// cells, or two rows of one security falling in the same month.
pub fn returns_from_frame(df: &DataFrame) -> Result<Vec<ReturnObservation>> {
    require_columns(df, RETURN_COLUMNS)?;
    let ids = i64_values(df, "security_id")?;
    let dates = date_values(df, "date")?;
    let rets = f64_values(df, "return")?;
    let shares = optional_f64_values(df, "shares_outstanding")?;
    let prices = optional_f64_values(df, "price")?;

    let returns = (0..df.height())
        .map(|i| {
            Ok(ReturnObservation {
                security_id: required(ids[i], "security_id", i)?,
                date: month_end(required(dates[i], "date", i)?),
                ret: rets[i],
                shares_outstanding: shares[i],
                price: prices[i],
            })
        })
        .collect::<Result<Vec<_>>>()?;

    check_unique_security_months(&returns)?;
    Ok(returns)
}

/// Convert a fundamentals frame into records.
///
/// Only `firm_id`, `report_date` and `total_assets` are required; absent
/// optional columns yield nulls.
pub fn fundamentals_from_frame(df: &DataFrame) -> Result<Vec<FundamentalRecord>> {
    require_columns(df, FUNDAMENTAL_COLUMNS)?;
    let firms = str_values(df, "firm_id")?;
    let dates = date_values(df, "report_date")?;
    let total_assets = f64_values(df, "total_assets")?;
    let long_term_debt = optional_f64_values(df, "long_term_debt")?;
    let current_debt = optional_f64_values(df, "current_debt")?;
    let revenue = optional_f64_values(df, "revenue")?;
    let cogs = optional_f64_values(df, "cost_of_goods_sold")?;
    let sga = optional_f64_values(df, "sga")?;
    let roa = optional_f64_values(df, "return_on_assets")?;

    (0..df.height())
        .map(|i| {
            Ok(FundamentalRecord {
                firm_id: required(firms[i].clone(), "firm_id", i)?,
                report_date: required(dates[i], "report_date", i)?,
                total_assets: total_assets[i],
                long_term_debt: long_term_debt[i],
                current_debt: current_debt[i],
                revenue: revenue[i],
                cost_of_goods_sold: cogs[i],
                sga: sga[i],
                return_on_assets: roa[i],
            })
        })
        .collect()
}

/// Convert a links frame into records. A null `link_end` means open-ended.
pub fn links_from_frame(df: &DataFrame) -> Result<Vec<LinkRecord>> {
    require_columns(df, LINK_COLUMNS)?;
    let firms = str_values(df, "firm_id")?;
    let ids = i64_values(df, "security_id")?;
    let starts = date_values(df, "link_start")?;
    let ends = date_values(df, "link_end")?;

    (0..df.height())
        .map(|i| {
            Ok(LinkRecord {
                firm_id: required(firms[i].clone(), "firm_id", i)?,
                security_id: required(ids[i], "security_id", i)?,
                link_start: required(starts[i], "link_start", i)?,
                link_end: ends[i],
            })
        })
        .collect()
}

/// Build the per-security-month scored table.
pub fn scored_to_frame(rows: &[ScoredObservation]) -> Result<DataFrame> {
    let link_start = rows
        .iter()
        .map(|r| r.row.linked.link.map(|l| l.start));
    let link_end = rows
        .iter()
        .map(|r| r.row.linked.link.and_then(|l| l.end));
    let report_date = rows
        .iter()
        .map(|r| r.row.fundamental.as_ref().map(|f| f.report_date));

    let df = DataFrame::new(vec![
        Column::new(
            "security_id".into(),
            rows.iter()
                .map(|r| r.observation().security_id)
                .collect::<Vec<i64>>(),
        ),
        date_column("date", rows.iter().map(|r| Some(r.observation().date)))?,
        Column::new(
            "return".into(),
            rows.iter().map(|r| r.observation().ret).collect::<Vec<_>>(),
        ),
        Column::new(
            "firm_id".into(),
            rows.iter()
                .map(|r| r.row.linked.firm_id.clone())
                .collect::<Vec<Option<String>>>(),
        ),
        date_column("link_start", link_start)?,
        date_column("link_end", link_end)?,
        date_column("report_date", report_date)?,
        Column::new(
            "leverage".into(),
            rows.iter().map(|r| r.leverage).collect::<Vec<_>>(),
        ),
        Column::new(
            "volatility_lag".into(),
            rows.iter().map(|r| r.volatility_lag).collect::<Vec<_>>(),
        ),
        Column::new(
            "leverage_z".into(),
            rows.iter().map(|r| r.leverage_z).collect::<Vec<_>>(),
        ),
        Column::new(
            "volatility_z".into(),
            rows.iter().map(|r| r.volatility_z).collect::<Vec<_>>(),
        ),
        Column::new(
            "quality_score".into(),
            rows.iter().map(|r| r.quality_score).collect::<Vec<_>>(),
        ),
        Column::new(
            "quality_quintile".into(),
            rows.iter()
                .map(|r| r.quality_quintile.map(i32::from))
                .collect::<Vec<Option<i32>>>(),
        ),
    ])?;

    Ok(df)
}

/// Build the monthly portfolio-return table.
pub fn portfolios_to_frame(rows: &[PortfolioReturn]) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        date_column("month", rows.iter().map(|r| Some(r.month.end_date())))?,
        Column::new(
            "quintile".into(),
            rows.iter().map(|r| i32::from(r.quintile)).collect::<Vec<_>>(),
        ),
        Column::new(
            "mean_return".into(),
            rows.iter().map(|r| r.mean_return).collect::<Vec<_>>(),
        ),
        Column::new(
            "n_obs".into(),
            rows.iter().map(|r| r.n_obs as u64).collect::<Vec<_>>(),
        ),
    ])?;

    Ok(df)
}

/// Build the spread-series table.
pub fn spread_to_frame(rows: &[SpreadObservation]) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        date_column("month", rows.iter().map(|r| Some(r.month.end_date())))?,
        Column::new(
            "high_return".into(),
            rows.iter().map(|r| r.high_return).collect::<Vec<_>>(),
        ),
        Column::new(
            "low_return".into(),
            rows.iter().map(|r| r.low_return).collect::<Vec<_>>(),
        ),
        Column::new(
            "spread_return".into(),
            rows.iter().map(|r| r.spread_return).collect::<Vec<_>>(),
        ),
    ])?;

    Ok(df)
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|s| s.as_str() == name)
}

fn require_columns(df: &DataFrame, columns: &[&str]) -> Result<()> {
    for col in columns {
        if !has_column(df, col) {
            return Err(SagresError::MissingColumn((*col).to_string()));
        }
    }
    Ok(())
}

fn required<T>(value: Option<T>, column: &str, row: usize) -> Result<T> {
    value.ok_or_else(|| SagresError::InvalidData(format!("null {column} at row {row}")))
}

fn series<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|c| c.as_materialized_series())
        .map_err(|_| SagresError::MissingColumn(name.to_string()))
}

/// Cast a column, rejecting cells that are present but do not parse.
///
/// Blank strings count as nulls.
fn strict_values(df: &DataFrame, name: &str, dtype: &DataType) -> Result<Series> {
    let source = series(df, name)?;
    let source = if source.dtype() == &DataType::String {
        source
            .str()?
            .into_iter()
            .map(|v| v.map(str::trim).filter(|t| !t.is_empty()))
            .collect::<StringChunked>()
            .into_series()
    } else {
        source.clone()
    };

    let values = source.cast(dtype)?;
    if values.null_count() > source.null_count() {
        let lost = &source.is_not_null() & &values.is_null();
        let row = lost.into_iter().position(|v| v == Some(true)).unwrap_or(0);
        let cell = source.get(row).map(|v| v.to_string()).unwrap_or_default();
        return Err(SagresError::InvalidData(format!(
            "column {name} row {row}: cannot parse {cell} as {dtype}"
        )));
    }
    Ok(values)
}

fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let values = strict_values(df, name, &DataType::Float64)?;
    Ok(values
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect())
}

fn optional_f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    if has_column(df, name) {
        f64_values(df, name)
    } else {
        Ok(vec![None; df.height()])
    }
}

fn i64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let values = strict_values(df, name, &DataType::Int64)?;
    Ok(values.i64()?.into_iter().collect())
}

fn str_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let values = series(df, name)?.cast(&DataType::String)?;
    Ok(values
        .str()?
        .into_iter()
        .map(|v| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string))
        .collect())
}

fn date_values(df: &DataFrame, name: &str) -> Result<Vec<Option<Date>>> {
    let s = series(df, name)?;
    match s.dtype() {
        DataType::Date => {
            let days = s.cast(&DataType::Int32)?;
            Ok(days
                .i32()?
                .into_iter()
                .map(|d| d.and_then(|d| Date::from_num_days_from_ce_opt(d + CE_TO_UNIX_EPOCH_DAYS)))
                .collect())
        }
        DataType::String => s
            .str()?
            .into_iter()
            .map(|v| match v.map(str::trim) {
                None | Some("") => Ok(None),
                Some(text) => parse_date(text).map(Some),
            })
            .collect(),
        other => Err(SagresError::InvalidData(format!(
            "column {name} has unsupported date dtype {other}"
        ))),
    }
}

fn date_column(name: &str, dates: impl Iterator<Item = Option<Date>>) -> Result<Column> {
    let days: Vec<Option<i32>> = dates
        .map(|d| d.map(|d| d.num_days_from_ce() - CE_TO_UNIX_EPOCH_DAYS))
        .collect();
    Ok(Column::new(name.into(), days).cast(&DataType::Date)?)
}
