//! Record types flowing through the Sagres pipeline.
//!
//! Every stage consumes the records of its predecessor and extends them:
//! [`ReturnObservation`] → [`LinkedReturn`] → [`MergedObservation`] →
//! [`ScoredObservation`], then the monthly [`PortfolioReturn`] and
//! [`SpreadObservation`] tables.

use chrono::{Datelike, Months};
use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// Days between 0001-01-01 (CE) and the Unix epoch, for polars `Date` columns.
pub const CE_TO_UNIX_EPOCH_DAYS: i32 = 719_163;

/// Security identifier (a stable code for a tradable instrument).
pub type SecurityId = i64;

/// Firm identifier (the reporting corporate entity).
pub type FirmId = String;

/// A calendar month, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    /// The month containing `date`.
    pub fn from_date(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Calendar year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Month of year, 1 through 12.
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Last calendar day of the month.
    pub fn end_date(&self) -> Date {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        Date::from_ymd_opt(year, month, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or(Date::MAX)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Truncate a date to the last day of its month.
pub fn month_end(date: Date) -> Date {
    Month::from_date(date).end_date()
}

/// Shift a date back by whole calendar months, clamping to month end.
///
/// Returns `None` only when the result would precede the representable range.
pub fn months_before(date: Date, months: u32) -> Option<Date> {
    date.checked_sub_months(Months::new(months))
}

/// An inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First date in the range.
    pub start: Date,
    /// Last date in the range.
    pub end: Date,
}

impl DateRange {
    /// Create a new range. Ordering is checked by `PipelineConfig::validate`.
    #[must_use]
    pub const fn new(start: Date, end: Date) -> Self {
        Self { start, end }
    }

    /// Whether `date` falls within the range.
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    /// Whether an interval (open-ended when `end` is `None`) overlaps the range.
    pub fn overlaps(&self, start: Date, end: Option<Date>) -> bool {
        start <= self.end && end.is_none_or(|e| e >= self.start)
    }
}

/// One monthly return for one security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnObservation {
    /// Security identifier
    pub security_id: SecurityId,
    /// Month-end date
    pub date: Date,
    /// Monthly total return
    #[serde(rename = "return")]
    pub ret: Option<f64>,
    /// Shares outstanding
    pub shares_outstanding: Option<f64>,
    /// Price at month end
    pub price: Option<f64>,
}

impl ReturnObservation {
    /// The month this observation belongs to.
    pub fn month(&self) -> Month {
        Month::from_date(self.date)
    }
}

/// One fundamentals report for one firm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalRecord {
    /// Firm identifier
    pub firm_id: FirmId,
    /// Effective date of the report
    pub report_date: Date,
    /// Total assets
    pub total_assets: Option<f64>,
    /// Long-term debt
    pub long_term_debt: Option<f64>,
    /// Debt in current liabilities
    pub current_debt: Option<f64>,
    /// Revenue
    pub revenue: Option<f64>,
    /// Cost of goods sold
    pub cost_of_goods_sold: Option<f64>,
    /// Selling, general and administrative expense
    pub sga: Option<f64>,
    /// Return on assets
    pub return_on_assets: Option<f64>,
}

impl FundamentalRecord {
    /// Long-term plus current debt, `None` if either is missing.
    pub fn total_debt(&self) -> Option<f64> {
        Some(self.long_term_debt? + self.current_debt?)
    }
}

/// A validity interval attributing a security to a firm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Firm identifier
    pub firm_id: FirmId,
    /// Security identifier
    pub security_id: SecurityId,
    /// First date of the link
    pub link_start: Date,
    /// Last date of the link, `None` when still active
    pub link_end: Option<Date>,
}

impl LinkRecord {
    /// The interval this link covers.
    pub fn interval(&self) -> LinkInterval {
        LinkInterval {
            start: self.link_start,
            end: self.link_end,
        }
    }
}

/// Start and (optional) end of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkInterval {
    /// First date covered
    pub start: Date,
    /// Last date covered, `None` when open-ended
    pub end: Option<Date>,
}

impl LinkInterval {
    /// Whether the interval covers `date` (both ends inclusive).
    pub fn covers(&self, date: Date) -> bool {
        self.start <= date && self.end.is_none_or(|end| date <= end)
    }
}

/// A return observation with its resolved firm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedReturn {
    /// The underlying return observation
    pub observation: ReturnObservation,
    /// Firm valid at the observation date, if any link covers it
    pub firm_id: Option<FirmId>,
    /// The matched link interval
    pub link: Option<LinkInterval>,
}

/// A linked return with the fundamentals available one year earlier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedObservation {
    /// The linked return
    pub linked: LinkedReturn,
    /// Most recent fundamentals reported at least the configured lag before the date
    pub fundamental: Option<FundamentalRecord>,
}

impl MergedObservation {
    /// Shorthand for the underlying return observation.
    pub const fn observation(&self) -> &ReturnObservation {
        &self.linked.observation
    }
}

/// A merged observation with its quality score and bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredObservation {
    /// The merged panel row
    pub row: MergedObservation,
    /// Total debt over total assets
    pub leverage: Option<f64>,
    /// Trailing return volatility, lagged one month
    pub volatility_lag: Option<f64>,
    /// Panel-wide z-score of leverage
    pub leverage_z: Option<f64>,
    /// Panel-wide z-score of lagged volatility
    pub volatility_z: Option<f64>,
    /// Inverted composite of the two z-scores
    pub quality_score: Option<f64>,
    /// Bucket within the month, 1 (lowest score) to 5 (highest)
    pub quality_quintile: Option<u8>,
}

impl ScoredObservation {
    /// Shorthand for the underlying return observation.
    pub const fn observation(&self) -> &ReturnObservation {
        &self.row.linked.observation
    }
}

/// Equal-weighted return of one quintile portfolio in one month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReturn {
    /// Holding month
    pub month: Month,
    /// Quintile bucket
    pub quintile: u8,
    /// Mean of the non-null member returns
    pub mean_return: f64,
    /// Number of non-null member returns
    pub n_obs: usize,
}

/// High-minus-low quintile spread for one month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadObservation {
    /// Holding month
    pub month: Month,
    /// Quintile 5 mean return
    pub high_return: f64,
    /// Quintile 1 mean return
    pub low_return: f64,
    /// `high_return - low_return`
    pub spread_return: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_end() {
        assert_eq!(month_end(date(2020, 2, 3)), date(2020, 2, 29));
        assert_eq!(month_end(date(2021, 2, 3)), date(2021, 2, 28));
        assert_eq!(month_end(date(2021, 12, 15)), date(2021, 12, 31));
    }

    #[test]
    fn test_month_ordering_and_display() {
        let a = Month::from_date(date(2020, 12, 31));
        let b = Month::from_date(date(2021, 1, 1));
        assert!(a < b);
        assert_eq!(a.to_string(), "2020-12");
        assert_eq!(b.year(), 2021);
        assert_eq!(b.month(), 1);
    }

    #[test]
    fn test_months_before_clamps() {
        assert_eq!(months_before(date(2021, 3, 31), 12), Some(date(2020, 3, 31)));
        assert_eq!(months_before(date(2020, 2, 29), 12), Some(date(2019, 2, 28)));
    }

    #[test]
    fn test_link_interval_covers() {
        let closed = LinkInterval {
            start: date(2000, 1, 1),
            end: Some(date(2005, 12, 31)),
        };
        assert!(closed.covers(date(2000, 1, 1)));
        assert!(closed.covers(date(2005, 12, 31)));
        assert!(!closed.covers(date(2006, 1, 31)));
        assert!(!closed.covers(date(1999, 12, 31)));

        let open = LinkInterval {
            start: date(2000, 1, 1),
            end: None,
        };
        assert!(open.covers(date(2030, 1, 1)));
    }

    #[test]
    fn test_date_range_overlaps() {
        let range = DateRange::new(date(2010, 1, 1), date(2015, 12, 31));
        assert!(range.overlaps(date(2005, 1, 1), None));
        assert!(range.overlaps(date(2005, 1, 1), Some(date(2010, 1, 1))));
        assert!(!range.overlaps(date(2005, 1, 1), Some(date(2009, 12, 31))));
        assert!(!range.overlaps(date(2016, 1, 1), None));
        assert!(range.contains(date(2015, 12, 31)));
    }

    #[test]
    fn test_total_debt_propagates_null() {
        let mut record = FundamentalRecord {
            firm_id: "001690".to_string(),
            report_date: date(2019, 12, 31),
            total_assets: Some(100.0),
            long_term_debt: Some(20.0),
            current_debt: Some(5.0),
            revenue: None,
            cost_of_goods_sold: None,
            sga: None,
            return_on_assets: None,
        };
        assert_eq!(record.total_debt(), Some(25.0));
        record.current_debt = None;
        assert_eq!(record.total_debt(), None);
    }
}
