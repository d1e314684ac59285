//! Data-access seam.
//!
//! The pipeline never queries a database itself. A [`DataSource`] hands it the
//! three input tables for a date range once per run, and the tables are treated
//! as an immutable snapshot from then on.

use crate::{
    DateRange, FundamentalRecord, LinkRecord, Month, Result, ReturnObservation, SagresError,
    SecurityId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The three input tables of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputTables {
    /// Monthly security returns
    pub returns: Vec<ReturnObservation>,
    /// Firm fundamentals
    pub fundamentals: Vec<FundamentalRecord>,
    /// Security-to-firm link intervals
    pub links: Vec<LinkRecord>,
}

/// Sizes and key overlaps of a set of input tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityReport {
    /// Rows in the returns table
    pub n_returns: usize,
    /// Rows in the fundamentals table
    pub n_fundamentals: usize,
    /// Rows in the links table
    pub n_links: usize,
    /// Distinct securities with returns
    pub n_securities: usize,
    /// Securities present in both returns and links
    pub n_linked_securities: usize,
    /// Linked firms that also have fundamentals
    pub n_firms_with_fundamentals: usize,
}

impl InputTables {
    /// Bundle the three tables.
    #[must_use]
    pub const fn new(
        returns: Vec<ReturnObservation>,
        fundamentals: Vec<FundamentalRecord>,
        links: Vec<LinkRecord>,
    ) -> Self {
        Self {
            returns,
            fundamentals,
            links,
        }
    }

    /// Check that every table is non-empty and that the tables share keys.
    ///
    /// # Errors
    ///
    /// Returns [`SagresError::DataAvailability`] if any table is empty, if
    /// returns and links share no security identifiers, or if the linked firms
    /// have no fundamentals at all. Returns [`SagresError::InvalidData`] if a
    /// security has two returns in one month.
    pub fn check_availability(&self) -> Result<AvailabilityReport> {
        for (name, len) in [
            ("returns", self.returns.len()),
            ("fundamentals", self.fundamentals.len()),
            ("links", self.links.len()),
        ] {
            if len == 0 {
                return Err(SagresError::DataAvailability(format!(
                    "{name} table is empty"
                )));
            }
        }

        check_unique_security_months(&self.returns)?;

        let securities: HashSet<SecurityId> =
            self.returns.iter().map(|r| r.security_id).collect();
        let linked_firms: HashSet<&str> = self
            .links
            .iter()
            .filter(|l| securities.contains(&l.security_id))
            .map(|l| l.firm_id.as_str())
            .collect();
        let n_linked_securities = self
            .links
            .iter()
            .map(|l| l.security_id)
            .filter(|id| securities.contains(id))
            .collect::<HashSet<_>>()
            .len();

        if n_linked_securities == 0 {
            return Err(SagresError::DataAvailability(format!(
                "returns ({} securities) and links ({} rows) share no security identifiers",
                securities.len(),
                self.links.len()
            )));
        }

        let n_firms_with_fundamentals = self
            .fundamentals
            .iter()
            .map(|f| f.firm_id.as_str())
            .filter(|id| linked_firms.contains(id))
            .collect::<HashSet<_>>()
            .len();

        if n_firms_with_fundamentals == 0 {
            return Err(SagresError::DataAvailability(format!(
                "none of the {} linked firms has fundamentals",
                linked_firms.len()
            )));
        }

        Ok(AvailabilityReport {
            n_returns: self.returns.len(),
            n_fundamentals: self.fundamentals.len(),
            n_links: self.links.len(),
            n_securities: securities.len(),
            n_linked_securities,
            n_firms_with_fundamentals,
        })
    }
}

/// Reject a returns table holding more than one row per security and month.
///
/// # Errors
///
/// Returns [`SagresError::InvalidData`] naming the first repeated key.
pub fn check_unique_security_months(returns: &[ReturnObservation]) -> Result<()> {
    let mut seen: HashSet<(SecurityId, Month)> = HashSet::with_capacity(returns.len());
    for r in returns {
        if !seen.insert((r.security_id, r.month())) {
            return Err(SagresError::InvalidData(format!(
                "duplicate return for security {} in {}",
                r.security_id,
                r.month()
            )));
        }
    }
    Ok(())
}

/// Supplies the input tables for a date range.
///
/// Implementations own all query, credential and filtering concerns: returns
/// restricted to the range, fundamentals restricted to a single reporting
/// convention with positive total assets, and links restricted to
/// research-quality primary links active at some point within the range.
pub trait DataSource: Send + Sync {
    /// Name of the source, used in log messages.
    fn name(&self) -> &str;

    /// Load the three tables for `range`.
    ///
    /// # Errors
    ///
    /// Returns [`SagresError::DataFetch`] if the underlying store cannot be
    /// read, or a conversion error if a table is malformed.
    fn load(&self, range: DateRange) -> Result<InputTables>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Date;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd_opt(y, m, d).unwrap()
    }

    fn observation(security_id: SecurityId) -> ReturnObservation {
        ReturnObservation {
            security_id,
            date: date(2020, 1, 31),
            ret: Some(0.01),
            shares_outstanding: None,
            price: None,
        }
    }

    fn fundamental(firm_id: &str) -> FundamentalRecord {
        FundamentalRecord {
            firm_id: firm_id.to_string(),
            report_date: date(2018, 12, 31),
            total_assets: Some(100.0),
            long_term_debt: Some(10.0),
            current_debt: Some(5.0),
            revenue: None,
            cost_of_goods_sold: None,
            sga: None,
            return_on_assets: None,
        }
    }

    fn link(firm_id: &str, security_id: SecurityId) -> LinkRecord {
        LinkRecord {
            firm_id: firm_id.to_string(),
            security_id,
            link_start: date(2000, 1, 1),
            link_end: None,
        }
    }

    #[test]
    fn test_availability_ok() {
        let tables = InputTables::new(
            vec![observation(1), observation(2)],
            vec![fundamental("A")],
            vec![link("A", 1), link("B", 3)],
        );
        let report = tables.check_availability().unwrap();
        assert_eq!(report.n_securities, 2);
        assert_eq!(report.n_linked_securities, 1);
        assert_eq!(report.n_firms_with_fundamentals, 1);
    }

    #[test]
    fn test_empty_table_is_fatal() {
        let tables = InputTables::new(vec![observation(1)], vec![], vec![link("A", 1)]);
        let err = tables.check_availability().unwrap_err();
        assert!(matches!(err, SagresError::DataAvailability(msg) if msg.contains("fundamentals")));
    }

    #[test]
    fn test_disjoint_securities_is_fatal() {
        let tables = InputTables::new(
            vec![observation(1)],
            vec![fundamental("A")],
            vec![link("A", 2)],
        );
        assert!(matches!(
            tables.check_availability(),
            Err(SagresError::DataAvailability(_))
        ));
    }

    #[test]
    fn test_duplicate_security_month_is_invalid() {
        let mut repeated = observation(1);
        repeated.ret = Some(-0.02);
        let tables = InputTables::new(
            vec![observation(1), observation(2), repeated],
            vec![fundamental("A")],
            vec![link("A", 1)],
        );
        assert!(matches!(
            tables.check_availability(),
            Err(SagresError::InvalidData(msg)) if msg.contains("security 1 in 2020-01")
        ));
    }

    #[test]
    fn test_disjoint_firms_is_fatal() {
        let tables = InputTables::new(
            vec![observation(1)],
            vec![fundamental("Z")],
            vec![link("A", 1)],
        );
        assert!(matches!(
            tables.check_availability(),
            Err(SagresError::DataAvailability(msg)) if msg.contains("linked firms")
        ));
    }
}
