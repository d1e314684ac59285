//! Identifier Linker.
//!
//! Resolves the time-varying many-to-one mapping from securities to firms.
//! Each security's link intervals are sorted by start date once; every return
//! date is then matched to the most recently started interval that is still
//! active on that date.

use crate::{asof::backward_position, parallel::map_groups};
use sagres_traits::{
    Date, FirmId, LinkInterval, LinkRecord, LinkedReturn, Result, ReturnObservation, SagresError,
    SecurityId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// A firm attribution valid over an interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    /// Firm the security is attributed to
    pub firm_id: FirmId,
    /// Validity interval
    pub interval: LinkInterval,
}

/// Counts describing one linking pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStats {
    /// Return rows processed
    pub n_rows: usize,
    /// Rows resolved to a firm
    pub n_linked: usize,
    /// Securities with at least one usable link
    pub n_securities: usize,
    /// Link records dropped because another record for the same security
    /// shares their start date
    pub n_conflicts: usize,
    /// Pairs of consecutive intervals for one security that overlap
    pub n_overlaps: usize,
}

/// Output of [`IdentifierLinker::link`].
#[derive(Debug, Clone, PartialEq)]
pub struct LinkOutcome {
    /// One row per input observation, ordered by security then date
    pub rows: Vec<LinkedReturn>,
    /// Pass statistics
    pub stats: LinkStats,
}

/// Per-security link index with backward as-of resolution.
///
/// # Example
///
/// ```
/// use sagres_panel::IdentifierLinker;
/// use sagres_traits::{Date, LinkRecord};
///
/// let d = |y, m, day| Date::from_ymd_opt(y, m, day).unwrap();
/// let linker = IdentifierLinker::new(&[
///     LinkRecord { firm_id: "A".into(), security_id: 1, link_start: d(2000, 1, 1), link_end: Some(d(2009, 12, 31)) },
///     LinkRecord { firm_id: "B".into(), security_id: 1, link_start: d(2010, 1, 1), link_end: None },
/// ]);
///
/// assert_eq!(linker.resolve(1, d(2005, 6, 30)).map(|e| e.firm_id.as_str()), Some("A"));
/// assert_eq!(linker.resolve(1, d(2015, 6, 30)).map(|e| e.firm_id.as_str()), Some("B"));
/// assert!(linker.resolve(1, d(1999, 6, 30)).is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct IdentifierLinker {
    index: BTreeMap<SecurityId, Vec<LinkEntry>>,
    n_conflicts: usize,
    n_overlaps: usize,
}

impl IdentifierLinker {
    /// Build the index from raw link records.
    ///
    /// Intervals sharing a start date for the same security are a data-quality
    /// fault: the one with the latest end date (open-ended counts as latest) is
    /// kept and the conflict is logged.
    pub fn new(links: &[LinkRecord]) -> Self {
        let mut grouped: BTreeMap<SecurityId, Vec<LinkEntry>> = BTreeMap::new();
        for link in links {
            grouped.entry(link.security_id).or_default().push(LinkEntry {
                firm_id: link.firm_id.clone(),
                interval: link.interval(),
            });
        }

        let mut n_conflicts = 0;
        let mut n_overlaps = 0;
        for (security_id, entries) in &mut grouped {
            entries.sort_by(|a, b| {
                a.interval
                    .start
                    .cmp(&b.interval.start)
                    .then_with(|| end_key(&a.interval).cmp(&end_key(&b.interval)))
                    .then_with(|| a.firm_id.cmp(&b.firm_id))
            });

            let before = entries.len();
            // Sorted by end ascending, so the last of a start-date run has the latest end.
            let mut kept: Vec<LinkEntry> = Vec::with_capacity(before);
            for entry in entries.drain(..) {
                match kept.last_mut() {
                    Some(prev) if prev.interval.start == entry.interval.start => {
                        warn!(
                            security_id = *security_id,
                            start = %entry.interval.start,
                            dropped_firm = %prev.firm_id,
                            kept_firm = %entry.firm_id,
                            "link intervals share a start date; keeping the latest end"
                        );
                        *prev = entry;
                    }
                    _ => kept.push(entry),
                }
            }
            n_conflicts += before - kept.len();

            for pair in kept.windows(2) {
                if pair[0].interval.end.is_none_or(|end| end >= pair[1].interval.start) {
                    debug!(
                        security_id = *security_id,
                        first_firm = %pair[0].firm_id,
                        second_firm = %pair[1].firm_id,
                        second_start = %pair[1].interval.start,
                        "overlapping link intervals"
                    );
                    n_overlaps += 1;
                }
            }
            *entries = kept;
        }

        if n_overlaps > 0 {
            warn!(n_overlaps, "link table has overlapping intervals; latest start wins");
        }

        Self {
            index: grouped,
            n_conflicts,
            n_overlaps,
        }
    }

    /// Number of securities with at least one link.
    #[must_use]
    pub fn n_securities(&self) -> usize {
        self.index.len()
    }

    /// Sorted link entries of one security.
    pub fn entries(&self, security_id: SecurityId) -> &[LinkEntry] {
        self.index.get(&security_id).map_or(&[], Vec::as_slice)
    }

    /// The link active for `security_id` on `date`, if any.
    ///
    /// Among intervals covering the date, the one with the latest start wins.
    pub fn resolve(&self, security_id: SecurityId, date: Date) -> Option<&LinkEntry> {
        let entries = self.entries(security_id);
        let last_started = backward_position(entries, &date, |e| e.interval.start)?;
        entries[..=last_started]
            .iter()
            .rev()
            .find(|e| e.interval.covers(date))
    }

    /// Attach the active firm to every return observation.
    ///
    /// Observations no interval covers are kept with a null firm. Output rows
    /// are ordered by security, then date.
    ///
    /// # Errors
    ///
    /// Returns [`SagresError::JoinEmpty`] if no observation links to a firm.
    pub fn link(&self, returns: &[ReturnObservation]) -> Result<LinkOutcome> {
        let per_security = map_groups(
            returns,
            |r| r.security_id,
            |&security_id, positions| {
                let mut rows: Vec<&ReturnObservation> =
                    positions.iter().map(|&i| &returns[i]).collect();
                rows.sort_by_key(|r| r.date);
                rows.into_iter()
                    .map(|observation| {
                        let matched = self.resolve(security_id, observation.date);
                        LinkedReturn {
                            observation: observation.clone(),
                            firm_id: matched.map(|e| e.firm_id.clone()),
                            link: matched.map(|e| e.interval),
                        }
                    })
                    .collect::<Vec<_>>()
            },
        );

        let mut n_securities = 0;
        let rows: Vec<LinkedReturn> = per_security
            .into_iter()
            .flat_map(|(security_id, rows)| {
                if self.index.contains_key(&security_id) {
                    n_securities += 1;
                }
                rows
            })
            .collect();

        let stats = LinkStats {
            n_rows: rows.len(),
            n_linked: rows.iter().filter(|r| r.firm_id.is_some()).count(),
            n_securities,
            n_conflicts: self.n_conflicts,
            n_overlaps: self.n_overlaps,
        };

        if stats.n_linked == 0 {
            return Err(SagresError::JoinEmpty(format!(
                "none of {} return observations falls inside a link interval",
                stats.n_rows
            )));
        }

        info!(
            rows = stats.n_rows,
            linked = stats.n_linked,
            securities = stats.n_securities,
            "linked returns to firms"
        );

        Ok(LinkOutcome { rows, stats })
    }
}

fn end_key(interval: &LinkInterval) -> Date {
    interval.end.unwrap_or(Date::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd_opt(y, m, d).unwrap()
    }

    fn link(firm: &str, security_id: SecurityId, start: Date, end: Option<Date>) -> LinkRecord {
        LinkRecord {
            firm_id: firm.to_string(),
            security_id,
            link_start: start,
            link_end: end,
        }
    }

    fn obs(security_id: SecurityId, d: Date) -> ReturnObservation {
        ReturnObservation {
            security_id,
            date: d,
            ret: Some(0.01),
            shares_outstanding: None,
            price: None,
        }
    }

    #[test]
    fn test_resolve_sequential_links() {
        let linker = IdentifierLinker::new(&[
            link("B", 1, date(2010, 1, 1), None),
            link("A", 1, date(2000, 1, 1), Some(date(2009, 12, 31))),
        ]);
        assert_eq!(linker.resolve(1, date(2009, 12, 31)).unwrap().firm_id, "A");
        assert_eq!(linker.resolve(1, date(2010, 1, 1)).unwrap().firm_id, "B");
        assert!(linker.resolve(2, date(2010, 1, 1)).is_none());
    }

    #[test]
    fn test_gap_between_links_is_unlinked() {
        let linker = IdentifierLinker::new(&[
            link("A", 1, date(2000, 1, 1), Some(date(2004, 12, 31))),
            link("B", 1, date(2006, 1, 1), None),
        ]);
        assert!(linker.resolve(1, date(2005, 6, 30)).is_none());
    }

    #[test]
    fn test_same_start_prefers_latest_end() {
        let linker = IdentifierLinker::new(&[
            link("OPEN", 1, date(2000, 1, 1), None),
            link("SHORT", 1, date(2000, 1, 1), Some(date(2001, 12, 31))),
        ]);
        assert_eq!(linker.entries(1).len(), 1);
        assert_eq!(linker.resolve(1, date(2000, 6, 30)).unwrap().firm_id, "OPEN");

        let outcome = linker.link(&[obs(1, date(2000, 6, 30))]).unwrap();
        assert_eq!(outcome.stats.n_conflicts, 1);
    }

    #[test]
    fn test_overlap_falls_back_to_earlier_active_interval() {
        // The later interval has ended; the earlier open one still covers the date.
        let linker = IdentifierLinker::new(&[
            link("A", 1, date(2000, 1, 1), None),
            link("B", 1, date(2005, 1, 1), Some(date(2006, 12, 31))),
        ]);
        assert_eq!(linker.resolve(1, date(2005, 6, 30)).unwrap().firm_id, "B");
        assert_eq!(linker.resolve(1, date(2008, 6, 30)).unwrap().firm_id, "A");
        let outcome = linker.link(&[obs(1, date(2008, 6, 30))]).unwrap();
        assert_eq!(outcome.stats.n_overlaps, 1);
    }

    #[test]
    fn test_link_keeps_unlinked_rows_sorted() {
        let linker = IdentifierLinker::new(&[link("A", 1, date(2000, 1, 1), None)]);
        let outcome = linker
            .link(&[
                obs(2, date(2001, 1, 31)),
                obs(1, date(2001, 2, 28)),
                obs(1, date(2001, 1, 31)),
            ])
            .unwrap();

        let keys: Vec<_> = outcome
            .rows
            .iter()
            .map(|r| (r.observation.security_id, r.observation.date))
            .collect();
        assert_eq!(
            keys,
            vec![(1, date(2001, 1, 31)), (1, date(2001, 2, 28)), (2, date(2001, 1, 31))]
        );
        assert_eq!(outcome.rows[2].firm_id, None);
        assert_eq!(outcome.stats.n_linked, 2);
        assert_eq!(outcome.stats.n_securities, 1);
    }

    #[test]
    fn test_matched_interval_covers_date() {
        let links = [
            link("A", 1, date(2000, 1, 1), Some(date(2003, 6, 30))),
            link("B", 1, date(2003, 1, 1), Some(date(2008, 12, 31))),
            link("C", 1, date(2009, 3, 1), None),
        ];
        let linker = IdentifierLinker::new(&links);
        let returns: Vec<_> = (1999..2012)
            .flat_map(|y| (1..=12).map(move |m| obs(1, sagres_traits::month_end(date(y, m, 1)))))
            .collect();
        let outcome = linker.link(&returns).unwrap();

        for row in &outcome.rows {
            let d = row.observation.date;
            if let Some(interval) = row.link {
                assert!(interval.covers(d));
                // no later-started interval also covers the date
                assert!(
                    links
                        .iter()
                        .filter(|l| l.link_start > interval.start)
                        .all(|l| !l.interval().covers(d))
                );
            } else {
                assert!(links.iter().all(|l| !l.interval().covers(d)));
            }
        }
    }

    #[test]
    fn test_no_links_is_join_empty() {
        let linker = IdentifierLinker::new(&[link("A", 9, date(2000, 1, 1), None)]);
        let err = linker.link(&[obs(1, date(2001, 1, 31))]).unwrap_err();
        assert!(matches!(err, SagresError::JoinEmpty(_)));
    }
}
