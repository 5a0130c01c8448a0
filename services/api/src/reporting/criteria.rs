//! Report periods and per-category totals
//!
//! Criteria formats by report type:
//! - monthly: `YYYY-MM`
//! - annual: `YYYY`
//! - custom: `YYYY-MM-DD,YYYY-MM-DD`, both ends inclusive

use chrono::{DateTime, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use common::{ServiceError, ServiceResult};
use std::collections::BTreeMap;

use crate::models::{CollectionRecord, ReportRow, ReportType, WasteCategory};

/// A half-open range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPeriod {
    pub first_day: NaiveDate,
    /// First day after the period
    pub end: NaiveDate,
}

fn invalid(report_type: ReportType, criteria: &str) -> ServiceError {
    let expected = match report_type {
        ReportType::Monthly => "YYYY-MM",
        ReportType::Annual => "YYYY",
        ReportType::Custom => "YYYY-MM-DD,YYYY-MM-DD",
    };
    ServiceError::validation(format!(
        "Invalid criteria '{}' for {} report, expected {}",
        criteria, report_type, expected
    ))
}

fn parse_day(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

impl ReportPeriod {
    pub fn parse(report_type: ReportType, criteria: &str) -> ServiceResult<Self> {
        let criteria = criteria.trim();
        let fail = || invalid(report_type, criteria);

        let (first_day, end) = match report_type {
            ReportType::Monthly => {
                let first_day = parse_day(&format!("{}-01", criteria)).ok_or_else(fail)?;
                // Reject forms like "2026-3" that the day parser tolerates
                if criteria.len() != 7 {
                    return Err(fail());
                }
                let end = first_day
                    .checked_add_months(Months::new(1))
                    .ok_or_else(fail)?;
                (first_day, end)
            }
            ReportType::Annual => {
                if criteria.len() != 4 || !criteria.chars().all(|c| c.is_ascii_digit()) {
                    return Err(fail());
                }
                let year: i32 = criteria.parse().map_err(|_| fail())?;
                let first_day = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(fail)?;
                let end = NaiveDate::from_ymd_opt(year + 1, 1, 1).ok_or_else(fail)?;
                (first_day, end)
            }
            ReportType::Custom => {
                let (from, to) = criteria.split_once(',').ok_or_else(fail)?;
                let first_day = parse_day(from).ok_or_else(fail)?;
                let last_day = parse_day(to).ok_or_else(fail)?;
                if last_day < first_day {
                    return Err(ServiceError::validation(
                        "Report end date is before its start date",
                    ));
                }
                (first_day, last_day.succ_opt().ok_or_else(fail)?)
            }
        };

        Ok(Self { first_day, end })
    }

    pub fn start_utc(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.first_day.and_time(NaiveTime::MIN))
    }

    pub fn end_utc(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.end.and_time(NaiveTime::MIN))
    }
}

/// Quantity and count per waste category, in category order. Categories
/// without records are left out.
pub fn aggregate(records: &[CollectionRecord]) -> Vec<ReportRow> {
    let mut totals: BTreeMap<WasteCategory, (f64, i64)> = BTreeMap::new();
    for record in records {
        let entry = totals.entry(record.waste_type).or_default();
        entry.0 += record.quantity;
        entry.1 += 1;
    }

    totals
        .into_iter()
        .map(|(waste_type, (total_quantity, total_collections))| ReportRow {
            waste_type,
            total_quantity,
            total_collections,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn monthly_covers_the_calendar_month() {
        let period = ReportPeriod::parse(ReportType::Monthly, "2026-12").unwrap();
        assert_eq!(period.first_day, day(2026, 12, 1));
        assert_eq!(period.end, day(2027, 1, 1));
    }

    #[test]
    fn annual_and_custom_bounds() {
        let annual = ReportPeriod::parse(ReportType::Annual, "2025").unwrap();
        assert_eq!((annual.first_day, annual.end), (day(2025, 1, 1), day(2026, 1, 1)));

        let custom = ReportPeriod::parse(ReportType::Custom, "2026-02-10, 2026-02-12").unwrap();
        assert_eq!((custom.first_day, custom.end), (day(2026, 2, 10), day(2026, 2, 13)));
    }

    #[test]
    fn malformed_criteria_are_rejected() {
        for (report_type, criteria) in [
            (ReportType::Monthly, "2026"),
            (ReportType::Monthly, "2026-13"),
            (ReportType::Monthly, "2026-3"),
            (ReportType::Annual, "26"),
            (ReportType::Annual, "2026-01"),
            (ReportType::Custom, "2026-02-10"),
            (ReportType::Custom, "2026-02-12,2026-02-10"),
        ] {
            let err = ReportPeriod::parse(report_type, criteria).unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "{criteria}");
        }
    }

    #[test]
    fn aggregates_by_category() {
        let creator = Uuid::new_v4();
        let records = vec![
            CollectionRecord::new(creator, "A".into(), WasteCategory::Plastic, 2.0, None),
            CollectionRecord::new(creator, "B".into(), WasteCategory::Organic, 5.0, None),
            CollectionRecord::new(creator, "C".into(), WasteCategory::Plastic, 1.5, None),
        ];

        let rows = aggregate(&records);
        assert_eq!(
            rows,
            vec![
                ReportRow {
                    waste_type: WasteCategory::Organic,
                    total_quantity: 5.0,
                    total_collections: 1,
                },
                ReportRow {
                    waste_type: WasteCategory::Plastic,
                    total_quantity: 3.5,
                    total_collections: 2,
                },
            ]
        );
    }
}
