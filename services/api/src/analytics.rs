//! Calendar helpers and collection counts for the admin dashboard

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::CollectionRecord;

/// Midnight UTC of the day containing `at`
pub fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&at.date_naive().and_time(NaiveTime::MIN))
}

/// Midnight UTC of the first day of the month containing `at`
pub fn start_of_month(at: DateTime<Utc>) -> DateTime<Utc> {
    let day = start_of_day(at);
    day - Duration::days(i64::from(at.day0()))
}

/// Records counted for one weekday or day of month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayCount {
    /// Weekday from 1 (Sunday) to 7 (Saturday), or day of month
    pub day: u32,
    pub total: usize,
}

impl DayCount {
    pub fn new(day: u32, total: usize) -> Self {
        Self { day, total }
    }
}

fn buckets(counts: BTreeMap<u32, usize>) -> Vec<DayCount> {
    counts
        .into_iter()
        .map(|(day, total)| DayCount::new(day, total))
        .collect()
}

/// Collection counts relative to a moment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    /// Records dated today
    pub daily_schedules: usize,
    /// Records from the last seven days per weekday. Empty weekdays are
    /// left out.
    pub weekly_schedules: Vec<DayCount>,
    /// Records this month per day of month. Empty days are left out.
    pub monthly_schedules: Vec<DayCount>,
}

/// Earliest collection date [`summarize`] looks at
pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    start_of_month(now).min(now - Duration::days(7))
}

pub fn summarize(records: &[CollectionRecord], now: DateTime<Utc>) -> Analytics {
    let today = start_of_day(now);
    let tomorrow = today + Duration::days(1);
    let week_ago = now - Duration::days(7);
    let month = start_of_month(now);

    let mut weekly = BTreeMap::new();
    let mut monthly = BTreeMap::new();
    let mut daily = 0;

    for record in records {
        let date = record.collection_date;
        if date >= today && date < tomorrow {
            daily += 1;
        }
        if date >= week_ago {
            *weekly
                .entry(date.weekday().number_from_sunday())
                .or_insert(0) += 1;
        }
        if date >= month {
            *monthly.entry(date.day()).or_insert(0) += 1;
        }
    }

    Analytics {
        daily_schedules: daily,
        weekly_schedules: buckets(weekly),
        monthly_schedules: buckets(monthly),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WasteCategory;
    use uuid::Uuid;

    fn dated(at: DateTime<Utc>) -> CollectionRecord {
        CollectionRecord::new(Uuid::new_v4(), "Jaffna".into(), WasteCategory::Other, 1.0, Some(at))
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn calendar_boundaries() {
        let now = at(2026, 3, 18, 15);
        assert_eq!(start_of_day(now), at(2026, 3, 18, 0));
        assert_eq!(start_of_month(now), at(2026, 3, 1, 0));
        assert_eq!(window_start(at(2026, 3, 3, 12)), at(2026, 2, 24, 12));
    }

    #[test]
    fn counts_by_day_week_and_month() {
        // Wednesday
        let now = at(2026, 3, 18, 15);
        let records = vec![
            dated(at(2026, 3, 18, 8)),
            dated(at(2026, 3, 18, 9)),
            // Sunday
            dated(at(2026, 3, 15, 9)),
            // outside the week, inside the month
            dated(at(2026, 3, 2, 9)),
            // previous month
            dated(at(2026, 2, 27, 9)),
        ];

        let analytics = summarize(&records, now);
        assert_eq!(analytics.daily_schedules, 2);
        assert_eq!(
            analytics.weekly_schedules,
            vec![DayCount::new(1, 1), DayCount::new(4, 2)]
        );
        assert_eq!(
            analytics.monthly_schedules,
            vec![DayCount::new(2, 1), DayCount::new(15, 1), DayCount::new(18, 2)]
        );
    }

    #[test]
    fn buckets_serialize_with_their_day() {
        let now = at(2026, 3, 18, 15);
        let analytics = summarize(&[dated(at(2026, 3, 14, 9))], now);

        let json = serde_json::to_value(&analytics).unwrap();
        assert_eq!(json["dailySchedules"], 0);
        assert_eq!(json["weeklySchedules"], serde_json::json!([{"day": 7, "total": 1}]));
        assert_eq!(json["monthlySchedules"], serde_json::json!([{"day": 14, "total": 1}]));
    }

    #[test]
    fn empty_input_yields_zero_and_empty_buckets() {
        let analytics = summarize(&[], Utc::now());
        assert_eq!(analytics.daily_schedules, 0);
        assert!(analytics.weekly_schedules.is_empty());
        assert!(analytics.monthly_schedules.is_empty());
    }
}
