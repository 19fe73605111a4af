use crate::domain::model::DateRange;
use crate::utils::error::{FareError, Result};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::collections::BTreeSet;

/// Friday to Monday.
pub const WEEKEND_NIGHTS: u64 = 3;

const EXTRA_RANGES_FIELD: &str = "search.extra_ranges";

/// 將日期往後推到最近的星期五（本身是星期五則不變）；超出日期範圍時回傳 None
pub fn snap_to_friday(anchor: NaiveDate) -> Option<NaiveDate> {
    let offset = (Weekday::Fri.num_days_from_monday() + 7
        - anchor.weekday().num_days_from_monday())
        % 7;
    anchor.checked_add_days(Days::new(u64::from(offset)))
}

pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| FareError::DateParseError {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Parses configured `(departure, return)` literals. Any bad entry fails the whole set.
pub fn parse_extra_ranges(literals: &[(String, String)]) -> Result<Vec<DateRange>> {
    literals
        .iter()
        .map(|(departure, return_date)| {
            let departure = parse_date(EXTRA_RANGES_FIELD, departure)?;
            let return_date = parse_date(EXTRA_RANGES_FIELD, return_date)?;
            DateRange::new(departure, return_date).map_err(|_| {
                FareError::InvalidConfigValueError {
                    field: EXTRA_RANGES_FIELD.to_string(),
                    value: format!("{} -> {}", departure, return_date),
                    reason: "Return date must be after the departure date".to_string(),
                }
            })
        })
        .collect()
}

pub fn generate(
    anchor: NaiveDate,
    interval_days: u32,
    count: u32,
    extra_ranges: &[DateRange],
) -> Vec<DateRange> {
    let mut ranges = BTreeSet::new();

    let mut next = snap_to_friday(anchor);
    for _ in 0..count {
        // stop once the calendar runs out
        let Some(friday) = next else { break };
        let Some(monday) = friday.checked_add_days(Days::new(WEEKEND_NIGHTS)) else {
            break;
        };
        if let Ok(range) = DateRange::new(friday, monday) {
            ranges.insert(range);
        }
        next = friday.checked_add_days(Days::new(u64::from(interval_days)));
    }

    ranges.extend(extra_ranges.iter().copied());
    ranges.into_iter().collect()
}

#[derive(Debug, Clone)]
pub struct DateRangeGenerator {
    anchor: NaiveDate,
    interval_days: u32,
    count: u32,
    extra_ranges: Vec<DateRange>,
}

impl DateRangeGenerator {
    pub fn new(
        anchor: NaiveDate,
        interval_days: u32,
        count: u32,
        extra_ranges: Vec<DateRange>,
    ) -> Self {
        Self {
            anchor,
            interval_days,
            count,
            extra_ranges,
        }
    }

    pub fn generate(&self) -> Vec<DateRange> {
        generate(self.anchor, self.interval_days, self.count, &self.extra_ranges)
    }
}
