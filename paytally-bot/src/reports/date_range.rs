//! Turns a report period plus "now" into concrete local-day or local-month
//! boundaries in the reporting time zone.

use crate::reports::callback::ReportPeriod;
use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use shared_types::{ReportError, ReportFilter};

const DAY_FORMAT: &str = "%d-%m-%Y";
const MONTH_FORMAT: &str = "%B %Y";

/// A resolved report interval. `end` is the last nanosecond that belongs to
/// the range, so the range equals the half-open `[start, end + 1ns)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRange {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    /// Header text for the rendered report
    pub label: String,
    /// The local day, for single-day periods
    pub anchor: Option<NaiveDate>,
}

impl ResolvedRange {
    pub fn end_exclusive(&self) -> DateTime<Tz> {
        self.end + Duration::nanoseconds(1)
    }

    /// Half-open UTC bounds used against stored timestamps
    pub fn utc_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            self.start.with_timezone(&Utc),
            self.end_exclusive().with_timezone(&Utc),
        )
    }

    pub fn to_filter(&self, group_id: i64) -> ReportFilter {
        match self.anchor {
            Some(day) => ReportFilter::as_of(group_id, day),
            None => {
                let (start, end) = self.utc_bounds();
                ReportFilter::between(group_id, start, end)
            }
        }
    }
}

/// Midnight at the start of `date` in `tz`.
pub fn local_midnight(tz: Tz, date: NaiveDate) -> Result<DateTime<Tz>, ReportError> {
    tz.from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .ok_or_else(|| ReportError::InvalidRange(format!("{date} has no local midnight in {tz}")))
}

fn next_day(date: NaiveDate) -> Result<NaiveDate, ReportError> {
    date.checked_add_days(Days::new(1))
        .ok_or_else(|| ReportError::InvalidRange(format!("{date} is out of range")))
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn first_of_next_month(first: NaiveDate) -> Result<NaiveDate, ReportError> {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ReportError::InvalidRange(format!("no month after {first}")))
}

fn first_of_previous_month(first: NaiveDate) -> Result<NaiveDate, ReportError> {
    let (year, month) = if first.month() == 1 {
        (first.year() - 1, 12)
    } else {
        (first.year(), first.month() - 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ReportError::InvalidRange(format!("no month before {first}")))
}

#[derive(Debug, Clone, Copy)]
pub struct DateRangeResolver {
    tz: Tz,
}

impl DateRangeResolver {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// The calendar date of `now` in the reporting zone
    pub fn local_today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.tz).date_naive()
    }

    pub fn resolve(
        &self,
        period: ReportPeriod,
        now: DateTime<Utc>,
    ) -> Result<ResolvedRange, ReportError> {
        let today = self.local_today(now);

        match period {
            ReportPeriod::Today => {
                self.single_day(today, format!("Today, {}", today.format(DAY_FORMAT)))
            }
            ReportPeriod::Yesterday => {
                let day = today
                    .checked_sub_days(Days::new(1))
                    .ok_or_else(|| ReportError::InvalidRange(format!("no day before {today}")))?;
                self.single_day(day, format!("Yesterday, {}", day.format(DAY_FORMAT)))
            }
            ReportPeriod::Date(day) => self.single_day(day, day.format(DAY_FORMAT).to_string()),
            ReportPeriod::LastSevenDays => {
                let first = today
                    .checked_sub_days(Days::new(6))
                    .ok_or_else(|| ReportError::InvalidRange(format!("no week before {today}")))?;
                let label = format!(
                    "Last 7 days, {} to {}",
                    first.format(DAY_FORMAT),
                    today.format(DAY_FORMAT)
                );
                self.span(first, next_day(today)?, label, None)
            }
            ReportPeriod::ThisMonth => {
                let first = first_of_month(today);
                let label = format!("This month, {}", first.format(MONTH_FORMAT));
                self.span(first, first_of_next_month(first)?, label, None)
            }
            ReportPeriod::LastMonth => {
                let first = first_of_previous_month(first_of_month(today))?;
                let label = format!("Last month, {}", first.format(MONTH_FORMAT));
                self.span(first, first_of_next_month(first)?, label, None)
            }
        }
    }

    fn single_day(&self, day: NaiveDate, label: String) -> Result<ResolvedRange, ReportError> {
        self.span(day, next_day(day)?, label, Some(day))
    }

    /// Local midnight of `first` up to one nanosecond before local midnight of `next`
    fn span(
        &self,
        first: NaiveDate,
        next: NaiveDate,
        label: String,
        anchor: Option<NaiveDate>,
    ) -> Result<ResolvedRange, ReportError> {
        let start = local_midnight(self.tz, first)?;
        let end = local_midnight(self.tz, next)? - Duration::nanoseconds(1);

        if start >= end {
            return Err(ReportError::InvalidRange(format!(
                "empty range {first} to {next}"
            )));
        }

        Ok(ResolvedRange {
            start,
            end,
            label,
            anchor,
        })
    }
}
