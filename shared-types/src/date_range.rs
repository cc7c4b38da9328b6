use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone};

/// Hour every date is pinned to before it is formatted, so a date picked in any
/// offset between UTC-12 and UTC+14 keeps its calendar day.
pub const NORMALIZED_HOUR: u32 = 12;

pub const API_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateRangeError {
    #[error("Start date {start} is after end date {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },

    #[error("End date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

fn noon() -> NaiveTime {
    NaiveTime::from_hms_opt(NORMALIZED_HOUR, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Moves `value` to 12:00:00 on the same local calendar day.
pub fn normalize_to_noon<Tz: TimeZone>(value: &DateTime<Tz>) -> DateTime<Tz> {
    let local_noon = value.date_naive().and_time(noon());
    value
        .timezone()
        .from_local_datetime(&local_noon)
        .earliest()
        .unwrap_or_else(|| value.clone())
}

/// Normalizes to noon, then formats as `YYYY-MM-DD` for list queries.
pub fn to_api_date<Tz: TimeZone>(value: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    normalize_to_noon(value).format(API_DATE_FORMAT).to_string()
}

pub fn parse_api_date(raw: &str) -> Result<NaiveDate, DateRangeError> {
    NaiveDate::parse_from_str(raw.trim(), API_DATE_FORMAT)
        .map_err(|_| DateRangeError::InvalidDate(raw.to_string()))
}

/// Parses optional `fromDate` / `toDate` query values and checks their order.
pub fn parse_bounds(
    from: Option<&str>,
    to: Option<&str>,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>), DateRangeError> {
    let from = from
        .filter(|raw| !raw.trim().is_empty())
        .map(parse_api_date)
        .transpose()?;
    let to = to
        .filter(|raw| !raw.trim().is_empty())
        .map(parse_api_date)
        .transpose()?;

    if let (Some(start), Some(end)) = (from, to) {
        if start > end {
            return Err(DateRangeError::StartAfterEnd { start, end });
        }
    }

    Ok((from, to))
}

/// Inclusive start/end pair gating every lead list. The range can never be
/// inverted: a bound that would invert it is rejected and the stored bounds are
/// left as they were.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if start > end {
            return Err(DateRangeError::StartAfterEnd { start, end });
        }
        Ok(Self { start, end })
    }

    /// The `days`-long window ending on `today`.
    pub fn ending_on(today: NaiveDate, days: u32) -> Self {
        let start = today - Duration::days(i64::from(days.saturating_sub(1)));
        Self { start, end: today }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn set_start(&mut self, start: NaiveDate) -> Result<(), DateRangeError> {
        if start > self.end {
            return Err(DateRangeError::StartAfterEnd {
                start,
                end: self.end,
            });
        }
        self.start = start;
        Ok(())
    }

    pub fn set_end(&mut self, end: NaiveDate) -> Result<(), DateRangeError> {
        if end < self.start {
            return Err(DateRangeError::EndBeforeStart {
                start: self.start,
                end,
            });
        }
        self.end = end;
        Ok(())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// `(fromDate, toDate)` query values.
    pub fn query_params(&self) -> (String, String) {
        (
            self.start.format(API_DATE_FORMAT).to_string(),
            self.end.format(API_DATE_FORMAT).to_string(),
        )
    }
}
