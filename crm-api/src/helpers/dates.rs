use chrono::NaiveDate;
use shared_types::{parse_bounds, DateRangeError, ListQuery};

use crate::database::leads::CreatedBetween;

fn start_of_day(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

fn end_of_day(date: NaiveDate) -> i64 {
    date.and_hms_opt(23, 59, 59)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// Turns `fromDate` / `toDate` into inclusive `created_at` bounds. Dates are
/// whole UTC days.
pub fn created_between(query: &ListQuery) -> Result<CreatedBetween, DateRangeError> {
    let (from, to) = parse_bounds(query.from_date.as_deref(), query.to_date.as_deref())?;

    Ok(CreatedBetween {
        from: from.map(start_of_day),
        to: to.map(end_of_day),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_cover_whole_days() {
        let query = ListQuery {
            from_date: Some("2024-03-01".to_string()),
            to_date: Some("2024-03-01".to_string()),
            ..Default::default()
        };
        let bounds = created_between(&query).unwrap();
        assert_eq!(bounds.from, Some(1_709_251_200));
        assert_eq!(bounds.to, Some(1_709_251_200 + 86_399));
    }

    #[test]
    fn test_missing_and_invalid_bounds() {
        assert_eq!(
            created_between(&ListQuery::default()).unwrap(),
            CreatedBetween::default()
        );

        let inverted = ListQuery {
            from_date: Some("2024-03-02".to_string()),
            to_date: Some("2024-03-01".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            created_between(&inverted),
            Err(DateRangeError::StartAfterEnd { .. })
        ));

        let garbage = ListQuery {
            from_date: Some("03/01/2024".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            created_between(&garbage),
            Err(DateRangeError::InvalidDate(_))
        ));
    }
}
