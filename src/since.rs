//! Turning a human `--since` value into the cutoff handed to the repository.
//!
//! The historical behaviour reads only the leading number and treats it as a
//! day count, so `"2 weeks ago"` means two days. That stays the default to
//! keep existing reports comparable; [`SinceUnits::Honor`] reads the unit.

use chrono::{Duration, Local, Months, NaiveDate};

pub const DEFAULT_SINCE: &str = "3 months ago";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SinceUnits {
    /// Leading integer is a day count whatever word follows it.
    #[default]
    Ignore,
    /// `day`, `week`, `month` and `year` (singular or plural) are honoured.
    Honor,
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Resolve `input` against `today`.
///
/// Returns `YYYY-MM-DD` when the first token is an integer, otherwise the
/// input unchanged so the repository's own date parser can interpret it.
/// Never fails.
pub fn resolve_since(input: &str, today: NaiveDate, units: SinceUnits) -> String {
    let mut tokens = input.split_whitespace();
    let Some(count) = tokens.next().and_then(|token| token.parse::<i64>().ok()) else {
        return input.to_string();
    };

    let resolved = match units {
        SinceUnits::Ignore => shift_days(today, count),
        SinceUnits::Honor => match tokens.next() {
            Some(unit) => shift_by_unit(today, count, unit),
            None => shift_days(today, count),
        },
    };

    match resolved {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => input.to_string(),
    }
}

fn shift_days(today: NaiveDate, days: i64) -> Option<NaiveDate> {
    today.checked_sub_signed(Duration::try_days(days)?)
}

fn shift_months(today: NaiveDate, months: i64) -> Option<NaiveDate> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        today.checked_sub_months(magnitude)
    } else {
        today.checked_add_months(magnitude)
    }
}

fn shift_by_unit(today: NaiveDate, count: i64, unit: &str) -> Option<NaiveDate> {
    match unit.to_lowercase().as_str() {
        "day" | "days" => shift_days(today, count),
        "week" | "weeks" => shift_days(today, count.checked_mul(7)?),
        "month" | "months" => shift_months(today, count),
        "year" | "years" => shift_months(today, count.checked_mul(12)?),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn day_count_is_subtracted() {
        let today = date("2024-05-10");
        assert_eq!(resolve_since("90 days ago", today, SinceUnits::Ignore), "2024-02-10");
        assert_eq!(resolve_since("0 days ago", today, SinceUnits::Ignore), "2024-05-10");
    }

    #[test]
    fn unit_word_is_ignored_by_default() {
        let today = date("2024-05-10");
        // "weeks" and "months" still subtract days, kept for output compatibility
        assert_eq!(resolve_since("2 weeks ago", today, SinceUnits::Ignore), "2024-05-08");
        assert_eq!(resolve_since("3 months ago", today, SinceUnits::Ignore), "2024-05-07");
        assert_eq!(resolve_since("7", today, SinceUnits::Ignore), "2024-05-03");
        assert_eq!(resolve_since("7 bananas", today, SinceUnits::Ignore), "2024-05-03");
    }

    #[test]
    fn non_integer_input_is_returned_unchanged() {
        let today = date("2024-05-10");
        for input in ["yesterday", "last week", "2024-01-01", "", "   ", "3.5 days ago", "v1.0"] {
            assert_eq!(resolve_since(input, today, SinceUnits::Ignore), input);
            assert_eq!(resolve_since(input, today, SinceUnits::Honor), input);
        }
    }

    #[test]
    fn overflowing_count_falls_through() {
        let today = date("2024-05-10");
        let input = "99999999999999 days ago";
        assert_eq!(resolve_since(input, today, SinceUnits::Ignore), input);
    }

    #[test]
    fn negative_count_moves_forward() {
        let today = date("2024-05-10");
        assert_eq!(resolve_since("-5 days", today, SinceUnits::Ignore), "2024-05-15");
    }

    #[test]
    fn honored_units_use_calendar_arithmetic() {
        let today = date("2024-03-31");
        assert_eq!(resolve_since("2 weeks ago", today, SinceUnits::Honor), "2024-03-17");
        assert_eq!(resolve_since("1 month ago", today, SinceUnits::Honor), "2024-02-29");
        assert_eq!(resolve_since("3 Months ago", today, SinceUnits::Honor), "2023-12-31");
        assert_eq!(resolve_since("1 year ago", today, SinceUnits::Honor), "2023-03-31");
        assert_eq!(resolve_since("10 days ago", today, SinceUnits::Honor), "2024-03-21");
        assert_eq!(resolve_since("10", today, SinceUnits::Honor), "2024-03-21");
    }

    #[test]
    fn honored_unknown_unit_is_returned_unchanged() {
        let today = date("2024-03-31");
        assert_eq!(
            resolve_since("3 fortnights ago", today, SinceUnits::Honor),
            "3 fortnights ago"
        );
    }
}
