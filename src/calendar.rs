use chrono::{Datelike, NaiveDate};

// ---------------------------------------------------------------------------
// Month table shared by the bar chart legend and the box plot axis
// ---------------------------------------------------------------------------

/// Calendar months in order: (full name, three-letter abbreviation).
/// Index `i` holds month number `i + 1`.
pub const MONTHS: [(&str, &str); 12] = [
    ("January", "Jan"),
    ("February", "Feb"),
    ("March", "Mar"),
    ("April", "Apr"),
    ("May", "May"),
    ("June", "Jun"),
    ("July", "Jul"),
    ("August", "Aug"),
    ("September", "Sep"),
    ("October", "Oct"),
    ("November", "Nov"),
    ("December", "Dec"),
];

/// Full month name for a month number in `1..=12`.
pub fn month_name(month: u32) -> Option<&'static str> {
    month_entry(month).map(|(name, _)| name)
}

/// Three-letter abbreviation for a month number in `1..=12`.
pub fn month_abbrev(month: u32) -> Option<&'static str> {
    month_entry(month).map(|(_, abbrev)| abbrev)
}

/// The fixed `Jan..Dec` category sequence.
pub fn month_abbrevs() -> impl Iterator<Item = &'static str> {
    MONTHS.iter().map(|(_, abbrev)| *abbrev)
}

/// `(year, month)` key of a date, month in `1..=12`.
pub fn year_month(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

fn month_entry(month: u32) -> Option<(&'static str, &'static str)> {
    let idx = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTHS.get(idx).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_calendar_order() {
        assert_eq!(month_name(1), Some("January"));
        assert_eq!(month_name(12), Some("December"));
        assert_eq!(month_abbrev(9), Some("Sep"));
    }

    #[test]
    fn out_of_range_months_have_no_name() {
        assert_eq!(month_name(0), None);
        assert_eq!(month_abbrev(13), None);
    }

    #[test]
    fn abbreviations_cover_the_year() {
        let all: Vec<&str> = month_abbrevs().collect();
        assert_eq!(
            all,
            ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"]
        );
    }

    #[test]
    fn year_month_of_date() {
        let d = NaiveDate::from_ymd_opt(2017, 3, 14).unwrap();
        assert_eq!(year_month(d), (2017, 3));
    }
}
