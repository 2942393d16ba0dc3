//! Long-form Portuguese dates for the current-date placeholder.

use chrono::{Datelike, Local, NaiveDate};

/// Month names, January first.
const MONTHS: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// Name of a calendar month (1 = janeiro).
pub fn month_name(month: u32) -> Option<&'static str> {
    let idx = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTHS.get(idx).copied()
}

/// Format a date as `"{day} de {month} de {year}"`, e.g. `5 de janeiro de 2024`.
pub fn format_long_date(date: NaiveDate) -> String {
    // chrono months are always 1..=12
    let month = month_name(date.month()).unwrap_or_default();
    format!("{} de {} de {}", date.day(), month, date.year())
}

/// Today's local date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Today's local date in long form.
pub fn today_long() -> String {
    format_long_date(today())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_long_date_is_one_based() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(format_long_date(date), "5 de janeiro de 2024");
    }

    #[test]
    fn test_format_long_date_no_zero_padding() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 21).unwrap();
        assert_eq!(format_long_date(date), "21 de março de 2025");

        let date = NaiveDate::from_ymd_opt(1999, 12, 1).unwrap();
        assert_eq!(format_long_date(date), "1 de dezembro de 1999");
    }

    #[test]
    fn test_month_table() {
        assert_eq!(MONTHS.len(), 12);
        assert_eq!(month_name(1), Some("janeiro"));
        assert_eq!(month_name(12), Some("dezembro"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
    }

    #[test]
    fn test_today_long_mentions_current_year() {
        let text = today_long();
        assert!(text.ends_with(&today().year().to_string()));
        assert_eq!(text.matches(" de ").count(), 2);
    }
}
