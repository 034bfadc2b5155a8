use std::borrow::Cow;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::types::SkipReason;

static ORDINAL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)(?:st|nd|rd|th)\b").expect("static regex"));

/// "23rd" → "23". Other text is left alone.
pub fn strip_ordinals(text: &str) -> Cow<'_, str> {
    ORDINAL_SUFFIX.replace_all(text, "$1")
}

/// Month number for an English month name or abbreviation.
///
/// Case-insensitive; accepts full names, three-letter forms, "Sept", and a
/// trailing period ("Jan.").
pub fn month_number(token: &str) -> Option<u32> {
    let name = token.trim_end_matches(['.', ',']).to_ascii_lowercase();
    let month = match name.as_str() {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sep" | "sept" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Normalize `"<Month> <Day>[st|nd|rd|th]"` to a calendar date in `year`.
///
/// Only the first two tokens count; anything after the day is ignored.
pub fn normalize_date(raw: &str, year: i32) -> Result<NaiveDate, SkipReason> {
    let cleaned = strip_ordinals(raw);
    let mut tokens = cleaned.split_whitespace();

    let month_token = tokens.next().ok_or(SkipReason::EmptyDate)?;
    let month = month_number(month_token).ok_or(SkipReason::UnrecognizedMonth)?;

    let day_token = tokens.next().ok_or(SkipReason::MissingDay)?;
    let day: u32 = day_token
        .trim_end_matches(['.', ',', ';'])
        .parse()
        .map_err(|_| SkipReason::InvalidDay)?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or(SkipReason::InvalidCalendarDate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn ordinal_suffixes_removed() {
        assert_eq!(strip_ordinals("23rd"), "23");
        assert_eq!(strip_ordinals("1st"), "1");
        assert_eq!(strip_ordinals("2nd"), "2");
        assert_eq!(strip_ordinals("4th"), "4");
        assert_eq!(strip_ordinals("March 11TH"), "March 11");
    }

    #[test]
    fn words_ending_in_suffix_letters_untouched() {
        assert_eq!(strip_ordinals("North 5"), "North 5");
        assert_eq!(strip_ordinals("August 1"), "August 1");
    }

    #[test]
    fn normalizes_full_month_names() {
        assert_eq!(normalize_date("January 15", 2026), Ok(date(2026, 1, 15)));
        assert_eq!(normalize_date("September 9th", 2026), Ok(date(2026, 9, 9)));
        assert_eq!(normalize_date("december 1st", 2025), Ok(date(2025, 12, 1)));
    }

    #[test]
    fn accepts_abbreviations() {
        assert_eq!(normalize_date("Feb 2nd", 2026), Ok(date(2026, 2, 2)));
        assert_eq!(normalize_date("Sept. 23rd", 2026), Ok(date(2026, 9, 23)));
        assert_eq!(normalize_date("OCT 31", 2026), Ok(date(2026, 10, 31)));
    }

    #[test]
    fn ignores_text_after_day() {
        assert_eq!(normalize_date("May 5, 11:59pm", 2026), Ok(date(2026, 5, 5)));
    }

    #[test]
    fn unparseable_text_is_unrecognized_month() {
        assert_eq!(normalize_date("Whenever", 2026), Err(SkipReason::UnrecognizedMonth));
        assert_eq!(normalize_date("15 January", 2026), Err(SkipReason::UnrecognizedMonth));
    }

    #[test]
    fn missing_or_bad_day() {
        assert_eq!(normalize_date("March", 2026), Err(SkipReason::MissingDay));
        assert_eq!(normalize_date("March TBD", 2026), Err(SkipReason::InvalidDay));
        assert_eq!(normalize_date("", 2026), Err(SkipReason::EmptyDate));
    }

    #[test]
    fn impossible_dates_rejected() {
        assert_eq!(
            normalize_date("February 30", 2026),
            Err(SkipReason::InvalidCalendarDate)
        );
        assert_eq!(normalize_date("April 31st", 2026), Err(SkipReason::InvalidCalendarDate));
        assert_eq!(normalize_date("February 29", 2028), Ok(date(2028, 2, 29)));
    }
}
