use super::domain::{CanonicalRow, ColumnRole, LoanType};
use super::schema::ColumnMap;
use crate::workflows::intake::{CellValue, RawRow};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

const CURRENCY_TOKENS: &[&str] = &["inr", "rs.", "rs", "\u{20b9}"];

/// Converts a raw row into typed fields. Unparseable cells become `None`/NaN.
pub(crate) fn canonicalize(
    row: &RawRow<'_>,
    columns: &ColumnMap,
    today: NaiveDate,
) -> CanonicalRow {
    let cell = |role: ColumnRole| columns.column(role).map(|column| row.get(column));

    CanonicalRow {
        availability_date: cell(ColumnRole::Date).and_then(|value| coerce_date(value, today)),
        rate_of_interest_percent: cell(ColumnRole::Roi).map_or(f64::NAN, coerce_number),
        draw_amount: cell(ColumnRole::Amount).map_or(f64::NAN, coerce_number),
        tenor_days: cell(ColumnRole::Tenor).map_or(f64::NAN, coerce_number),
        loan_type: cell(ColumnRole::Type).and_then(normalize_loan_type),
    }
}

/// Dates written without a year take the year of `today`.
pub fn coerce_date(value: &CellValue, today: NaiveDate) -> Option<NaiveDate> {
    match value {
        CellValue::Date(datetime) => Some(datetime.date()),
        CellValue::Text(text) => parse_date_text(text, today.year()),
        CellValue::Empty | CellValue::Number(_) => None,
    }
}

pub fn coerce_number(value: &CellValue) -> f64 {
    match value {
        CellValue::Number(number) if number.is_finite() => *number,
        CellValue::Text(text) => parse_number_text(text),
        _ => f64::NAN,
    }
}

pub fn normalize_loan_type(value: &CellValue) -> Option<LoanType> {
    let label = match value {
        CellValue::Empty => return None,
        other => other.to_string(),
    };

    match label.trim().to_lowercase().as_str() {
        "st" | "short" | "short-term" | "short term" => Some(LoanType::ShortTerm),
        "lt" | "long" | "long-term" | "long term" => Some(LoanType::LongTerm),
        _ => Some(LoanType::Other(label)),
    }
}

fn parse_number_text(text: &str) -> f64 {
    let mut cleaned = text.replace([',', '%'], "").to_lowercase();
    for token in CURRENCY_TOKENS {
        cleaned = cleaned.replace(token, "");
    }

    let cleaned = cleaned.trim();
    if matches!(cleaned, "" | "-" | "\u{2014}") {
        return f64::NAN;
    }

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .unwrap_or(f64::NAN)
}

struct DatePatterns {
    iso: Regex,
    numeric: Regex,
    day_month_name: Regex,
    month_name_day: Regex,
    day_month: Regex,
}

fn date_patterns() -> &'static DatePatterns {
    static PATTERNS: OnceLock<DatePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| DatePatterns {
        iso: Regex::new(r"\b(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})").expect("iso date pattern"),
        numeric: Regex::new(r"\b(\d{1,2})[-/.](\d{1,2})[-/.](\d{4}|\d{2})\b")
            .expect("numeric date pattern"),
        day_month_name: Regex::new(
            r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?(?:[\s\-/.,]+(?:of|the)\b)*[\s\-/.,]*([a-z]{3,9})\b\.?(?:[\s\-/.,]*(\d{4}|\d{2})\b)?",
        )
        .expect("day month-name pattern"),
        month_name_day: Regex::new(
            r"(?i)\b([a-z]{3,9})\b\.?(?:[\s\-/.,]+the\b)?[\s\-/.,]*(\d{1,2})(?:st|nd|rd|th)?\b(?:[\s\-/.,]+(\d{4}|\d{2})\b)?",
        )
        .expect("month-name day pattern"),
        day_month: Regex::new(r"\b(\d{1,2})[-/](\d{1,2})\b").expect("day-month pattern"),
    })
}

/// Day-first date parsing that tolerates surrounding free text.
///
/// A date written without a year falls in `default_year`.
pub(crate) fn parse_date_text(text: &str, default_year: i32) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let patterns = date_patterns();

    if let Some(caps) = patterns.iso.captures(text) {
        let date = ymd(caps[1].parse().ok()?, &caps[2], &caps[3]);
        if date.is_some() {
            return date;
        }
    }

    if let Some(caps) = patterns.numeric.captures(text) {
        let (day, month) = (&caps[1], &caps[2]);
        let year = full_year(&caps[3])?;
        if let Some(date) = ymd(year, month, day).or_else(|| ymd(year, day, month)) {
            return Some(date);
        }
    }

    for caps in patterns.day_month_name.captures_iter(text) {
        if let Some(month) = month_number(&caps[2]) {
            let year = caps.get(3).map_or(Some(default_year), |year| full_year(year.as_str()));
            if let Some(date) = year.and_then(|year| ymd_with_month(year, month, &caps[1])) {
                return Some(date);
            }
        }
    }

    for caps in patterns.month_name_day.captures_iter(text) {
        if let Some(month) = month_number(&caps[1]) {
            let year = caps.get(3).map_or(Some(default_year), |year| full_year(year.as_str()));
            if let Some(date) = year.and_then(|year| ymd_with_month(year, month, &caps[2])) {
                return Some(date);
            }
        }
    }

    if let Some(caps) = patterns.day_month.captures(text) {
        let (day, month) = (&caps[1], &caps[2]);
        return ymd(default_year, month, day).or_else(|| ymd(default_year, day, month));
    }

    None
}

/// Two-digit years fall in 2000-2099.
fn full_year(raw: &str) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    Some(if year < 100 { year + 2000 } else { year })
}

fn ymd(year: i32, month: &str, day: &str) -> Option<NaiveDate> {
    ymd_with_month(year, month.parse().ok()?, day)
}

fn ymd_with_month(year: i32, month: u32, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day.parse().ok()?)
}

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];

    let name = name.to_lowercase();
    if name.len() < 3 {
        return None;
    }
    if name == "sept" {
        return Some(9);
    }

    MONTHS
        .iter()
        .position(|month| month.starts_with(name.as_str()))
        .map(|index| index as u32 + 1)
}
