use super::alm::AlmProfile;
use super::domain::{CanonicalRow, LoanType, NearnessClass, RankedRow};
use chrono::NaiveDate;

/// Tenor assumed for short-term lines and for rows without a usable tenor.
pub const SHORT_TERM_TENOR_DAYS: f64 = 90.0;

/// Whole days from `today` to the availability date; negative when already past.
pub fn days_to_availability(date: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    date.map(|date| date.signed_duration_since(today).num_days())
}

pub fn effective_tenor_days(row: &CanonicalRow) -> f64 {
    if row.loan_type == Some(LoanType::ShortTerm) || row.tenor_days.is_nan() {
        SHORT_TERM_TENOR_DAYS
    } else {
        row.tenor_days
    }
}

/// Unknown dates land in `BeyondWindow`, never `WithinWindow`.
pub fn nearness_class(days: Option<i64>, near_window_days: u32) -> NearnessClass {
    match days {
        Some(days) if days < 0 => NearnessClass::Past,
        Some(days) if days <= i64::from(near_window_days) => NearnessClass::WithinWindow,
        _ => NearnessClass::BeyondWindow,
    }
}

pub(crate) fn derive_row(
    source_index: usize,
    canonical: CanonicalRow,
    today: NaiveDate,
    near_window_days: u32,
    alm: Option<&AlmProfile>,
) -> RankedRow {
    let days = days_to_availability(canonical.availability_date, today);
    let effective_tenor = effective_tenor_days(&canonical);

    RankedRow {
        source_index,
        days_to_availability: days,
        effective_tenor_days: effective_tenor,
        nearness: nearness_class(days, near_window_days),
        alm: alm.map(|profile| profile.assess(effective_tenor)),
        canonical,
    }
}
