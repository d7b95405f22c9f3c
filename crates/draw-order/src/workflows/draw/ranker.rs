use super::domain::RankedRow;
use std::cmp::Ordering;

/// Stable sort by nearness, ALM priority (when present), rate, days to availability, tenor.
///
/// Unparseable rates and unknown dates sort after every known value. Rows are
/// reordered, never dropped.
pub fn rank_rows(mut rows: Vec<RankedRow>, alm_enabled: bool) -> Vec<RankedRow> {
    rows.sort_by(|a, b| compare_rows(a, b, alm_enabled));
    rows
}

pub fn compare_rows(a: &RankedRow, b: &RankedRow, alm_enabled: bool) -> Ordering {
    a.nearness
        .cmp(&b.nearness)
        .then_with(|| {
            if alm_enabled {
                cmp_nan_last(alm_priority(a), alm_priority(b))
            } else {
                Ordering::Equal
            }
        })
        .then_with(|| {
            cmp_nan_last(
                a.canonical.rate_of_interest_percent,
                b.canonical.rate_of_interest_percent,
            )
        })
        .then_with(|| cmp_none_last(a.days_to_availability, b.days_to_availability))
        .then_with(|| cmp_nan_last(a.effective_tenor_days, b.effective_tenor_days))
}

fn alm_priority(row: &RankedRow) -> f64 {
    row.alm
        .as_ref()
        .map_or(0.0, |assessment| assessment.priority_score)
}

fn cmp_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn cmp_none_last(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
