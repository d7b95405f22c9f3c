use super::super::domain::{ColumnRole, NearnessClass};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct ColumnMappingView {
    pub resolved: BTreeMap<ColumnRole, Option<String>>,
    pub detected_columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedLineView {
    pub rank: usize,
    pub source_row: usize,
    /// Original cell text for each display column, in display order.
    pub cells: Vec<String>,
    pub availability_date: Option<NaiveDate>,
    pub rate_of_interest_percent: Option<f64>,
    pub draw_amount: Option<f64>,
    pub tenor_days: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_type: Option<String>,
    pub days_to_availability: Option<i64>,
    pub nearness: NearnessClass,
    pub nearness_code: u8,
    pub nearness_label: &'static str,
    pub effective_tenor_days: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alm: Option<AlmView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlmView {
    pub bucket: Option<&'static str>,
    pub mismatch: f64,
    pub priority_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DrawPickView {
    pub rank: usize,
    pub source_row: usize,
    pub cells: Vec<String>,
    pub available_amount: f64,
    pub picked_amount: f64,
    pub remaining_target: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DrawPlanView {
    pub target_amount: f64,
    pub total_picked: f64,
    pub shortfall: f64,
    pub fully_covered: bool,
    pub picks: Vec<DrawPickView>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RankingSummary {
    pub total_rows: usize,
    pub within_window: usize,
    pub beyond_window: usize,
    pub past: usize,
    pub unknown_dates: usize,
    pub unparseable_rates: usize,
    pub unparseable_amounts: usize,
    pub alm_enabled: bool,
}

/// Serializable rendering of a full ranking run.
#[derive(Debug, Clone, Serialize)]
pub struct DrawOrderView {
    pub today: NaiveDate,
    pub near_window_days: u32,
    pub column_mapping: ColumnMappingView,
    pub display_columns: Vec<String>,
    pub summary: RankingSummary,
    pub order: Vec<RankedLineView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<DrawPlanView>,
}
