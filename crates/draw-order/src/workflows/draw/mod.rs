mod alm;
mod derivation;
pub mod domain;
mod normalizer;
mod planner;
mod ranker;
pub mod report;
mod schema;

pub use alm::{bucket_for_days, AlmBucket, AlmProfile, UnbucketedPolicy, ALM_BUCKETS};
pub use derivation::{
    days_to_availability, effective_tenor_days, nearness_class, SHORT_TERM_TENOR_DAYS,
};
pub use domain::{
    AlmAssessment, CanonicalRow, ColumnRole, DrawPick, DrawPlan, LoanType, NearnessClass,
    RankedRow,
};
pub use normalizer::{coerce_date, coerce_number, normalize_loan_type};
pub use planner::plan_draws;
pub use ranker::{compare_rows, rank_rows};
pub use report::{DrawOrderReport, ExportView};
pub use schema::{resolve_column, ColumnMap};

use crate::workflows::intake::RawTable;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

/// Default near window in days.
pub const DEFAULT_NEAR_WINDOW_DAYS: u32 = 10;
/// Default weight applied to ALM mismatch.
pub const DEFAULT_ALM_WEIGHT: f64 = 3.0;

const NEAR_WINDOW_RANGE: std::ops::RangeInclusive<u32> = 1..=30;

/// Errors raised while turning a table into a draw order.
#[derive(Debug, thiserror::Error)]
pub enum DrawOrderError {
    #[error("table has no data ({columns} columns, {rows} rows)")]
    EmptyTable { columns: usize, rows: usize },
    #[error(
        "missing required columns: {} (detected: {})",
        join_roles(.missing),
        .detected.join(", ")
    )]
    MissingColumns {
        missing: Vec<ColumnRole>,
        detected: Vec<String>,
    },
    #[error("near window must be between 1 and 30 days (got {0})")]
    InvalidNearWindow(u32),
    #[error("target amount must be a finite, non-negative number (got {0})")]
    InvalidTargetAmount(f64),
    #[error("ALM weight must be a finite, non-negative number (got {0})")]
    InvalidAlmWeight(f64),
    #[error("unknown ALM bucket label `{0}`")]
    UnknownAlmBucket(String),
    #[error("ALM mismatch for `{bucket}` must be finite (got {amount})")]
    InvalidAlmMismatch { bucket: &'static str, amount: f64 },
    #[error("failed to render delimited export: {0}")]
    Export(#[from] csv::Error),
}

impl DrawOrderError {
    /// Column names seen in the table, when the failure was a schema mismatch.
    pub fn detected_columns(&self) -> Option<&[String]> {
        match self {
            Self::MissingColumns { detected, .. } => Some(detected),
            _ => None,
        }
    }
}

fn join_roles(roles: &[ColumnRole]) -> String {
    roles
        .iter()
        .copied()
        .map(ColumnRole::key)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Caller-supplied knobs for one ranking run.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingParams {
    pub near_window_days: u32,
    /// Amount to cover; zero skips planning.
    pub target_amount: f64,
    pub alm: Option<AlmProfile>,
}

impl Default for RankingParams {
    fn default() -> Self {
        Self::new(DEFAULT_NEAR_WINDOW_DAYS)
    }
}

impl RankingParams {
    pub fn new(near_window_days: u32) -> Self {
        Self {
            near_window_days,
            target_amount: 0.0,
            alm: None,
        }
    }

    pub fn with_target(mut self, target_amount: f64) -> Self {
        self.target_amount = target_amount;
        self
    }

    pub fn with_alm(mut self, profile: AlmProfile) -> Self {
        self.alm = Some(profile);
        self
    }

    pub fn validate(&self) -> Result<(), DrawOrderError> {
        if !NEAR_WINDOW_RANGE.contains(&self.near_window_days) {
            return Err(DrawOrderError::InvalidNearWindow(self.near_window_days));
        }
        if !self.target_amount.is_finite() || self.target_amount < 0.0 {
            return Err(DrawOrderError::InvalidTargetAmount(self.target_amount));
        }
        if let Some(profile) = &self.alm {
            if !profile.weight().is_finite() || profile.weight() < 0.0 {
                return Err(DrawOrderError::InvalidAlmWeight(profile.weight()));
            }
        }
        Ok(())
    }
}

/// Runs resolve, normalize, derive, rank and plan over one table.
#[derive(Debug, Clone)]
pub struct DrawOrderEngine {
    params: RankingParams,
}

impl DrawOrderEngine {
    pub fn new(params: RankingParams) -> Result<Self, DrawOrderError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn run(
        &self,
        table: &RawTable,
        today: NaiveDate,
    ) -> Result<DrawOrderReport, DrawOrderError> {
        if table.is_empty() {
            return Err(DrawOrderError::EmptyTable {
                columns: table.columns().len(),
                rows: table.row_count(),
            });
        }

        let column_map = ColumnMap::resolve(table.columns()).inspect_err(|error| {
            warn!(%error, "column resolution failed");
        })?;
        debug!(columns = ?column_map.display_columns(), "resolved columns");

        let alm = self.params.alm.as_ref();
        let derived: Vec<RankedRow> = table
            .rows()
            .enumerate()
            .map(|(index, row)| {
                let canonical = normalizer::canonicalize(&row, &column_map, today);
                derivation::derive_row(
                    index,
                    canonical,
                    today,
                    self.params.near_window_days,
                    alm,
                )
            })
            .collect();

        let rows = rank_rows(derived, alm.is_some());
        let plan = plan_draws(&rows, self.params.target_amount);

        let report = DrawOrderReport {
            today,
            near_window_days: self.params.near_window_days,
            column_map,
            columns: table.columns().to_vec(),
            source_cells: table.rows().map(|row| row.cells().to_vec()).collect(),
            rows,
            plan,
            alm_enabled: alm.is_some(),
        };

        let summary = report.summary();
        debug!(?summary, "ranking summary");
        if let Some(plan) = report.plan() {
            if !plan.is_fully_covered() {
                warn!(
                    target = plan.target_amount,
                    shortfall = plan.shortfall(),
                    "draw plan does not cover target"
                );
            }
        }
        info!(
            rows = summary.total_rows,
            within_window = summary.within_window,
            alm = summary.alm_enabled,
            planned = report.plan().is_some(),
            %today,
            "ranked draw order"
        );

        Ok(report)
    }
}
