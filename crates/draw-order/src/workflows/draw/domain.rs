use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic field a table column can be mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Date,
    Roi,
    Amount,
    Tenor,
    Type,
}

impl ColumnRole {
    pub const fn ordered() -> [Self; 5] {
        [Self::Date, Self::Roi, Self::Amount, Self::Tenor, Self::Type]
    }

    pub const fn is_required(self) -> bool {
        matches!(self, Self::Date | Self::Roi | Self::Amount)
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Roi => "roi",
            Self::Amount => "amount",
            Self::Tenor => "tenor",
            Self::Type => "type",
        }
    }

    /// Header labels tried for this role, highest priority first.
    pub const fn candidates(self) -> &'static [&'static str] {
        match self {
            Self::Date => &[
                "Date of availability",
                "Availability Date",
                "Available On",
                "Availability",
                "Date",
            ],
            Self::Roi => &["ROI", "Interest", "Rate", "Rate of Interest"],
            Self::Amount => &[
                "Amount to be drawn",
                "Amount",
                "Draw Amount",
                "Available Amount",
                "Amt",
            ],
            Self::Tenor => &["Tenor", "Tenure", "Term", "Days"],
            Self::Type => &["Type", "Loan Type"],
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Normalized loan type. Labels outside the short/long vocabulary are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanType {
    ShortTerm,
    LongTerm,
    Other(String),
}

impl LoanType {
    pub fn code(&self) -> &str {
        match self {
            Self::ShortTerm => "ST",
            Self::LongTerm => "LT",
            Self::Other(label) => label,
        }
    }
}

/// Typed view of one input row. NaN marks a cell that could not be parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRow {
    pub availability_date: Option<NaiveDate>,
    pub rate_of_interest_percent: f64,
    pub draw_amount: f64,
    pub tenor_days: f64,
    pub loan_type: Option<LoanType>,
}

/// Priority bucket for the availability date relative to the near window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NearnessClass {
    WithinWindow,
    BeyondWindow,
    Past,
}

impl NearnessClass {
    pub const fn code(self) -> u8 {
        match self {
            Self::WithinWindow => 0,
            Self::BeyondWindow => 1,
            Self::Past => 2,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::WithinWindow => "Within window",
            Self::BeyondWindow => "Beyond window",
            Self::Past => "Past",
        }
    }
}

/// ALM placement of a row, present only when an ALM profile is configured.
#[derive(Debug, Clone, PartialEq)]
pub struct AlmAssessment {
    /// `None` when the tenor falls outside every bucket under the zero policy.
    pub bucket_label: Option<&'static str>,
    pub mismatch: f64,
    pub priority_score: f64,
}

/// A canonical row plus everything the ranker needs.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRow {
    /// Position of the row in the input table (0-based).
    pub source_index: usize,
    pub canonical: CanonicalRow,
    pub days_to_availability: Option<i64>,
    pub effective_tenor_days: f64,
    pub nearness: NearnessClass,
    pub alm: Option<AlmAssessment>,
}

/// One line of a draw plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawPick {
    /// 1-based position in the ranked order.
    pub rank: usize,
    pub source_index: usize,
    pub available_amount: f64,
    pub picked_amount: f64,
    pub remaining_target: f64,
}

/// Greedy allocation of a target amount over the ranked lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawPlan {
    pub target_amount: f64,
    pub picks: Vec<DrawPick>,
}

impl DrawPlan {
    pub fn total_picked(&self) -> f64 {
        self.picks.iter().map(|pick| pick.picked_amount).sum()
    }

    /// Amount still uncovered once every usable line has been consumed.
    pub fn shortfall(&self) -> f64 {
        self.picks
            .last()
            .map(|pick| pick.remaining_target)
            .unwrap_or(self.target_amount)
    }

    pub fn is_fully_covered(&self) -> bool {
        self.shortfall() <= 0.0
    }
}
