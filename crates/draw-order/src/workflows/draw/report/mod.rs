pub mod views;

use super::domain::{DrawPlan, NearnessClass, RankedRow};
use super::schema::ColumnMap;
use super::DrawOrderError;
use crate::workflows::intake::CellValue;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use views::{
    AlmView, ColumnMappingView, DrawOrderView, DrawPickView, DrawPlanView, RankedLineView,
    RankingSummary,
};

const ALM_COLUMNS: [&str; 3] = ["ALM Bucket", "ALM Mismatch", "ALM Priority"];
const DERIVED_COLUMNS: [&str; 3] = [
    "Availability (days from today)",
    "Near-window? (0 best)",
    "Effective Tenor (days)",
];
const PLAN_COLUMNS: [&str; 3] = ["Amount Available", "Picked Amount", "Remaining After Pick"];

/// Which table a delimited export renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportView {
    /// Display columns plus derived ranking columns.
    #[default]
    Order,
    /// Only the lines picked by the draw plan.
    Plan,
    /// Every original column plus derived and plan columns.
    Full,
}

impl ExportView {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "order" => Some(Self::Order),
            "plan" => Some(Self::Plan),
            "full" => Some(Self::Full),
            _ => None,
        }
    }
}

/// Outcome of one ranking run: the ranked lines, their source cells, and the optional plan.
#[derive(Debug, Clone)]
pub struct DrawOrderReport {
    pub(crate) today: NaiveDate,
    pub(crate) near_window_days: u32,
    pub(crate) column_map: ColumnMap,
    pub(crate) columns: Vec<String>,
    pub(crate) source_cells: Vec<Vec<CellValue>>,
    pub(crate) rows: Vec<RankedRow>,
    pub(crate) plan: Option<DrawPlan>,
    pub(crate) alm_enabled: bool,
}

impl DrawOrderReport {
    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn column_map(&self) -> &ColumnMap {
        &self.column_map
    }

    /// Ranked lines, best first.
    pub fn rows(&self) -> &[RankedRow] {
        &self.rows
    }

    pub fn plan(&self) -> Option<&DrawPlan> {
        self.plan.as_ref()
    }

    pub fn summary(&self) -> RankingSummary {
        let mut summary = RankingSummary {
            total_rows: self.rows.len(),
            alm_enabled: self.alm_enabled,
            ..RankingSummary::default()
        };

        for row in &self.rows {
            match row.nearness {
                NearnessClass::WithinWindow => summary.within_window += 1,
                NearnessClass::BeyondWindow => summary.beyond_window += 1,
                NearnessClass::Past => summary.past += 1,
            }
            if row.days_to_availability.is_none() {
                summary.unknown_dates += 1;
            }
            if row.canonical.rate_of_interest_percent.is_nan() {
                summary.unparseable_rates += 1;
            }
            if row.canonical.draw_amount.is_nan() {
                summary.unparseable_amounts += 1;
            }
        }

        summary
    }

    pub fn view(&self) -> DrawOrderView {
        let display_columns: Vec<String> = self
            .column_map
            .display_columns()
            .into_iter()
            .map(str::to_string)
            .collect();

        let order = self
            .rows
            .iter()
            .enumerate()
            .map(|(position, row)| RankedLineView {
                rank: position + 1,
                source_row: row.source_index + 1,
                cells: self.display_cells(row.source_index),
                availability_date: row.canonical.availability_date,
                rate_of_interest_percent: finite(row.canonical.rate_of_interest_percent),
                draw_amount: finite(row.canonical.draw_amount),
                tenor_days: finite(row.canonical.tenor_days),
                loan_type: row
                    .canonical
                    .loan_type
                    .as_ref()
                    .map(|loan_type| loan_type.code().to_string()),
                days_to_availability: row.days_to_availability,
                nearness: row.nearness,
                nearness_code: row.nearness.code(),
                nearness_label: row.nearness.label(),
                effective_tenor_days: row.effective_tenor_days,
                alm: row.alm.as_ref().map(|assessment| AlmView {
                    bucket: assessment.bucket_label,
                    mismatch: assessment.mismatch,
                    priority_score: assessment.priority_score,
                }),
            })
            .collect();

        let plan = self.plan.as_ref().map(|plan| DrawPlanView {
            target_amount: plan.target_amount,
            total_picked: plan.total_picked(),
            shortfall: plan.shortfall(),
            fully_covered: plan.is_fully_covered(),
            picks: plan
                .picks
                .iter()
                .map(|pick| DrawPickView {
                    rank: pick.rank,
                    source_row: pick.source_index + 1,
                    cells: self.display_cells(pick.source_index),
                    available_amount: pick.available_amount,
                    picked_amount: pick.picked_amount,
                    remaining_target: pick.remaining_target,
                })
                .collect(),
        });

        DrawOrderView {
            today: self.today,
            near_window_days: self.near_window_days,
            column_mapping: ColumnMappingView {
                resolved: self.column_map.entries().clone(),
                detected_columns: self.columns.clone(),
            },
            display_columns,
            summary: self.summary(),
            order,
            plan,
        }
    }

    /// Renders the chosen view as comma-separated text, header row first.
    pub fn write_csv<W: Write>(&self, view: ExportView, writer: W) -> Result<(), DrawOrderError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for record in self.records(view) {
            csv_writer.write_record(&record)?;
        }
        csv_writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    pub fn to_csv(&self, view: ExportView) -> Result<String, DrawOrderError> {
        let mut buffer = Vec::new();
        self.write_csv(view, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    fn records(&self, view: ExportView) -> Vec<Vec<String>> {
        match view {
            ExportView::Order => self.order_records(),
            ExportView::Plan => self.plan_records(),
            ExportView::Full => self.full_records(),
        }
    }

    fn order_records(&self) -> Vec<Vec<String>> {
        let mut header: Vec<String> = self
            .column_map
            .display_columns()
            .into_iter()
            .map(str::to_string)
            .collect();
        header.extend(self.derived_header());

        let mut records = vec![header];
        for row in &self.rows {
            let mut record = self.display_cells(row.source_index);
            record.extend(self.derived_cells(row));
            records.push(record);
        }
        records
    }

    fn plan_records(&self) -> Vec<Vec<String>> {
        let mut header: Vec<String> = self
            .column_map
            .display_columns()
            .into_iter()
            .map(str::to_string)
            .collect();
        header.extend(PLAN_COLUMNS.iter().map(|column| column.to_string()));

        let mut records = vec![header];
        if let Some(plan) = &self.plan {
            for pick in &plan.picks {
                let mut record = self.display_cells(pick.source_index);
                record.push(number(pick.available_amount));
                record.push(number(pick.picked_amount));
                record.push(number(pick.remaining_target));
                records.push(record);
            }
        }
        records
    }

    fn full_records(&self) -> Vec<Vec<String>> {
        let mut header = self.columns.clone();
        header.extend(self.derived_header());
        if self.plan.is_some() {
            header.extend(PLAN_COLUMNS[1..].iter().map(|column| column.to_string()));
        }

        let picks: HashMap<usize, (f64, f64)> = self
            .plan
            .iter()
            .flat_map(|plan| plan.picks.iter())
            .map(|pick| (pick.source_index, (pick.picked_amount, pick.remaining_target)))
            .collect();

        let mut records = vec![header];
        for row in &self.rows {
            let mut record: Vec<String> = self
                .source_cells
                .get(row.source_index)
                .map(|cells| cells.iter().map(ToString::to_string).collect())
                .unwrap_or_default();
            record.extend(self.derived_cells(row));
            if self.plan.is_some() {
                match picks.get(&row.source_index) {
                    Some((picked, remaining)) => {
                        record.push(number(*picked));
                        record.push(number(*remaining));
                    }
                    None => record.extend([String::new(), String::new()]),
                }
            }
            records.push(record);
        }
        records
    }

    fn derived_header(&self) -> Vec<String> {
        let alm: &[&str] = if self.alm_enabled { &ALM_COLUMNS } else { &[] };
        alm.iter()
            .chain(DERIVED_COLUMNS.iter())
            .map(|column| column.to_string())
            .collect()
    }

    fn derived_cells(&self, row: &RankedRow) -> Vec<String> {
        let mut cells = Vec::with_capacity(6);
        if self.alm_enabled {
            match &row.alm {
                Some(assessment) => {
                    cells.push(assessment.bucket_label.unwrap_or_default().to_string());
                    cells.push(number(assessment.mismatch));
                    cells.push(number(assessment.priority_score));
                }
                None => cells.extend([String::new(), String::new(), String::new()]),
            }
        }
        cells.push(
            row.days_to_availability
                .map(|days| days.to_string())
                .unwrap_or_default(),
        );
        cells.push(row.nearness.code().to_string());
        cells.push(number(row.effective_tenor_days));
        cells
    }

    fn display_cells(&self, source_index: usize) -> Vec<String> {
        let Some(cells) = self.source_cells.get(source_index) else {
            return Vec::new();
        };

        self.column_map
            .display_columns()
            .into_iter()
            .map(|column| {
                self.columns
                    .iter()
                    .position(|name| name == column)
                    .and_then(|index| cells.get(index))
                    .map(ToString::to_string)
                    .unwrap_or_default()
            })
            .collect()
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn number(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        String::new()
    }
}
