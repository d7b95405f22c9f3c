use crate::infra::{
    parse_date, parse_mismatch, parse_sheet, parse_unbucketed, ranking_params, AlmOptions,
};
use chrono::NaiveDate;
use clap::{ArgGroup, Args};
use draw_order::config::{AppConfig, RankingDefaults};
use draw_order::error::AppError;
use draw_order::telemetry::{self, LogSink};
use draw_order::workflows::draw::{DrawOrderEngine, DrawOrderReport, ExportView, UnbucketedPolicy};
use draw_order::workflows::intake::{
    RawTable, SheetSelection, TableImporter, TableIntakeError, TableSelection,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["input", "grid"])))]
pub(crate) struct RankArgs {
    /// Spreadsheet or delimited export whose first row holds the column names
    #[arg(long)]
    pub(crate) input: Option<PathBuf>,
    /// Sheet of a spreadsheet --input, by 1-based position or name (defaults to the first)
    #[arg(long, requires = "input", value_parser = parse_sheet)]
    pub(crate) sheet: Option<SheetSelection>,
    /// JSON file holding one extracted grid or a list of grids
    #[arg(long)]
    pub(crate) grid: Option<PathBuf>,
    /// 1-based table to use from --grid
    #[arg(long, default_value_t = 1)]
    pub(crate) table: usize,
    /// Evaluation date (YYYY-MM-DD). Defaults to today at the configured UTC offset.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Near window in days (1-30)
    #[arg(long)]
    pub(crate) window: Option<u32>,
    /// Amount to cover with a greedy draw plan
    #[arg(long)]
    pub(crate) target: Option<f64>,
    /// Enable ALM-aware ranking
    #[arg(long)]
    pub(crate) alm: bool,
    /// Weight applied to bucket mismatch (implies --alm)
    #[arg(long)]
    pub(crate) alm_weight: Option<f64>,
    /// Bucket mismatch as "LABEL=AMOUNT"; repeatable (implies --alm)
    #[arg(long, value_parser = parse_mismatch)]
    pub(crate) alm_mismatch: Vec<(String, f64)>,
    /// Handling of tenors outside every bucket: zero, neutral, clamp (implies --alm)
    #[arg(long, value_parser = parse_unbucketed)]
    pub(crate) unbucketed: Option<UnbucketedPolicy>,
    /// Write the ranked order here instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Write the draw plan here (requires --target)
    #[arg(long)]
    pub(crate) plan_output: Option<PathBuf>,
    /// Export every original column instead of the display columns
    #[arg(long)]
    pub(crate) full: bool,
}

impl RankArgs {
    fn alm_options(&self) -> Option<AlmOptions> {
        let requested = self.alm
            || self.alm_weight.is_some()
            || self.unbucketed.is_some()
            || !self.alm_mismatch.is_empty();

        requested.then(|| AlmOptions {
            weight: self.alm_weight,
            mismatch: self.alm_mismatch.iter().cloned().collect(),
            unbucketed: self.unbucketed,
        })
    }

    fn export_view(&self) -> ExportView {
        if self.full {
            ExportView::Full
        } else {
            ExportView::Order
        }
    }

    fn load_table(&self) -> Result<RawTable, AppError> {
        let table = match (&self.input, &self.grid) {
            (Some(path), _) => match &self.sheet {
                Some(sheet) => TableImporter::from_workbook(path, sheet)?,
                None => TableImporter::from_path(path)?,
            },
            (None, Some(path)) => {
                let file = File::open(path)?;
                TableImporter::from_grid_json(file, TableSelection(self.table))?
            }
            (None, None) => return Err(TableIntakeError::NoInput.into()),
        };
        Ok(table)
    }
}

pub(crate) fn run_rank(args: RankArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, LogSink::Stderr)?;

    let report = build_report(&args, &config.ranking)?;
    let view = args.export_view();

    match &args.output {
        Some(path) => {
            write_export(&report, view, path)?;
            info!(path = %path.display(), ?view, "wrote draw order");
        }
        None => report.write_csv(view, std::io::stdout().lock())?,
    }

    if let Some(path) = &args.plan_output {
        if report.plan().is_some() {
            write_export(&report, ExportView::Plan, path)?;
            info!(path = %path.display(), "wrote draw plan");
        } else {
            warn!("--plan-output needs a positive --target; no plan written");
        }
    }

    Ok(())
}

fn build_report(
    args: &RankArgs,
    defaults: &RankingDefaults,
) -> Result<DrawOrderReport, AppError> {
    let table = args.load_table()?;
    let params = ranking_params(defaults, args.window, args.target, args.alm_options())?;
    let today = args.today.unwrap_or_else(|| defaults.today());

    let report = DrawOrderEngine::new(params)?.run(&table, today)?;
    Ok(report)
}

fn write_export(report: &DrawOrderReport, view: ExportView, path: &Path) -> Result<(), AppError> {
    let file = File::create(path)?;
    report.write_csv(view, BufWriter::new(file))?;
    Ok(())
}
