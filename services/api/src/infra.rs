use chrono::NaiveDate;
use draw_order::config::RankingDefaults;
use draw_order::workflows::draw::{AlmProfile, DrawOrderError, RankingParams, UnbucketedPolicy};
use draw_order::workflows::intake::SheetSelection;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) ranking: RankingDefaults,
}

/// ALM settings supplied by a caller; unset fields fall back to configured defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct AlmOptions {
    #[serde(default)]
    pub(crate) weight: Option<f64>,
    /// Bucket label to mismatch amount.
    #[serde(default)]
    pub(crate) mismatch: BTreeMap<String, f64>,
    #[serde(default)]
    pub(crate) unbucketed: Option<UnbucketedPolicy>,
}

pub(crate) fn ranking_params(
    defaults: &RankingDefaults,
    near_window_days: Option<u32>,
    target_amount: Option<f64>,
    alm: Option<AlmOptions>,
) -> Result<RankingParams, DrawOrderError> {
    let mut params = RankingParams::new(near_window_days.unwrap_or(defaults.near_window_days))
        .with_target(target_amount.unwrap_or(0.0));

    if let Some(options) = alm {
        let mut profile = AlmProfile::new(options.weight.unwrap_or(defaults.alm_weight))
            .with_unbucketed(options.unbucketed.unwrap_or(defaults.unbucketed));
        for (label, amount) in &options.mismatch {
            profile.set_mismatch(label, *amount)?;
        }
        params = params.with_alm(profile);
    }

    params.validate()?;
    Ok(params)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}

/// Parses `LABEL=AMOUNT`, splitting on the last `=` so labels may contain one.
pub(crate) fn parse_mismatch(raw: &str) -> Result<(String, f64), String> {
    let (label, amount) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected LABEL=AMOUNT, got '{raw}'"))?;
    let amount = amount
        .trim()
        .replace(',', "")
        .parse::<f64>()
        .map_err(|err| format!("invalid mismatch amount in '{raw}' ({err})"))?;
    Ok((label.trim().to_string(), amount))
}

pub(crate) fn parse_sheet(raw: &str) -> Result<SheetSelection, String> {
    if raw.trim().is_empty() {
        return Err("sheet must be a 1-based position or a sheet name".to_string());
    }
    Ok(SheetSelection::parse(raw))
}

pub(crate) fn parse_unbucketed(raw: &str) -> Result<UnbucketedPolicy, String> {
    UnbucketedPolicy::parse(raw)
        .ok_or_else(|| format!("unknown unbucketed policy '{raw}' (zero, neutral, clamp)"))
}
