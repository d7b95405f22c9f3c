use super::domain::AlmAssessment;
use super::DrawOrderError;
use serde::{Deserialize, Serialize};

const YEAR: u32 = 365;
const BUCKET_COUNT: usize = 16;

/// Inclusive day range of an ALM maturity bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AlmBucket {
    pub label: &'static str,
    pub min_days: u32,
    pub max_days: u32,
}

impl AlmBucket {
    const fn new(label: &'static str, min_days: u32, max_days: u32) -> Self {
        Self {
            label,
            min_days,
            max_days,
        }
    }

    pub fn contains(&self, days: i64) -> bool {
        days >= i64::from(self.min_days) && days <= i64::from(self.max_days)
    }
}

/// Contiguous maturity buckets, 30-day months and 365-day years.
pub static ALM_BUCKETS: [AlmBucket; BUCKET_COUNT] = [
    AlmBucket::new("0 Days to 7 Days", 0, 7),
    AlmBucket::new("8 Days to 14 Days", 8, 14),
    AlmBucket::new("15 Days to 30 Days", 15, 30),
    AlmBucket::new("Over 1 Months & upto 2 Months", 31, 60),
    AlmBucket::new("Over 2 Months & upto 6 Months", 61, 180),
    AlmBucket::new("Over 6 Months & upto 12 Months", 181, YEAR),
    AlmBucket::new("Over 1 Years & upto 3 Years", YEAR + 1, YEAR * 3),
    AlmBucket::new("Over 3 Years & upto 5 Years", YEAR * 3 + 1, YEAR * 5),
    AlmBucket::new("Over 5 Years & upto 7 Years", YEAR * 5 + 1, YEAR * 7),
    AlmBucket::new("Over 7 Years & upto 10 Years", YEAR * 7 + 1, YEAR * 10),
    AlmBucket::new("Over 10 Years & upto 12 Years", YEAR * 10 + 1, YEAR * 12),
    AlmBucket::new("Over 12 Years & upto 15 Years", YEAR * 12 + 1, YEAR * 15),
    AlmBucket::new("Over 15 Years & upto 18 Years", YEAR * 15 + 1, YEAR * 18),
    AlmBucket::new("Over 18 Years & upto 20 Years", YEAR * 18 + 1, YEAR * 20),
    AlmBucket::new("Over 20 Years & upto 30 Years", YEAR * 20 + 1, YEAR * 30),
    AlmBucket::new("Over 30 Years & upto 50 Years", YEAR * 30 + 1, YEAR * 50),
];

/// Bucket standing in for tenors outside the table under `NeutralBucket`.
const NEUTRAL_BUCKET: usize = 2;

/// What to do with a tenor that falls outside every bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnbucketedPolicy {
    /// Leave the row unbucketed with a zero mismatch.
    #[default]
    #[serde(alias = "none")]
    Zero,
    /// Use the "15 Days to 30 Days" bucket.
    #[serde(alias = "neutral")]
    NeutralBucket,
    /// Use the longest bucket.
    #[serde(alias = "clamp", alias = "longest")]
    ClampToLongest,
}

impl UnbucketedPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "zero" | "none" => Some(Self::Zero),
            "neutral" | "neutral_bucket" => Some(Self::NeutralBucket),
            "clamp" | "clamp_to_longest" | "longest" => Some(Self::ClampToLongest),
            _ => None,
        }
    }

    fn fallback_bucket(self) -> Option<usize> {
        match self {
            Self::Zero => None,
            Self::NeutralBucket => Some(NEUTRAL_BUCKET),
            Self::ClampToLongest => Some(BUCKET_COUNT - 1),
        }
    }
}

/// Per-bucket funding gap and the weight applied to it when ranking.
///
/// Positive mismatch means a net outflow in that bucket, so lines maturing
/// there are pulled forward.
#[derive(Debug, Clone, PartialEq)]
pub struct AlmProfile {
    mismatch: [f64; BUCKET_COUNT],
    weight: f64,
    unbucketed: UnbucketedPolicy,
}

impl AlmProfile {
    pub fn new(weight: f64) -> Self {
        Self {
            mismatch: [0.0; BUCKET_COUNT],
            weight,
            unbucketed: UnbucketedPolicy::default(),
        }
    }

    pub fn with_unbucketed(mut self, policy: UnbucketedPolicy) -> Self {
        self.unbucketed = policy;
        self
    }

    /// Sets the mismatch for the bucket whose label matches, ignoring case and spacing.
    pub fn set_mismatch(&mut self, label: &str, amount: f64) -> Result<(), DrawOrderError> {
        let index = bucket_index(label)
            .ok_or_else(|| DrawOrderError::UnknownAlmBucket(label.to_string()))?;
        if !amount.is_finite() {
            return Err(DrawOrderError::InvalidAlmMismatch {
                bucket: ALM_BUCKETS[index].label,
                amount,
            });
        }
        self.mismatch[index] = amount;
        Ok(())
    }

    pub fn with_mismatch(mut self, label: &str, amount: f64) -> Result<Self, DrawOrderError> {
        self.set_mismatch(label, amount)?;
        Ok(self)
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn unbucketed(&self) -> UnbucketedPolicy {
        self.unbucketed
    }

    pub fn mismatch_for(&self, label: &str) -> Option<f64> {
        bucket_index(label).map(|index| self.mismatch[index])
    }

    pub(crate) fn assess(&self, effective_tenor_days: f64) -> AlmAssessment {
        let index = bucket_for_days(effective_tenor_days)
            .or_else(|| self.unbucketed.fallback_bucket());
        let mismatch = index.map_or(0.0, |index| self.mismatch[index]);

        AlmAssessment {
            bucket_label: index.map(|index| ALM_BUCKETS[index].label),
            mismatch,
            priority_score: priority_score(self.weight, mismatch),
        }
    }
}

/// Index of the bucket containing the rounded tenor.
pub fn bucket_for_days(tenor_days: f64) -> Option<usize> {
    if !tenor_days.is_finite() {
        return None;
    }
    let days = tenor_days.round() as i64;
    ALM_BUCKETS.iter().position(|bucket| bucket.contains(days))
}

fn bucket_index(label: &str) -> Option<usize> {
    let wanted = squash(label);
    ALM_BUCKETS
        .iter()
        .position(|bucket| squash(bucket.label) == wanted)
}

fn squash(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// More negative sorts earlier. A zero product is normalised so `-0.0` never appears.
fn priority_score(weight: f64, mismatch: f64) -> f64 {
    let score = -(weight * mismatch);
    if score == 0.0 {
        0.0
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_are_contiguous_and_ordered() {
        assert_eq!(ALM_BUCKETS[0].min_days, 0);
        for pair in ALM_BUCKETS.windows(2) {
            assert_eq!(pair[0].max_days + 1, pair[1].min_days);
        }
        assert_eq!(ALM_BUCKETS[15].max_days, 365 * 50);
    }

    #[test]
    fn tenor_is_rounded_before_bucketing() {
        assert_eq!(bucket_for_days(7.4), Some(0));
        assert_eq!(bucket_for_days(7.5), Some(1));
        assert_eq!(
            bucket_for_days(2920.0).map(|index| ALM_BUCKETS[index].label),
            Some("Over 7 Years & upto 10 Years")
        );
        assert_eq!(bucket_for_days(365.0 * 50.0 + 1.0), None);
        assert_eq!(bucket_for_days(-3.0), None);
    }

    #[test]
    fn labels_match_loosely() {
        let mut profile = AlmProfile::new(1.0);
        profile
            .set_mismatch("  over 7 years &  UPTO 10 years", 1_000.0)
            .expect("known bucket");
        assert_eq!(profile.mismatch_for("Over 7 Years & upto 10 Years"), Some(1_000.0));

        let error = profile.set_mismatch("Over 60 Years", 1.0).expect_err("unknown");
        assert!(matches!(error, DrawOrderError::UnknownAlmBucket(_)));
    }

    #[test]
    fn outflow_buckets_score_more_negative() {
        let profile = AlmProfile::new(3.0)
            .with_mismatch("Over 2 Months & upto 6 Months", 500.0)
            .expect("bucket")
            .with_mismatch("0 Days to 7 Days", -200.0)
            .expect("bucket");

        let outflow = profile.assess(90.0);
        assert_eq!(outflow.bucket_label, Some("Over 2 Months & upto 6 Months"));
        assert_eq!(outflow.priority_score, -1_500.0);

        let inflow = profile.assess(3.0);
        assert_eq!(inflow.priority_score, 600.0);

        let untouched = profile.assess(400.0);
        assert_eq!(untouched.priority_score, 0.0);
        assert!(untouched.priority_score.is_sign_positive());
    }

    #[test]
    fn unbucketed_policies() {
        let profile = AlmProfile::new(1.0)
            .with_mismatch("15 Days to 30 Days", 10.0)
            .expect("bucket")
            .with_mismatch("Over 30 Years & upto 50 Years", 20.0)
            .expect("bucket");
        let beyond = 365.0 * 60.0;

        let zero = profile.assess(beyond);
        assert_eq!(zero.bucket_label, None);
        assert_eq!(zero.mismatch, 0.0);

        let neutral = profile
            .clone()
            .with_unbucketed(UnbucketedPolicy::NeutralBucket)
            .assess(beyond);
        assert_eq!(neutral.bucket_label, Some("15 Days to 30 Days"));
        assert_eq!(neutral.priority_score, -10.0);

        let clamped = profile
            .with_unbucketed(UnbucketedPolicy::ClampToLongest)
            .assess(beyond);
        assert_eq!(clamped.bucket_label, Some("Over 30 Years & upto 50 Years"));
        assert_eq!(clamped.mismatch, 20.0);
    }

    #[test]
    fn zero_weight_disables_priority() {
        let profile = AlmProfile::new(0.0)
            .with_mismatch("0 Days to 7 Days", 1e9)
            .expect("bucket");
        let assessment = profile.assess(5.0);
        assert_eq!(assessment.mismatch, 1e9);
        assert_eq!(assessment.priority_score, 0.0);
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!(UnbucketedPolicy::parse("Zero"), Some(UnbucketedPolicy::Zero));
        assert_eq!(
            UnbucketedPolicy::parse(" neutral "),
            Some(UnbucketedPolicy::NeutralBucket)
        );
        assert_eq!(
            UnbucketedPolicy::parse("clamp"),
            Some(UnbucketedPolicy::ClampToLongest)
        );
        assert_eq!(UnbucketedPolicy::parse("ignore"), None);
    }

    #[test]
    fn policy_short_names_deserialize() {
        let names = r#"["zero", "neutral", "clamp", "neutral_bucket", "clamp_to_longest"]"#;
        let parsed: Vec<UnbucketedPolicy> = serde_json::from_str(names).expect("policy names");
        assert_eq!(
            parsed,
            vec![
                UnbucketedPolicy::Zero,
                UnbucketedPolicy::NeutralBucket,
                UnbucketedPolicy::ClampToLongest,
                UnbucketedPolicy::NeutralBucket,
                UnbucketedPolicy::ClampToLongest,
            ]
        );
    }
}
