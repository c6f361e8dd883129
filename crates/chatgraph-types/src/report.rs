use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// -- Degrees --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegreeKind {
    /// Sum of incident edge weights
    #[default]
    Weighted,
    /// Number of distinct neighbours
    Count,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegreeSummary {
    pub kind: DegreeKind,
    pub nodes: usize,
    pub isolates: usize,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub std_dev: f64,
}

// -- Power-law fit --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerLawFit {
    /// Fitted exponent b in p(s) ∝ s^-b
    pub alpha: f64,
    pub xmin: u64,
    /// Number of observations with s >= xmin
    pub n_tail: usize,
    /// Standard error of alpha
    pub sigma: f64,
    /// Kolmogorov-Smirnov distance on the tail
    pub ks_distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub group_id: i64,
    pub generated_at: DateTime<Utc>,
    pub degrees: DegreeSummary,
    pub fit: PowerLawFit,
}
