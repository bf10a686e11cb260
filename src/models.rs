use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data_directory: Option<String>,
    pub first_year: u16,
    pub last_year: u16,
    /// Per-year weights for the cross-year averages, keyed by 4-digit year.
    /// More recent years carry more weight.
    pub year_weights: BTreeMap<String, u32>,
}

impl Default for Config {
    fn default() -> Self {
        let year_weights = (2018u16..=2024)
            .enumerate()
            .map(|(i, year)| (year.to_string(), i as u32 + 1))
            .collect();

        Self {
            data_directory: Some("data".to_string()),
            first_year: 2018,
            last_year: 2024,
            year_weights,
        }
    }
}

impl Config {
    pub fn load_from_file(file_path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(file_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, file_path: &str) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(file_path, content)?;
        Ok(())
    }

    pub fn years(&self) -> RangeInclusive<u16> {
        self.first_year..=self.last_year
    }

    pub fn weight_for(&self, year: &str) -> Option<u32> {
        self.year_weights.get(year).copied()
    }
}

/// The two institute/program partitions the rankings are segmented by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterCategory {
    NonIit,
    Iit,
}

impl FilterCategory {
    pub fn all() -> [FilterCategory; 2] {
        [FilterCategory::NonIit, FilterCategory::Iit]
    }

    pub fn tag(self) -> &'static str {
        match self {
            FilterCategory::NonIit => "noniit",
            FilterCategory::Iit => "iit",
        }
    }
}

impl FromStr for FilterCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "noniit" => Ok(FilterCategory::NonIit),
            "iit" => Ok(FilterCategory::Iit),
            other => Err(anyhow::anyhow!(
                "Unknown filter category '{}' (expected 'noniit' or 'iit')",
                other
            )),
        }
    }
}

impl fmt::Display for FilterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One seat-allocation row from a round file. Columns beyond these are
/// present in the source files but unused and ignored on read.
#[derive(Debug, Clone, Deserialize)]
pub struct AdmissionRecord {
    #[serde(rename = "Institute")]
    pub institute: String,
    #[serde(rename = "Academic Program Name")]
    pub program: String,
    #[serde(rename = "Quota")]
    pub quota: String,
    #[serde(rename = "Seat Type")]
    pub seat_type: String,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "Opening Rank", deserialize_with = "lenient_rank")]
    pub opening_rank: Option<u32>,
    #[serde(rename = "Closing Rank", deserialize_with = "lenient_rank")]
    pub closing_rank: Option<u32>,
}

impl AdmissionRecord {
    /// Both ranks, or None for rows that must be dropped before grouping.
    pub fn rank_pair(&self) -> Option<(u32, u32)> {
        Some((self.opening_rank?, self.closing_rank?))
    }
}

/// Empty or unparseable rank cells become None; the row is dropped later.
/// Values re-written by other tools as floats ("1207.0") truncate to int.
fn lenient_rank<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as u32))
}

/// Grouping key for both aggregation stages: a program entry is unique per
/// institute, program name and quota within a filter category.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProgramKey {
    pub institute: String,
    pub program: String,
    pub quota: String,
}

/// Stage-1 output row: rank range and preference order for one program
/// entry within a single year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramRankSummary {
    pub key: ProgramKey,
    pub opening_rank: u32,
    pub closing_rank: u32,
    pub preference_rank: u32,
}

/// Stage-2 input row, read back from a per-year program-ranks file.
#[derive(Debug, Clone, Deserialize)]
pub struct YearlyRankRow {
    #[serde(rename = "Institute")]
    pub institute: String,
    #[serde(rename = "Academic Program Name")]
    pub program: String,
    #[serde(rename = "Quota")]
    pub quota: String,
    #[serde(rename = "Opening_Rank")]
    pub opening_rank: u32,
    #[serde(rename = "Closing_Rank")]
    pub closing_rank: u32,
    #[serde(rename = "Preference_Rank")]
    pub preference_rank: u32,
}

impl YearlyRankRow {
    pub fn key(&self) -> ProgramKey {
        ProgramKey {
            institute: self.institute.clone(),
            program: self.program.clone(),
            quota: self.quota.clone(),
        }
    }
}

/// Stage-2 output row: weighted multi-year averages for one program entry.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedSummaryRow {
    pub key: ProgramKey,
    pub avg_preference_rank: f64,
    pub avg_opening_rank: u32,
    pub avg_closing_rank: u32,
}
