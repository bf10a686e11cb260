use crate::models::{
    AdmissionRecord, FilterCategory, ProgramKey, ProgramRankSummary, WeightedSummaryRow,
    YearlyRankRow,
};
use std::collections::BTreeMap;

const IIT_KEYWORD: &str = "indian institute of technology";
const EXCLUDED_PROGRAM_KEYWORDS: [&str; 2] = ["bachelor of architecture", "bachelor of planning"];

/// Stage 1: turns the concatenated round records of one year into a
/// preference-ranked program list for one filter category.
pub struct ProgramRanker {
    category: FilterCategory,
}

/// Running min/max of ranks for one program entry across rounds.
struct RankRange {
    opening: u32,
    closing: u32,
}

impl ProgramRanker {
    pub fn new(category: FilterCategory) -> Self {
        Self { category }
    }

    /// Category predicate over one record. Both categories require an
    /// open, gender-neutral seat under the AI or OS quota; they then
    /// partition on the institute name (and, for non-IIT, on the degree).
    pub fn matches(&self, record: &AdmissionRecord) -> bool {
        let quota_ok = matches!(record.quota.as_str(), "AI" | "OS");
        if !quota_ok || record.seat_type != "OPEN" || record.gender != "Gender-Neutral" {
            return false;
        }

        let is_iit = record.institute.to_lowercase().contains(IIT_KEYWORD);
        match self.category {
            FilterCategory::Iit => is_iit,
            FilterCategory::NonIit => {
                let program = record.program.to_lowercase();
                !is_iit
                    && !EXCLUDED_PROGRAM_KEYWORDS
                        .iter()
                        .any(|keyword| program.contains(keyword))
            }
        }
    }

    /// Filter, drop null-rank rows, group by (institute, program, quota)
    /// with min opening / max closing, then order by closing rank and
    /// assign the 1-based preference rank.
    pub fn rank_programs(&self, records: &[AdmissionRecord]) -> Vec<ProgramRankSummary> {
        let mut groups: BTreeMap<ProgramKey, RankRange> = BTreeMap::new();

        for record in records {
            if !self.matches(record) {
                continue;
            }
            let Some((opening, closing)) = record.rank_pair() else {
                continue;
            };

            let key = ProgramKey {
                institute: record.institute.clone(),
                program: record.program.clone(),
                quota: record.quota.clone(),
            };
            groups
                .entry(key)
                .and_modify(|range| {
                    range.opening = range.opening.min(opening);
                    range.closing = range.closing.max(closing);
                })
                .or_insert(RankRange { opening, closing });
        }

        // Groups come out in key order; the stable sort keeps that order
        // for equal closing ranks, so re-runs are byte-identical.
        let mut summaries: Vec<ProgramRankSummary> = groups
            .into_iter()
            .map(|(key, range)| ProgramRankSummary {
                key,
                opening_rank: range.opening,
                closing_rank: range.closing,
                preference_rank: 0,
            })
            .collect();
        summaries.sort_by_key(|summary| summary.closing_rank);
        for (position, summary) in summaries.iter_mut().enumerate() {
            summary.preference_rank = position as u32 + 1;
        }

        summaries
    }
}

/// Per-group accumulator for the weighted cross-year averages.
#[derive(Default)]
struct WeightedSums {
    weight: f64,
    preference: f64,
    opening: f64,
    closing: f64,
}

/// Stage 2: weighted averages of the per-year rank metrics across years,
/// ordered by average preference rank (lower is better). Each input row
/// carries the weight of the year it came from.
pub fn weighted_average_rankings(rows: &[(YearlyRankRow, u32)]) -> Vec<WeightedSummaryRow> {
    let mut groups: BTreeMap<ProgramKey, WeightedSums> = BTreeMap::new();

    for (row, weight) in rows {
        let sums = groups.entry(row.key()).or_default();
        let weight = *weight as f64;
        sums.weight += weight;
        sums.preference += row.preference_rank as f64 * weight;
        sums.opening += row.opening_rank as f64 * weight;
        sums.closing += row.closing_rank as f64 * weight;
    }

    let mut summaries: Vec<WeightedSummaryRow> = groups
        .into_iter()
        .map(|(key, sums)| WeightedSummaryRow {
            key,
            avg_preference_rank: round2(sums.preference / sums.weight),
            avg_opening_rank: (sums.opening / sums.weight).round() as u32,
            avg_closing_rank: (sums.closing / sums.weight).round() as u32,
        })
        .collect();
    summaries.sort_by(|a, b| {
        a.avg_preference_rank
            .partial_cmp(&b.avg_preference_rank)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    summaries
}

/// Round half away from zero to two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        institute: &str,
        program: &str,
        quota: &str,
        opening: Option<u32>,
        closing: Option<u32>,
    ) -> AdmissionRecord {
        AdmissionRecord {
            institute: institute.to_string(),
            program: program.to_string(),
            quota: quota.to_string(),
            seat_type: "OPEN".to_string(),
            gender: "Gender-Neutral".to_string(),
            opening_rank: opening,
            closing_rank: closing,
        }
    }

    fn rank_row(institute: &str, preference: u32, opening: u32, closing: u32) -> YearlyRankRow {
        YearlyRankRow {
            institute: institute.to_string(),
            program: "B.Tech".to_string(),
            quota: "AI".to_string(),
            opening_rank: opening,
            closing_rank: closing,
            preference_rank: preference,
        }
    }

    #[test]
    fn test_rounds_merge_to_min_opening_max_closing() {
        // Two rounds of the same program entry: round 2 closes earlier.
        let records = vec![
            record("Indian Institute of Technology X", "B.Tech", "AI", Some(10), Some(20)),
            record("Indian Institute of Technology X", "B.Tech", "AI", Some(10), Some(15)),
        ];

        let summaries = ProgramRanker::new(FilterCategory::Iit).rank_programs(&records);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].opening_rank, 10);
        assert_eq!(summaries[0].closing_rank, 20);
        assert_eq!(summaries[0].preference_rank, 1);
    }

    #[test]
    fn test_missing_ranks_are_dropped() {
        let records = vec![
            record("Inst A", "B.Tech", "AI", Some(5), None),
            record("Inst B", "B.Tech", "AI", None, Some(9)),
            record("Inst C", "B.Tech", "AI", Some(1), Some(2)),
        ];

        let summaries = ProgramRanker::new(FilterCategory::NonIit).rank_programs(&records);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].key.institute, "Inst C");
    }

    #[test]
    fn test_preference_rank_is_dense_and_follows_closing_rank() {
        let records = vec![
            record("Inst A", "B.Tech", "AI", Some(100), Some(300)),
            record("Inst B", "B.Tech", "AI", Some(50), Some(90)),
            record("Inst C", "B.Tech", "OS", Some(10), Some(700)),
        ];

        let summaries = ProgramRanker::new(FilterCategory::NonIit).rank_programs(&records);
        let ranks: Vec<u32> = summaries.iter().map(|s| s.preference_rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);

        assert_eq!(summaries[0].key.institute, "Inst B");
        assert_eq!(summaries[0].closing_rank, 90);
        assert_eq!(summaries[2].key.institute, "Inst C");
    }

    #[test]
    fn test_closing_rank_ties_keep_key_order() {
        let records = vec![
            record("Inst B", "B.Tech", "AI", Some(1), Some(50)),
            record("Inst A", "B.Tech", "AI", Some(1), Some(50)),
        ];

        let summaries = ProgramRanker::new(FilterCategory::NonIit).rank_programs(&records);
        assert_eq!(summaries[0].key.institute, "Inst A");
        assert_eq!(summaries[0].preference_rank, 1);
        assert_eq!(summaries[1].key.institute, "Inst B");
        assert_eq!(summaries[1].preference_rank, 2);
    }

    #[test]
    fn test_shared_predicate_rejects_other_seats() {
        let ranker = ProgramRanker::new(FilterCategory::NonIit);

        let mut wrong_quota = record("Inst A", "B.Tech", "HS", Some(1), Some(2));
        assert!(!ranker.matches(&wrong_quota));
        wrong_quota.quota = "OS".to_string();
        assert!(ranker.matches(&wrong_quota));

        let mut reserved = record("Inst A", "B.Tech", "AI", Some(1), Some(2));
        reserved.seat_type = "EWS".to_string();
        assert!(!ranker.matches(&reserved));

        let mut female_only = record("Inst A", "B.Tech", "AI", Some(1), Some(2));
        female_only.gender = "Female-only (including Supernumerary)".to_string();
        assert!(!ranker.matches(&female_only));
    }

    #[test]
    fn test_categories_are_mutually_exclusive() {
        let noniit = ProgramRanker::new(FilterCategory::NonIit);
        let iit = ProgramRanker::new(FilterCategory::Iit);

        let samples = vec![
            record("Indian Institute of Technology Bombay", "B.Tech", "AI", Some(1), Some(2)),
            record("INDIAN INSTITUTE OF TECHNOLOGY Delhi", "B.Arch", "OS", Some(1), Some(2)),
            record("National Institute of Technology Trichy", "B.Tech", "OS", Some(1), Some(2)),
            record("School of Planning and Architecture", "Bachelor of Planning", "AI", Some(1), Some(2)),
        ];
        for sample in &samples {
            assert!(
                !(noniit.matches(sample) && iit.matches(sample)),
                "{} matched both categories",
                sample.institute
            );
        }
    }

    #[test]
    fn test_architecture_excluded_from_noniit_but_allowed_for_iit() {
        let arch_non_iit = record(
            "School of Planning and Architecture",
            "Bachelor of Architecture (5 Years)",
            "AI",
            Some(1),
            Some(2),
        );
        let arch_iit = record(
            "Indian Institute of Technology Roorkee",
            "Bachelor of Architecture (5 Years)",
            "AI",
            Some(1),
            Some(2),
        );

        assert!(!ProgramRanker::new(FilterCategory::NonIit).matches(&arch_non_iit));
        assert!(ProgramRanker::new(FilterCategory::Iit).matches(&arch_iit));
    }

    #[test]
    fn test_stage1_is_deterministic() {
        let records = vec![
            record("Inst B", "B.Tech", "AI", Some(3), Some(40)),
            record("Inst A", "M.Tech", "OS", Some(7), Some(40)),
            record("Inst A", "B.Tech", "AI", Some(2), Some(30)),
        ];
        let ranker = ProgramRanker::new(FilterCategory::NonIit);
        assert_eq!(ranker.rank_programs(&records), ranker.rank_programs(&records));
    }

    #[test]
    fn test_weighted_average_across_two_years() {
        // 2018 (weight 1) and 2024 (weight 7) for the same program entry.
        let rows = vec![
            (rank_row("Inst A", 10, 100, 200), 1),
            (rank_row("Inst A", 2, 40, 80), 7),
        ];

        let summaries = weighted_average_rankings(&rows);
        assert_eq!(summaries.len(), 1);
        // (10*1 + 2*7) / 8 = 3.0
        assert_eq!(summaries[0].avg_preference_rank, 3.0);
        // (100*1 + 40*7) / 8 = 47.5 -> 48, (200*1 + 80*7) / 8 = 95
        assert_eq!(summaries[0].avg_opening_rank, 48);
        assert_eq!(summaries[0].avg_closing_rank, 95);
    }

    #[test]
    fn test_weighted_summary_sorted_by_preference() {
        let rows = vec![
            (rank_row("Inst Worse", 9, 500, 900), 2),
            (rank_row("Inst Better", 1, 10, 20), 2),
            (rank_row("Inst Better", 3, 12, 30), 6),
        ];

        let summaries = weighted_average_rankings(&rows);
        assert_eq!(summaries[0].key.institute, "Inst Better");
        // (1*2 + 3*6) / 8 = 2.5
        assert_eq!(summaries[0].avg_preference_rank, 2.5);
        assert_eq!(summaries[1].key.institute, "Inst Worse");
        assert_eq!(summaries[1].avg_preference_rank, 9.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round2(10.0 / 3.0), 3.33);
        // Half rounds away from zero (0.125 * 100 is exact in binary).
        assert_eq!(round2(0.125), 0.13);
    }
}
