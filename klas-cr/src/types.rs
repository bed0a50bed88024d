//! Core types for coverage evaluation and reporting

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Readiness classification of one grade/subject cell.
///
/// Never persisted: always recomputed from current counts and thresholds.
/// Variant order gives the tier ordering used for gating and worst-first
/// sorting (`Empty < Thin < Beta < Ready`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageStatus {
    Empty,
    Thin,
    Beta,
    Ready,
}

impl CoverageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageStatus::Empty => "empty",
            CoverageStatus::Thin => "thin",
            CoverageStatus::Beta => "beta",
            CoverageStatus::Ready => "ready",
        }
    }
}

/// Raw aggregate counts for one grade/subject cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellCounts {
    pub module_count: i64,
    pub lesson_count: i64,
    pub question_count: i64,
    /// Strands in the cell whose lesson count meets the per-strand minimum
    pub strands_meeting_min: i64,
    pub total_strands: i64,
}

impl CellCounts {
    pub fn avg_questions_per_lesson(&self) -> f64 {
        if self.lesson_count == 0 {
            0.0
        } else {
            self.question_count as f64 / self.lesson_count as f64
        }
    }
}

/// Derived coverage of one grade/subject cell (computed, never stored)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeSubjectCoverage {
    pub grade: String,
    pub subject: String,
    pub status: CoverageStatus,
    pub counts: CellCounts,
    pub avg_questions_per_lesson: f64,
    /// Human-readable shortfalls, present only for cells below ready
    pub details: Vec<String>,
}

/// One entry in the worst-gaps list of a coverage summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapSummaryEntry {
    pub grade: String,
    pub subject: String,
    pub status: CoverageStatus,
    pub detail: String,
}

/// Operator-facing rollup of the coverage snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageSummary {
    pub total_cells: usize,
    pub ready_count: usize,
    pub beta_count: usize,
    pub thin_count: usize,
    pub empty_count: usize,
    /// Percentage of in-scope cells at ready
    pub ready_percent: f64,
    pub top_gaps: Vec<GapSummaryEntry>,
    pub generated_at: DateTime<Utc>,
}

/// What to do when a readiness lookup fails mid-filter.
///
/// `PassThrough` is a deliberate availability-over-gating choice: readiness
/// filtering gates recommendation surfacing, not correctness, so a failed
/// lookup returns the candidate set unfiltered rather than hiding content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradeMode {
    /// Return the unfiltered input set
    PassThrough,
    /// Return no modules at all
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_tier_ordering() {
        assert!(CoverageStatus::Empty < CoverageStatus::Thin);
        assert!(CoverageStatus::Thin < CoverageStatus::Beta);
        assert!(CoverageStatus::Beta < CoverageStatus::Ready);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&CoverageStatus::Ready).unwrap(),
            "\"ready\""
        );
        assert_eq!(
            serde_json::from_str::<CoverageStatus>("\"beta\"").unwrap(),
            CoverageStatus::Beta
        );
    }

    #[test]
    fn avg_questions_handles_zero_lessons() {
        let counts = CellCounts::default();
        assert_eq!(counts.avg_questions_per_lesson(), 0.0);

        let counts = CellCounts {
            lesson_count: 10,
            question_count: 25,
            ..Default::default()
        };
        assert_eq!(counts.avg_questions_per_lesson(), 2.5);
    }
}
