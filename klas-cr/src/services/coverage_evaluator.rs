//! Coverage status evaluation
//!
//! Pure classification of one grade/subject cell's raw counts into a
//! `CoverageStatus`. The status is recomputed fresh on every call; nothing
//! here reads or writes state.
//!
//! Precedence: empty, then ready, then beta, then thin. Beta thresholds are
//! uniformly at or below the full tier (see `threshold_policy`), so a cell
//! can never satisfy two tiers ambiguously.

use crate::services::threshold_policy::{CoverageThresholds, STRAND_COVERAGE_PERCENT};
use crate::types::{CellCounts, CoverageStatus};

/// Result of evaluating one cell
#[derive(Debug, Clone, PartialEq)]
pub struct CellEvaluation {
    pub status: CoverageStatus,
    /// Specific shortfalls against the full tier; empty for ready cells
    pub details: Vec<String>,
}

/// Classify a cell's counts against the full and beta threshold tiers
pub fn evaluate_cell(
    counts: &CellCounts,
    full: &CoverageThresholds,
    beta: &CoverageThresholds,
) -> CellEvaluation {
    // Terminal floor: no modules or no lessons means there is nothing to
    // grade against thresholds at all.
    if counts.module_count == 0 || counts.lesson_count == 0 {
        let mut details = Vec::new();
        if counts.module_count == 0 {
            details.push("No modules".to_string());
        }
        if counts.lesson_count == 0 {
            details.push("No lessons".to_string());
        }
        return CellEvaluation {
            status: CoverageStatus::Empty,
            details,
        };
    }

    let avg_questions = counts.avg_questions_per_lesson();
    let strand_ok = strand_coverage_ok(counts);

    let meets_full = counts.module_count >= full.min_modules
        && counts.lesson_count >= full.min_total_lessons
        && avg_questions >= full.min_questions_per_lesson as f64
        && strand_ok;

    if meets_full {
        return CellEvaluation {
            status: CoverageStatus::Ready,
            details: Vec::new(),
        };
    }

    // Strand coverage is not required for beta
    let meets_beta = counts.module_count >= beta.min_modules
        && counts.lesson_count >= beta.min_total_lessons
        && avg_questions >= beta.min_questions_per_lesson as f64;

    let status = if meets_beta {
        CoverageStatus::Beta
    } else {
        CoverageStatus::Thin
    };

    CellEvaluation {
        status,
        details: shortfall_details(counts, full, avg_questions, strand_ok),
    }
}

/// A cell with no strands at all trivially satisfies strand coverage
fn strand_coverage_ok(counts: &CellCounts) -> bool {
    counts.total_strands == 0
        || counts.strands_meeting_min * 100 >= counts.total_strands * STRAND_COVERAGE_PERCENT
}

fn shortfall_details(
    counts: &CellCounts,
    full: &CoverageThresholds,
    avg_questions: f64,
    strand_ok: bool,
) -> Vec<String> {
    let mut details = Vec::new();
    if counts.module_count < full.min_modules {
        details.push(format!(
            "Only {}/{} modules",
            counts.module_count, full.min_modules
        ));
    }
    if counts.lesson_count < full.min_total_lessons {
        details.push(format!(
            "Only {}/{} lessons",
            counts.lesson_count, full.min_total_lessons
        ));
    }
    if avg_questions < full.min_questions_per_lesson as f64 {
        details.push(format!(
            "Avg {:.1} questions/lesson (need {})",
            avg_questions, full.min_questions_per_lesson
        ));
    }
    if !strand_ok {
        details.push(format!(
            "Strand coverage {}/{} (need {}%)",
            counts.strands_meeting_min, counts.total_strands, STRAND_COVERAGE_PERCENT
        ));
    }
    details
}
