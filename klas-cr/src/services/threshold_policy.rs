//! Coverage threshold policy
//!
//! Pure lookup from (grade, subject) to the full "ready" threshold tier,
//! with the relaxed "beta" tier derived proportionally so it can never
//! exceed the full tier. Also answers which grade/subject cells are part of
//! the current launch scope at all.

use klas_common::grades::{is_high_school, GRADE_ORDER};
use serde::{Deserialize, Serialize};

/// Minimum-content thresholds defining one readiness tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageThresholds {
    pub min_lessons_per_strand: i64,
    pub min_questions_per_lesson: i64,
    pub min_total_lessons: i64,
    pub min_modules: i64,
}

/// Default full-tier thresholds applied where no override matches
pub const DEFAULT_THRESHOLDS: CoverageThresholds = CoverageThresholds {
    min_lessons_per_strand: 2,
    min_questions_per_lesson: 4,
    min_total_lessons: 20,
    min_modules: 5,
};

// Hard floors for the derived beta tier
const BETA_FLOOR_LESSONS_PER_STRAND: i64 = 1;
const BETA_FLOOR_QUESTIONS_PER_LESSON: i64 = 2;
const BETA_FLOOR_TOTAL_LESSONS: i64 = 8;
const BETA_FLOOR_MODULES: i64 = 3;

/// Fraction of a cell's strands that must meet the per-strand lesson
/// minimum for the cell to count as ready (70%)
pub const STRAND_COVERAGE_PERCENT: i64 = 70;

/// Subjects launched for grades K through 8
pub const CORE_SUBJECTS: [&str; 4] = [
    "English Language Arts",
    "Mathematics",
    "Science",
    "Social Studies",
];

/// Subjects launched for grades 9 through 12
pub const HIGH_SCHOOL_SUBJECTS: [&str; 2] = ["Mathematics", "Science"];

/// Sparse per-(grade, subject) threshold override; set fields win, unset
/// fields fall back to the defaults.
#[derive(Debug, Clone, Copy, Default)]
struct ThresholdOverrides {
    min_lessons_per_strand: Option<i64>,
    min_questions_per_lesson: Option<i64>,
    min_total_lessons: Option<i64>,
    min_modules: Option<i64>,
}

fn overrides_for(grade: &str, subject: &str) -> ThresholdOverrides {
    // Early-grade courses are shorter: fewer lessons overall, thinner strands
    if matches!(grade, "K" | "1" | "2") {
        return ThresholdOverrides {
            min_lessons_per_strand: Some(1),
            min_total_lessons: Some(12),
            ..Default::default()
        };
    }

    // Specialized high-school courses run fewer, larger modules
    if is_high_school(grade) && subject == "Science" {
        return ThresholdOverrides {
            min_modules: Some(3),
            ..Default::default()
        };
    }

    ThresholdOverrides::default()
}

/// Full "ready" tier thresholds for a grade/subject cell
pub fn thresholds_for(grade: &str, subject: &str) -> CoverageThresholds {
    let overrides = overrides_for(grade, subject);
    CoverageThresholds {
        min_lessons_per_strand: overrides
            .min_lessons_per_strand
            .unwrap_or(DEFAULT_THRESHOLDS.min_lessons_per_strand),
        min_questions_per_lesson: overrides
            .min_questions_per_lesson
            .unwrap_or(DEFAULT_THRESHOLDS.min_questions_per_lesson),
        min_total_lessons: overrides
            .min_total_lessons
            .unwrap_or(DEFAULT_THRESHOLDS.min_total_lessons),
        min_modules: overrides
            .min_modules
            .unwrap_or(DEFAULT_THRESHOLDS.min_modules),
    }
}

/// Relaxed "beta" tier, derived from the full tier.
///
/// Each component is `min(hard floor, about half the full value)`, except
/// total lessons which uses 40%. Beta is therefore component-wise at or
/// below full by construction and needs no separate consistency check.
pub fn beta_thresholds_for(grade: &str, subject: &str) -> CoverageThresholds {
    let full = thresholds_for(grade, subject);
    CoverageThresholds {
        min_lessons_per_strand: BETA_FLOOR_LESSONS_PER_STRAND
            .min(half_rounded_up(full.min_lessons_per_strand)),
        min_questions_per_lesson: BETA_FLOOR_QUESTIONS_PER_LESSON
            .min(half_rounded_up(full.min_questions_per_lesson)),
        min_total_lessons: BETA_FLOOR_TOTAL_LESSONS.min(full.min_total_lessons * 2 / 5),
        min_modules: BETA_FLOOR_MODULES.min(half_rounded_up(full.min_modules)),
    }
}

fn half_rounded_up(value: i64) -> i64 {
    (value + 1) / 2
}

/// Whether a grade/subject pair is part of the current launch scope.
/// Out-of-scope cells are never evaluated, surfaced, or backfilled.
pub fn is_in_scope(grade: &str, subject: &str) -> bool {
    if is_high_school(grade) {
        return HIGH_SCHOOL_SUBJECTS.contains(&subject);
    }
    GRADE_ORDER.contains(&grade) && CORE_SUBJECTS.contains(&subject)
}

/// Every in-scope (grade, subject) cell, in no particular order
pub fn launch_cells() -> Vec<(&'static str, &'static str)> {
    let mut cells = Vec::new();
    for grade in GRADE_ORDER {
        let subjects: &[&str] = if is_high_school(grade) {
            &HIGH_SCHOOL_SUBJECTS
        } else {
            &CORE_SUBJECTS
        };
        for subject in subjects {
            cells.push((grade, *subject));
        }
    }
    cells
}
