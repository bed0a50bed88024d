//! Grade-band ordering helpers
//!
//! Grade bands are stored as short strings ("K", "1" .. "12"). Reports are
//! always sorted in the canonical K-first ordering, never lexically
//! ("10" must sort after "9", not after "1").

/// Canonical grade-band ordering for reports
pub const GRADE_ORDER: [&str; 13] = [
    "K", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12",
];

/// Sort key for a grade band: K = 0, "1" = 1, .. "12" = 12.
///
/// Unknown bands sort after all known ones so malformed data surfaces at
/// the bottom of a report instead of disappearing.
pub fn grade_sort_key(grade: &str) -> i64 {
    if grade.eq_ignore_ascii_case("K") {
        return 0;
    }
    match grade.parse::<i64>() {
        Ok(n) if (1..=12).contains(&n) => n,
        _ => i64::MAX,
    }
}

/// True for grade bands 9 through 12
pub fn is_high_school(grade: &str) -> bool {
    matches!(grade, "9" | "10" | "11" | "12")
}
