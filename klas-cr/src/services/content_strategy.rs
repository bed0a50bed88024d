//! Pluggable text generation for backfilled content
//!
//! The gap filler guarantees the numeric baselines; what the generated
//! items actually say is a separate concern behind this trait. The shipped
//! implementation produces placeholder text so backfilled cells are usable
//! in review builds, and a content team can swap in a real generator
//! without touching the backfill mechanics.

use klas_common::db::models::{ItemOption, Module};

/// Text source for backfilled practice items and assessments
pub trait ItemContentStrategy: Send + Sync {
    /// Stem for the `ordinal`-th practice item on a module (1-based,
    /// counting existing items)
    fn practice_stem(&self, module: &Module, ordinal: i64) -> String;

    /// One correct option and three plausible-wrong options
    fn options(&self, module: &Module) -> Vec<ItemOption>;

    fn assessment_title(&self, module: &Module) -> String;
}

/// Placeholder text generator
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderContent;

impl ItemContentStrategy for PlaceholderContent {
    fn practice_stem(&self, module: &Module, ordinal: i64) -> String {
        format!("Practice question {} for {}", ordinal, module.title)
    }

    fn options(&self, _module: &Module) -> Vec<ItemOption> {
        vec![
            ItemOption {
                text: "Correct answer (on-grade)".to_string(),
                correct: true,
            },
            ItemOption {
                text: "Plausible but incorrect option 1".to_string(),
                correct: false,
            },
            ItemOption {
                text: "Plausible but incorrect option 2".to_string(),
                correct: false,
            },
            ItemOption {
                text: "Plausible but incorrect option 3".to_string(),
                correct: false,
            },
        ]
    }

    fn assessment_title(&self, module: &Module) -> String {
        format!("{} Baseline Check", module.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module() -> Module {
        Module {
            id: 1,
            slug: "m-ratios".to_string(),
            title: "Ratios and Rates".to_string(),
            subject: "Mathematics".to_string(),
            grade_band: "6".to_string(),
            strand: None,
            topic: None,
            standard_code: Some("6.RP.A.1".to_string()),
            practice_target: None,
        }
    }

    #[test]
    fn placeholder_options_have_exactly_one_correct() {
        let options = PlaceholderContent.options(&module());
        assert_eq!(options.len(), 4);
        assert_eq!(options.iter().filter(|o| o.correct).count(), 1);
    }

    #[test]
    fn stems_are_distinct_per_ordinal() {
        let strategy = PlaceholderContent;
        let m = module();
        assert_ne!(strategy.practice_stem(&m, 1), strategy.practice_stem(&m, 2));
    }
}
