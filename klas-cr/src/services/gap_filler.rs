//! Idempotent content gap filling
//!
//! Brings every below-baseline module up to the minimum practice-item,
//! baseline-assessment, and enrichment-resource bar, exactly once per run.
//! Every mutation is preceded by an existence check keyed on the module's
//! identity, so re-running against an unchanged store inserts nothing.
//!
//! Modules are processed strictly sequentially; the design assumes a
//! single active run. A missing configuration record (subject) skips the
//! module with a warning; a failed create aborts the whole run. Work
//! already committed stays committed, and the next run picks up where this
//! one stopped.

use crate::db;
use crate::db::gaps::GapRow;
use crate::services::content_strategy::{ItemContentStrategy, PlaceholderContent};
use crate::services::paginated_fetcher::{fetch_all_pages, FetchOptions};
use crate::services::threshold_policy::is_in_scope;
use anyhow::{Context, Result};
use klas_common::db::init::DEFAULT_PRACTICE_TARGET;
use klas_common::db::models::{AssessmentPurpose, GeneratedBy, Module, Provenance, StorageMode};
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Subject-appropriate external resources used when a module has none.
/// Subjects without an entry fall back to the default subject's entry.
const EXTERNAL_CATALOG: [(&str, &str, &str); 4] = [
    (
        "Mathematics",
        "Khan Academy practice",
        "https://www.khanacademy.org/",
    ),
    (
        "English Language Arts",
        "CommonLit reading library",
        "https://www.commonlit.org/",
    ),
    (
        "Science",
        "PhET interactive simulations",
        "https://phet.colorado.edu/",
    ),
    (
        "Social Studies",
        "iCivics civics activities",
        "https://www.icivics.org/",
    ),
];

const CATALOG_FALLBACK_SUBJECT: &str = "Mathematics";

/// Tunable targets for one gap-fill run
#[derive(Debug, Clone, Copy)]
pub struct GapFillerConfig {
    /// Practice items required per module unless the module overrides it
    pub default_practice_target: i64,
    /// Items inserted per batch
    pub practice_batch_size: i64,
    /// Practice items linked into a newly created assessment
    pub max_assessment_items: usize,
}

impl Default for GapFillerConfig {
    fn default() -> Self {
        Self {
            default_practice_target: DEFAULT_PRACTICE_TARGET,
            practice_batch_size: 25,
            max_assessment_items: 5,
        }
    }
}

/// Counters reported at the end of a run. `fatal` carries the aborting
/// error, if any; everything counted happened before the abort and is
/// committed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GapFillReport {
    pub modules_processed: u64,
    pub modules_skipped: u64,
    pub items_created: u64,
    pub assessments_created: u64,
    pub assessments_updated: u64,
    pub assets_created: u64,
    pub fatal: Option<String>,
}

enum ModuleOutcome {
    Processed,
    Skipped,
}

/// Batch backfill service over a read-write connection
pub struct GapFiller {
    db: SqlitePool,
    config: GapFillerConfig,
    content: Arc<dyn ItemContentStrategy>,
    fetch_options: FetchOptions,
}

impl GapFiller {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            config: GapFillerConfig::default(),
            content: Arc::new(PlaceholderContent),
            fetch_options: FetchOptions::default(),
        }
    }

    pub fn with_config(mut self, config: GapFillerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_content_strategy(mut self, content: Arc<dyn ItemContentStrategy>) -> Self {
        self.content = content;
        self
    }

    pub fn with_fetch_options(mut self, fetch_options: FetchOptions) -> Self {
        self.fetch_options = fetch_options;
        self
    }

    /// Run one backfill pass over every below-baseline module, optionally
    /// restricted to the given grade bands.
    pub async fn run(&self, grade_filter: &[String]) -> GapFillReport {
        let run_id = Uuid::new_v4();
        info!(%run_id, ?grade_filter, "Starting gap-fill run");

        let mut report = GapFillReport::default();

        let rows = match fetch_all_pages("coverage gap rows", &self.fetch_options, |from, to| {
            let pool = self.db.clone();
            async move { db::gaps::gap_window(&pool, from, to).await }
        })
        .await
        {
            Ok(rows) => rows,
            Err(err) => {
                error!(%run_id, error = %err, "Could not read coverage gap view");
                report.fatal = Some(format!("{err:#}"));
                return report;
            }
        };

        // A module may surface once per deficiency source; process each
        // module only once per run.
        let mut seen: HashSet<i64> = HashSet::new();

        for row in rows {
            if !grade_filter.is_empty() && !grade_filter.iter().any(|g| g == &row.grade_band) {
                continue;
            }
            if !seen.insert(row.module_id) {
                continue;
            }
            if !is_in_scope(&row.grade_band, &row.subject) {
                debug!(module = %row.slug, grade = %row.grade_band, subject = %row.subject,
                    "Module outside launch scope, skipping");
                report.modules_skipped += 1;
                continue;
            }

            match self.process_module(&row, &mut report).await {
                Ok(ModuleOutcome::Processed) => report.modules_processed += 1,
                Ok(ModuleOutcome::Skipped) => report.modules_skipped += 1,
                Err(err) => {
                    error!(%run_id, module = %row.slug, error = %err,
                        "Fatal error during gap fill, aborting run");
                    report.fatal = Some(format!("{err:#}"));
                    break;
                }
            }
        }

        info!(
            %run_id,
            processed = report.modules_processed,
            skipped = report.modules_skipped,
            items = report.items_created,
            assessments_created = report.assessments_created,
            assessments_updated = report.assessments_updated,
            assets = report.assets_created,
            "Gap-fill run finished"
        );

        report
    }

    async fn process_module(
        &self,
        row: &GapRow,
        report: &mut GapFillReport,
    ) -> Result<ModuleOutcome> {
        // Configuration check: a module whose subject has no record is
        // skipped, and the rest of the batch continues.
        if db::subjects::fetch_subject(&self.db, &row.subject)
            .await?
            .is_none()
        {
            warn!(module = %row.slug, subject = %row.subject,
                "Subject record missing, skipping module");
            return Ok(ModuleOutcome::Skipped);
        }

        let module = match db::modules::fetch_module(&self.db, row.module_id).await? {
            Some(module) => module,
            None => {
                warn!(module_id = row.module_id,
                    "Module disappeared since the gap view was read, skipping");
                return Ok(ModuleOutcome::Skipped);
            }
        };

        let item_ids = self.ensure_practice(&module, report).await?;
        self.ensure_assessment(&module, row.needs_assessment, &item_ids, report)
            .await?;
        self.ensure_external(&module, row.needs_external, report)
            .await?;

        Ok(ModuleOutcome::Processed)
    }

    /// Bring the module's tagged practice items up to its target, inserting
    /// only the shortfall. Existing items get their standards refreshed
    /// (union, not replace). Returns the full tagged id set, newly created
    /// ids first, for assessment building.
    pub async fn ensure_practice(
        &self,
        module: &Module,
        report: &mut GapFillReport,
    ) -> Result<Vec<i64>> {
        let existing = db::practice_items::fetch_tagged_items(&self.db, &module.slug).await?;
        let target = module
            .practice_target
            .unwrap_or(self.config.default_practice_target);

        // Union of the module's standard code and every standard already
        // recorded on its items
        let mut standards: BTreeSet<String> = existing
            .iter()
            .flat_map(|item| item.standards.iter().cloned())
            .collect();
        if let Some(code) = &module.standard_code {
            standards.insert(code.clone());
        }
        let provenance = Provenance::gap_filled(standards.clone());
        let standards_json = provenance.standards_json();

        let shortfall = (target - existing.len() as i64).max(0);
        let mut new_ids = Vec::new();

        if shortfall > 0 {
            info!(module = %module.slug, existing = existing.len(), target, shortfall,
                "Backfilling practice items");

            let mut created: i64 = 0;
            while created < shortfall {
                let batch = (shortfall - created).min(self.config.practice_batch_size);
                for offset in 0..batch {
                    let ordinal = existing.len() as i64 + created + offset + 1;
                    let stem = self.content.practice_stem(module, ordinal);
                    let options = self.content.options(module);
                    let tags = vec![module.slug.clone()];
                    let id = db::practice_items::insert_item(
                        &self.db,
                        &module.slug,
                        &stem,
                        &options,
                        &tags,
                        &provenance,
                    )
                    .await
                    .with_context(|| {
                        format!("creating practice item for module {}", module.slug)
                    })?;
                    new_ids.push(id);
                }
                created += batch;
                debug!(module = %module.slug, batch, created, "Inserted practice item batch");
            }

            report.items_created += shortfall as u64;
        }

        for item in &existing {
            if item.standards != standards {
                db::practice_items::update_item_standards(&self.db, item.id, &standards_json)
                    .await
                    .with_context(|| {
                        format!("refreshing standards on practice item {}", item.id)
                    })?;
            }
        }

        let mut ids = new_ids;
        ids.extend(existing.iter().map(|item| item.id));
        Ok(ids)
    }

    /// Ensure the module has one baseline assessment. An existing
    /// assessment gets its metadata merged; otherwise exactly one is
    /// created with one section linking up to five of the available items,
    /// preferring the ids just ensured.
    pub async fn ensure_assessment(
        &self,
        module: &Module,
        needs_assessment: bool,
        available_item_ids: &[i64],
        report: &mut GapFillReport,
    ) -> Result<()> {
        if !needs_assessment {
            return Ok(());
        }

        let mut standards = BTreeSet::new();
        if let Some(code) = &module.standard_code {
            standards.insert(code.clone());
        }

        match db::assessments::fetch_by_module(&self.db, module.id).await? {
            Some(existing) => {
                // Merge, never overwrite: union the standards, keep the
                // recorded purpose.
                let mut merged = existing.standards.clone();
                merged.extend(standards);
                let purpose = existing
                    .purpose
                    .clone()
                    .unwrap_or_else(|| AssessmentPurpose::Baseline.as_str().to_string());

                let changed = merged != existing.standards || existing.purpose.is_none();
                if changed {
                    let merged_json =
                        serde_json::to_string(&merged).unwrap_or_else(|_| "[]".to_string());
                    db::assessments::update_metadata(
                        &self.db,
                        existing.id,
                        &purpose,
                        &merged_json,
                    )
                    .await
                    .with_context(|| {
                        format!("merging metadata on assessment {}", existing.id)
                    })?;
                    report.assessments_updated += 1;
                    info!(module = %module.slug, assessment_id = existing.id,
                        "Merged metadata onto existing assessment");
                }
            }
            None => {
                if available_item_ids.is_empty() {
                    warn!(module = %module.slug,
                        "No practice items available, skipping assessment creation");
                    return Ok(());
                }

                let provenance = Provenance {
                    generated_by: Some(GeneratedBy::GapFiller),
                    standards,
                    purpose: Some(AssessmentPurpose::Baseline),
                    extra: serde_json::Map::new(),
                };
                let title = self.content.assessment_title(module);

                let assessment_id =
                    db::assessments::insert_assessment(&self.db, module.id, &title, &provenance)
                        .await
                        .with_context(|| {
                            format!("creating baseline assessment for module {}", module.slug)
                        })?;
                let section_id =
                    db::assessments::insert_section(&self.db, assessment_id, "Section 1", 1)
                        .await
                        .with_context(|| {
                            format!("creating assessment section for module {}", module.slug)
                        })?;

                let linked = available_item_ids
                    .iter()
                    .take(self.config.max_assessment_items);
                let mut link_count = 0i64;
                for (position, item_id) in linked.enumerate() {
                    db::assessments::link_item(
                        &self.db,
                        section_id,
                        *item_id,
                        position as i64 + 1,
                    )
                    .await
                    .with_context(|| {
                        format!("linking practice item {item_id} into assessment {assessment_id}")
                    })?;
                    link_count += 1;
                }

                report.assessments_created += 1;
                info!(module = %module.slug, assessment_id, linked = link_count,
                    "Created baseline assessment");
            }
        }

        Ok(())
    }

    /// Ensure the module has at least one link or embed enrichment asset,
    /// inserting one subject-appropriate catalog entry if not.
    pub async fn ensure_external(
        &self,
        module: &Module,
        needs_external: bool,
        report: &mut GapFillReport,
    ) -> Result<()> {
        if !needs_external {
            return Ok(());
        }

        if db::assets::count_linkable(&self.db, module.id).await? > 0 {
            return Ok(());
        }

        let (title, url) = catalog_entry(&module.subject);
        let provenance = Provenance::gap_filled(BTreeSet::new());

        let asset_id = db::assets::insert_asset(
            &self.db,
            module.id,
            title,
            url,
            StorageMode::Link,
            &provenance,
        )
        .await
        .with_context(|| format!("creating enrichment asset for module {}", module.slug))?;

        report.assets_created += 1;
        info!(module = %module.slug, asset_id, url, "Created enrichment asset");
        Ok(())
    }
}

fn catalog_entry(subject: &str) -> (&'static str, &'static str) {
    let fallback = EXTERNAL_CATALOG
        .iter()
        .find(|(catalog_subject, _, _)| *catalog_subject == CATALOG_FALLBACK_SUBJECT)
        .unwrap_or(&EXTERNAL_CATALOG[0]);
    let (_, title, url) = EXTERNAL_CATALOG
        .iter()
        .find(|(catalog_subject, _, _)| *catalog_subject == subject)
        .unwrap_or(fallback);
    (*title, *url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_covers_every_launch_subject() {
        use crate::services::threshold_policy::CORE_SUBJECTS;
        for subject in CORE_SUBJECTS {
            let (_, url) = catalog_entry(subject);
            assert!(url.starts_with("https://"), "{subject}");
        }
    }

    #[test]
    fn unknown_subject_falls_back_to_default_entry() {
        assert_eq!(catalog_entry("Latin"), catalog_entry(CATALOG_FALLBACK_SUBJECT));
    }
}
