//! Entity models and provenance records
//!
//! Content rows carry a structured provenance record (who generated the row,
//! which standard codes it addresses, what purpose it serves) as dedicated
//! columns, validated here at the store boundary. Anything outside the core's
//! concern rides in the open-ended `extra` map.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Marker distinguishing authored content from backfilled content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratedBy {
    Author,
    GapFiller,
    Importer,
}

impl GeneratedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratedBy::Author => "author",
            GeneratedBy::GapFiller => "gap_filler",
            GeneratedBy::Importer => "importer",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "author" => Ok(GeneratedBy::Author),
            "gap_filler" => Ok(GeneratedBy::GapFiller),
            "importer" => Ok(GeneratedBy::Importer),
            other => Err(Error::InvalidInput(format!(
                "unknown generated_by marker: {other}"
            ))),
        }
    }
}

/// Declared purpose of an assessment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentPurpose {
    Baseline,
    Checkpoint,
    /// Purposes outside the core's vocabulary are preserved verbatim
    Other(String),
}

impl AssessmentPurpose {
    pub fn as_str(&self) -> &str {
        match self {
            AssessmentPurpose::Baseline => "baseline",
            AssessmentPurpose::Checkpoint => "checkpoint",
            AssessmentPurpose::Other(s) => s,
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "baseline" => AssessmentPurpose::Baseline,
            "checkpoint" => AssessmentPurpose::Checkpoint,
            other => AssessmentPurpose::Other(other.to_string()),
        }
    }
}

/// How an enrichment asset is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageMode {
    Link,
    Embed,
    Upload,
}

impl StorageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMode::Link => "link",
            StorageMode::Embed => "embed",
            StorageMode::Upload => "upload",
        }
    }

    /// Returns None for modes outside the known vocabulary; callers treat
    /// those as neither link nor embed.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "link" => Some(StorageMode::Link),
            "embed" => Some(StorageMode::Embed),
            "upload" => Some(StorageMode::Upload),
            _ => None,
        }
    }
}

/// Structured provenance record carried by content rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub generated_by: Option<GeneratedBy>,
    pub standards: BTreeSet<String>,
    pub purpose: Option<AssessmentPurpose>,
    /// Fields outside the core's concern, preserved as-is
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Provenance {
    /// Provenance for a row created by the gap filler against the given
    /// standard codes.
    pub fn gap_filled(standards: BTreeSet<String>) -> Self {
        Self {
            generated_by: Some(GeneratedBy::GapFiller),
            standards,
            purpose: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Parse provenance from its database columns, validating markers.
    pub fn from_columns(
        generated_by: Option<&str>,
        standards_json: Option<&str>,
        purpose: Option<&str>,
        extra_json: Option<&str>,
    ) -> Result<Self> {
        let generated_by = generated_by.map(GeneratedBy::parse).transpose()?;

        let standards = match standards_json {
            Some(json) if !json.is_empty() => {
                let codes: Vec<String> = serde_json::from_str(json).map_err(|e| {
                    Error::InvalidInput(format!("malformed standards list: {e}"))
                })?;
                codes.into_iter().collect()
            }
            _ => BTreeSet::new(),
        };

        let extra = match extra_json {
            Some(json) if !json.is_empty() => serde_json::from_str(json)
                .map_err(|e| Error::InvalidInput(format!("malformed extra map: {e}")))?,
            _ => serde_json::Map::new(),
        };

        Ok(Self {
            generated_by,
            standards,
            purpose: purpose.map(AssessmentPurpose::parse),
            extra,
        })
    }

    /// Standards set serialized for storage (sorted, deduplicated)
    pub fn standards_json(&self) -> String {
        serde_json::to_string(&self.standards).unwrap_or_else(|_| "[]".to_string())
    }

    /// Extension map serialized for storage, None when empty
    pub fn extra_json(&self) -> Option<String> {
        if self.extra.is_empty() {
            None
        } else {
            serde_json::to_string(&self.extra).ok()
        }
    }
}

/// Curriculum module (owned by authors; read-only to this subsystem)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub subject: String,
    pub grade_band: String,
    pub strand: Option<String>,
    pub topic: Option<String>,
    pub standard_code: Option<String>,
    /// Per-module practice-item target, overriding the run default
    pub practice_target: Option<i64>,
}

/// Lesson within a module
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: i64,
    pub module_id: i64,
    pub title: String,
    pub position: i64,
}

/// One answer option on a practice item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemOption {
    pub text: String,
    pub correct: bool,
}

/// Practice item (question)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeItem {
    pub id: i64,
    pub module_slug: Option<String>,
    pub stem: String,
    pub options: Vec<ItemOption>,
    pub tags: Vec<String>,
    pub provenance: Provenance,
}

/// Assessment, optionally owned by a module
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub id: i64,
    pub module_id: Option<i64>,
    pub title: String,
    pub provenance: Provenance,
}

/// External or embedded enrichment resource attached to a module
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentAsset {
    pub id: i64,
    pub module_id: i64,
    pub title: String,
    pub url: String,
    pub storage_mode: Option<StorageMode>,
    pub provenance: Provenance,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provenance_roundtrip_through_columns() {
        let mut standards = BTreeSet::new();
        standards.insert("6.RP.A.1".to_string());
        standards.insert("6.RP.A.2".to_string());
        let prov = Provenance::gap_filled(standards);

        let json = prov.standards_json();
        let parsed = Provenance::from_columns(
            Some("gap_filler"),
            Some(&json),
            None,
            prov.extra_json().as_deref(),
        )
        .unwrap();

        assert_eq!(parsed, prov);
        assert_eq!(parsed.generated_by, Some(GeneratedBy::GapFiller));
    }

    #[test]
    fn standards_json_is_sorted_and_deduplicated() {
        let standards: BTreeSet<String> = ["B.2", "A.1", "B.2"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let prov = Provenance::gap_filled(standards);
        assert_eq!(prov.standards_json(), r#"["A.1","B.2"]"#);
    }

    #[test]
    fn unknown_generated_by_is_rejected() {
        let result = Provenance::from_columns(Some("robot"), None, None, None);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_purpose_is_preserved() {
        let prov = Provenance::from_columns(None, None, Some("diagnostic"), None).unwrap();
        assert_eq!(
            prov.purpose,
            Some(AssessmentPurpose::Other("diagnostic".to_string()))
        );
        assert_eq!(prov.purpose.unwrap().as_str(), "diagnostic");
    }

    #[test]
    fn storage_mode_vocabulary() {
        assert_eq!(StorageMode::parse("link"), Some(StorageMode::Link));
        assert_eq!(StorageMode::parse("embed"), Some(StorageMode::Embed));
        assert_eq!(StorageMode::parse("s3"), None);
    }

    #[test]
    fn empty_extra_map_stores_as_null() {
        let prov = Provenance::default();
        assert!(prov.extra_json().is_none());
    }
}
