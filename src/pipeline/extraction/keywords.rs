//! Process-stage keyword flags.
//!
//! Each keyword group names one development/engagement phase. A group's flag
//! is true when any of its keywords appears in the raw document text,
//! compared case-insensitively.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::ExtractionError;

/// A named group of keywords for one process stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordGroup {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Validated keyword groups with pre-lowercased needles.
#[derive(Debug, Clone)]
pub struct ProcessKeywords {
    groups: Vec<(String, Vec<String>)>,
}

impl ProcessKeywords {
    pub fn new(groups: &[KeywordGroup]) -> Result<Self, ExtractionError> {
        let mut seen = HashSet::new();
        let mut compiled = Vec::with_capacity(groups.len());

        for group in groups {
            let name = group.name.trim();
            if name.is_empty() {
                return Err(ExtractionError::Config("keyword group with empty name".into()));
            }
            if !seen.insert(name.to_string()) {
                return Err(ExtractionError::Config(format!(
                    "duplicate keyword group '{name}'"
                )));
            }

            let needles: Vec<String> = group
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
            if needles.is_empty() {
                return Err(ExtractionError::Config(format!(
                    "keyword group '{name}' has no keywords"
                )));
            }

            compiled.push((name.to_string(), needles));
        }

        Ok(Self { groups: compiled })
    }

    pub fn builtin() -> Result<Self, ExtractionError> {
        Self::new(&default_keyword_groups())
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(name, _)| name.as_str())
    }

    /// One flag per configured group, false when none of its keywords occur.
    pub fn detect(&self, raw_text: &str) -> BTreeMap<String, bool> {
        let haystack = raw_text.to_lowercase();
        self.groups
            .iter()
            .map(|(name, needles)| {
                let hit = needles.iter().any(|n| haystack.contains(n.as_str()));
                (name.clone(), hit)
            })
            .collect()
    }
}

fn group(name: &str, keywords: &[&str]) -> KeywordGroup {
    KeywordGroup {
        name: name.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

/// Built-in process stages, ordered from upstream to downstream work.
pub fn default_keyword_groups() -> Vec<KeywordGroup> {
    vec![
        group(
            "requirements_definition",
            &["要件定義", "要求定義", "requirements definition"],
        ),
        group("basic_design", &["基本設計", "外部設計", "basic design"]),
        group("detailed_design", &["詳細設計", "内部設計", "detailed design"]),
        group(
            "implementation",
            &["製造", "実装", "コーディング", "プログラミング", "implementation", "coding"],
        ),
        group(
            "testing",
            &["単体テスト", "結合テスト", "総合テスト", "システムテスト", "試験", "testing"],
        ),
        group(
            "operation_maintenance",
            &["運用", "保守", "operation", "maintenance"],
        ),
    ]
}
