//! Pattern registry: field name to an ordered list of (pattern, score, normalization).
//!
//! Compiled once from [`FieldSpec`]s and immutable afterwards: identical input
//! text always yields identical extraction for the same registry.

use std::collections::HashSet;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::normalize::NormalizationKind;
use super::ExtractionError;

// ═══════════════════════════════════════════
// Field names of the built-in registry
// ═══════════════════════════════════════════

pub const FIELD_NAME: &str = "name";
pub const FIELD_AGE: &str = "age";
pub const FIELD_RATE: &str = "rate";
pub const FIELD_INDUSTRY: &str = "industry";
pub const FIELD_ROLE: &str = "role";
pub const FIELD_SKILLS: &str = "skills";
pub const FIELD_OS: &str = "os";
pub const FIELD_DATABASE: &str = "database";

// ═══════════════════════════════════════════
// Declarative specs (serde)
// ═══════════════════════════════════════════

/// One matching rule for a field, as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSpec {
    /// Regular expression; capture group 1 holds the raw value.
    pub pattern: String,
    /// Positive score used for tie-breaking and aggregate confidence.
    pub score: u32,
    pub kind: NormalizationKind,
}

/// A field and its patterns in attempt order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub patterns: Vec<PatternSpec>,
}

// ═══════════════════════════════════════════
// Compiled registry
// ═══════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub regex: Regex,
    pub score: u32,
    pub kind: NormalizationKind,
}

#[derive(Debug, Clone)]
pub struct CompiledField {
    pub name: String,
    pub patterns: Vec<CompiledPattern>,
}

impl CompiledField {
    /// Normalization kind of the first pattern; fields are declared with one
    /// kind in practice and the evaluation engine keys comparison rules on it.
    pub fn primary_kind(&self) -> Option<NormalizationKind> {
        self.patterns.first().map(|p| p.kind)
    }
}

/// Immutable, validated pattern table.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    fields: Vec<CompiledField>,
}

impl PatternRegistry {
    /// Compile and validate field specs. Every problem here is fatal at load time.
    pub fn new(specs: &[FieldSpec]) -> Result<Self, ExtractionError> {
        if specs.is_empty() {
            return Err(ExtractionError::Config("registry declares no fields".into()));
        }

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(specs.len());

        for spec in specs {
            let name = spec.name.trim();
            if name.is_empty() {
                return Err(ExtractionError::Config("field with empty name".into()));
            }
            if !seen.insert(name.to_string()) {
                return Err(ExtractionError::Config(format!("duplicate field '{name}'")));
            }
            if spec.patterns.is_empty() {
                return Err(ExtractionError::Config(format!(
                    "field '{name}' declares no patterns"
                )));
            }

            let mut patterns = Vec::with_capacity(spec.patterns.len());
            for p in &spec.patterns {
                patterns.push(compile_pattern(name, p)?);
            }

            fields.push(CompiledField {
                name: name.to_string(),
                patterns,
            });
        }

        tracing::debug!(fields = fields.len(), "Pattern registry compiled");
        Ok(Self { fields })
    }

    /// Registry built from [`default_field_specs`].
    pub fn builtin() -> Result<Self, ExtractionError> {
        Self::new(&default_field_specs())
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[CompiledField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&CompiledField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a field, treating an unknown name as a configuration error.
    pub fn resolve(&self, name: &str) -> Result<&CompiledField, ExtractionError> {
        self.field(name)
            .ok_or_else(|| ExtractionError::UnknownField(name.to_string()))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn compile_pattern(field: &str, spec: &PatternSpec) -> Result<CompiledPattern, ExtractionError> {
    if spec.score == 0 {
        return Err(ExtractionError::Config(format!(
            "field '{field}': pattern score must be positive"
        )));
    }

    let regex = RegexBuilder::new(&spec.pattern)
        .case_insensitive(true)
        .multi_line(true)
        .build()
        .map_err(|source| ExtractionError::InvalidPattern {
            field: field.to_string(),
            source,
        })?;

    if regex.captures_len() < 2 {
        return Err(ExtractionError::Config(format!(
            "field '{field}': pattern has no capture group: {}",
            spec.pattern
        )));
    }

    Ok(CompiledPattern {
        regex,
        score: spec.score,
        kind: spec.kind,
    })
}

// ═══════════════════════════════════════════
// Built-in table
// ═══════════════════════════════════════════

/// Lookahead substitute: a lazily captured value ends where the next known
/// label (followed by a colon), a block marker, or the text ends.
const NEXT_LABEL: &str = concat!(
    r"(?:(?:氏\s*名|名\s*前|年\s*齢|性\s*別|(?:希\s*望\s*)?単\s*[金価]|最\s*寄\s*駅?|",
    r"業\s*[種界]|役\s*割|ポジション|担\s*当(?:\s*工\s*程)?|工\s*程|スキル|言\s*語|技\s*術|OS|DB|データベース|",
    r"稼\s*働|備\s*考|国\s*籍|name|age|rate|price|industry|role|skills?|database)",
    r"\s*[:：]|[【■◆●]|$)",
);

const OS_NAMES: &str = r"(?:windows|linux|mac\s?os|unix|centos|ubuntu|red\s?hat|rhel|aix|solaris)";

const DB_NAMES: &str =
    r"(?:oracle|mysql|postgre(?:sql)?|sql\s?server|db2|mongodb|redis|sqlite|mariadb)";

fn pattern(regex: impl Into<String>, score: u32, kind: NormalizationKind) -> PatternSpec {
    PatternSpec {
        pattern: regex.into(),
        score,
        kind,
    }
}

fn labelled(label: &str) -> String {
    format!(r"{label}\s*[:：]\s*(.+?)\s*{NEXT_LABEL}")
}

fn bracketed(label: &str) -> String {
    format!(r"【\s*{label}\s*】\s*(.+?)\s*{NEXT_LABEL}")
}

fn name_list(names: &str) -> String {
    format!(r"\b({names}(?:\s*[、/／,・]\s*{names})*)")
}

/// The default candidate-profile registry, in attempt order per field.
pub fn default_field_specs() -> Vec<FieldSpec> {
    use NormalizationKind::*;

    vec![
        FieldSpec {
            name: FIELD_NAME.into(),
            patterns: vec![
                pattern(labelled(r"(?:氏\s*名|名\s*前)"), 100, Name),
                pattern(bracketed(r"(?:氏\s*名|名\s*前)"), 90, Name),
                pattern(labelled(r"\bname"), 80, Name),
                pattern(r"\b([A-Z]\s*[.．]\s*[A-Z])\s*[.．]?\s*(?:さん|氏|様)", 60, Name),
            ],
        },
        FieldSpec {
            name: FIELD_AGE.into(),
            patterns: vec![
                pattern(r"年\s*齢\s*[:：]?\s*(\d{1,3})", 100, Age),
                pattern(r"\bage\s*[:：]?\s*(\d{1,3})", 90, Age),
                pattern(r"(\d{2,3})\s*(?:歳|才)", 70, Age),
            ],
        },
        FieldSpec {
            name: FIELD_RATE.into(),
            patterns: vec![
                pattern(
                    concat!(
                        r"(?:希\s*望\s*)?単\s*[金価]\s*[:：]?\s*(?:[^\d\s]{1,8}\s*)?",
                        r"(\d{1,4}(?:[.．]\d{1,2})?)\s*(?:[~～〜\-－]\s*\d{1,4}(?:[.．]\d{1,2})?\s*)?万",
                    ),
                    100,
                    Currency,
                ),
                pattern(
                    r"(?:希\s*望\s*)?単\s*[金価]\s*[:：]?\s*(\d{1,3}(?:,\d{3})+|\d{5,7})\s*円",
                    90,
                    Currency,
                ),
                pattern(
                    r"\b(?:rate|price)\s*[:：]?\s*(\d{1,4}(?:[.．]\d{1,2})?)\s*万",
                    80,
                    Currency,
                ),
                pattern(r"(\d{2,3}(?:[.．]\d{1,2})?)\s*万\s*円", 60, Currency),
            ],
        },
        FieldSpec {
            name: FIELD_INDUSTRY.into(),
            patterns: vec![
                pattern(labelled(r"業\s*[種界]"), 100, DelimitedList),
                pattern(labelled(r"\bindustry"), 80, DelimitedList),
            ],
        },
        FieldSpec {
            name: FIELD_ROLE.into(),
            patterns: vec![
                pattern(labelled(r"(?:役\s*割|ポジション|担\s*当)"), 100, FreeText),
                pattern(labelled(r"\brole"), 80, FreeText),
            ],
        },
        FieldSpec {
            name: FIELD_SKILLS.into(),
            patterns: vec![
                pattern(labelled(r"(?:スキル|言\s*語|技\s*術)"), 100, DelimitedList),
                pattern(bracketed(r"(?:スキル|言語|技術)"), 90, DelimitedList),
                pattern(labelled(r"\bskills?"), 80, DelimitedList),
            ],
        },
        FieldSpec {
            name: FIELD_OS.into(),
            patterns: vec![
                pattern(labelled(r"(?:^|[^a-z])OS"), 100, DelimitedList),
                pattern(bracketed("OS"), 90, DelimitedList),
                pattern(name_list(OS_NAMES), 50, DelimitedList),
            ],
        },
        FieldSpec {
            name: FIELD_DATABASE.into(),
            patterns: vec![
                pattern(labelled(r"(?:^|[^a-z])(?:DB|データベース)"), 100, DelimitedList),
                pattern(bracketed(r"(?:DB|データベース)"), 90, DelimitedList),
                pattern(name_list(DB_NAMES), 50, DelimitedList),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, patterns: Vec<PatternSpec>) -> FieldSpec {
        FieldSpec {
            name: name.into(),
            patterns,
        }
    }

    #[test]
    fn builtin_registry_compiles() {
        let registry = PatternRegistry::builtin().unwrap();
        let names: Vec<&str> = registry.field_names().collect();
        assert_eq!(
            names,
            vec!["name", "age", "rate", "industry", "role", "skills", "os", "database"]
        );
    }

    #[test]
    fn builtin_patterns_have_positive_scores() {
        for field in default_field_specs() {
            assert!(field.patterns.iter().all(|p| p.score > 0), "{}", field.name);
        }
    }

    #[test]
    fn unknown_field_is_error() {
        let registry = PatternRegistry::builtin().unwrap();
        assert!(registry.resolve("age").is_ok());
        assert!(matches!(
            registry.resolve("salary"),
            Err(ExtractionError::UnknownField(name)) if name == "salary"
        ));
    }

    #[test]
    fn invalid_regex_rejected_at_load() {
        let specs = vec![spec(
            "age",
            vec![pattern(r"年齢(\d+", 100, NormalizationKind::Age)],
        )];
        assert!(matches!(
            PatternRegistry::new(&specs),
            Err(ExtractionError::InvalidPattern { field, .. }) if field == "age"
        ));
    }

    #[test]
    fn zero_score_rejected() {
        let specs = vec![spec("age", vec![pattern(r"(\d+)", 0, NormalizationKind::Age)])];
        assert!(matches!(
            PatternRegistry::new(&specs),
            Err(ExtractionError::Config(_))
        ));
    }

    #[test]
    fn missing_capture_group_rejected() {
        let specs = vec![spec("age", vec![pattern(r"\d+", 10, NormalizationKind::Age)])];
        assert!(PatternRegistry::new(&specs).is_err());
    }

    #[test]
    fn duplicate_and_empty_fields_rejected() {
        let p = || pattern(r"(\d+)", 10, NormalizationKind::Age);
        assert!(PatternRegistry::new(&[spec("age", vec![p()]), spec("age", vec![p()])]).is_err());
        assert!(PatternRegistry::new(&[spec("age", vec![])]).is_err());
        assert!(PatternRegistry::new(&[]).is_err());
    }

    #[test]
    fn patterns_are_case_insensitive() {
        let registry = PatternRegistry::builtin().unwrap();
        let os = registry.resolve(FIELD_OS).unwrap();
        let bare = &os.patterns[2];
        assert!(bare.regex.is_match("WINDOWS server"));
        assert!(bare.regex.is_match("ubuntu"));
    }

    #[test]
    fn primary_kind_follows_first_pattern() {
        let registry = PatternRegistry::builtin().unwrap();
        assert_eq!(
            registry.resolve(FIELD_RATE).unwrap().primary_kind(),
            Some(NormalizationKind::Currency)
        );
        assert_eq!(
            registry.resolve(FIELD_NAME).unwrap().primary_kind(),
            Some(NormalizationKind::Name)
        );
    }

    #[test]
    fn specs_deserialize_from_json() {
        let json = r#"[{"name":"age","patterns":[{"pattern":"age (\\d+)","score":50,"kind":"age"}]}]"#;
        let specs: Vec<FieldSpec> = serde_json::from_str(json).unwrap();
        let registry = PatternRegistry::new(&specs).unwrap();
        assert_eq!(registry.len(), 1);
    }
}
