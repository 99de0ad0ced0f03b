use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::pipeline::evaluation::EvaluationSpec;
use crate::pipeline::extraction::keywords::default_keyword_groups;
use crate::pipeline::extraction::registry::default_field_specs;
use crate::pipeline::extraction::{
    DocumentPipeline, ExtractionError, FieldSpec, KeywordGroup, PatternRegistry,
    ProcessKeywords, DEFAULT_MAX_TEXT_CHARS,
};

/// Application-level constants
pub const APP_NAME: &str = "CandidateExtract";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "CANDIDATE_EXTRACT_CONFIG";

const CONFIG_FILE_NAME: &str = "config.json";

/// Get the application data directory (~/CandidateExtract/), if a home
/// directory can be determined.
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_NAME))
}

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "info"
}

// ═══════════════════════════════════════════
// Extractor configuration
// ═══════════════════════════════════════════

/// Pattern table, keyword groups and evaluation settings.
///
/// Every section is optional in the file and falls back to the built-in
/// tables, so a config may override only the patterns, say.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractorConfig {
    #[serde(default = "default_field_specs")]
    pub fields: Vec<FieldSpec>,
    #[serde(default = "default_keyword_groups")]
    pub process_keywords: Vec<KeywordGroup>,
    /// Fields scored by evaluation, in report order. All fields when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_text_chars: Option<usize>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            fields: default_field_specs(),
            process_keywords: default_keyword_groups(),
            evaluation_fields: None,
            max_text_chars: None,
        }
    }
}

impl ExtractorConfig {
    /// Read and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ExtractionError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| ExtractionError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        tracing::info!(
            path = %path.display(),
            fields = config.fields.len(),
            keyword_groups = config.process_keywords.len(),
            "Loaded extractor configuration"
        );
        Ok(config)
    }

    /// Load from `explicit`, else the `CANDIDATE_EXTRACT_CONFIG` path, else
    /// `~/CandidateExtract/config.json` when it exists, else built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ExtractionError> {
        let data_file = app_data_dir()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .filter(|path| path.is_file());
        match pick_config_path(explicit, std::env::var_os(CONFIG_ENV), data_file) {
            Some(path) => Self::load(&path),
            None => {
                tracing::debug!("No configuration file; using built-in patterns");
                Ok(Self::default())
            }
        }
    }

    /// Compile every section once, surfacing the first error.
    pub fn validate(&self) -> Result<(), ExtractionError> {
        let registry = PatternRegistry::new(&self.fields)?;
        ProcessKeywords::new(&self.process_keywords)?;
        self.evaluation_spec_for(&registry)?;
        if self.max_text_chars == Some(0) {
            return Err(ExtractionError::Config(
                "max_text_chars must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn build_registry(&self) -> Result<PatternRegistry, ExtractionError> {
        PatternRegistry::new(&self.fields)
    }

    pub fn build_pipeline(&self) -> Result<DocumentPipeline, ExtractionError> {
        let registry = self.build_registry()?;
        let keywords = ProcessKeywords::new(&self.process_keywords)?;
        Ok(DocumentPipeline::new(Arc::new(registry), Arc::new(keywords))
            .with_max_text_chars(self.max_text_chars.unwrap_or(DEFAULT_MAX_TEXT_CHARS)))
    }

    pub fn evaluation_spec(&self) -> Result<EvaluationSpec, ExtractionError> {
        self.evaluation_spec_for(&self.build_registry()?)
    }

    fn evaluation_spec_for(&self, registry: &PatternRegistry) -> Result<EvaluationSpec, ExtractionError> {
        let spec = EvaluationSpec::from_registry(registry);
        match &self.evaluation_fields {
            None => Ok(spec),
            Some(names) => spec
                .select(names)
                .map_err(|e| ExtractionError::Config(e.to_string())),
        }
    }
}

fn pick_config_path(
    explicit: Option<&Path>,
    env_value: Option<OsString>,
    data_file: Option<PathBuf>,
) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| env_value.filter(|v| !v.is_empty()).map(PathBuf::from))
        .or(data_file)
}
