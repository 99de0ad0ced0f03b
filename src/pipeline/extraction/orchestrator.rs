use std::collections::BTreeMap;
use std::sync::Arc;

use super::confidence::compute_overall_confidence;
use super::field::extract;
use super::keywords::ProcessKeywords;
use super::registry::PatternRegistry;
use super::sanitize::{collapse_whitespace, truncate_chars};
use super::types::{DocumentProcessor, ExtractedRecord, RawDocument};

/// Default bound on the text handed to pattern matching, in characters.
pub const DEFAULT_MAX_TEXT_CHARS: usize = 200_000;

/// Applies every registered field extractor and the process-stage detector
/// to one document. Holds only immutable, shared configuration, so one
/// pipeline serves any number of concurrent callers.
#[derive(Debug, Clone)]
pub struct DocumentPipeline {
    registry: Arc<PatternRegistry>,
    keywords: Arc<ProcessKeywords>,
    max_text_chars: usize,
}

impl DocumentPipeline {
    pub fn new(registry: Arc<PatternRegistry>, keywords: Arc<ProcessKeywords>) -> Self {
        Self {
            registry,
            keywords,
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
        }
    }

    /// Bound the search and scan text; documents beyond it are truncated.
    pub fn with_max_text_chars(mut self, max_text_chars: usize) -> Self {
        self.max_text_chars = max_text_chars.max(1);
        self
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    /// Produce the structured record for one document.
    pub fn process(&self, document: &RawDocument) -> ExtractedRecord {
        let mut raw_text = document.combined_text();
        if truncate_chars(&mut raw_text, self.max_text_chars) {
            tracing::warn!(
                document_id = document.id.as_str(),
                max_chars = self.max_text_chars,
                "Document text truncated before extraction"
            );
        }
        let search_text = collapse_whitespace(&raw_text);

        let fields: BTreeMap<_, _> = self
            .registry
            .fields()
            .iter()
            .map(|field| (field.name.clone(), extract(field, &search_text)))
            .collect();

        let process_flags = self.keywords.detect(&raw_text);
        let overall_confidence = compute_overall_confidence(&fields);

        tracing::debug!(
            document_id = document.id.as_str(),
            matched = fields.values().filter(|f| !f.value.is_missing()).count(),
            total = fields.len(),
            overall_confidence,
            "Document extracted"
        );

        ExtractedRecord {
            id: document.id.clone(),
            fields,
            process_flags,
            overall_confidence,
        }
    }
}

impl DocumentProcessor for DocumentPipeline {
    fn process(&self, document: &RawDocument) -> ExtractedRecord {
        DocumentPipeline::process(self, document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::registry::*;
    use crate::pipeline::extraction::types::FieldValue;

    fn make_pipeline() -> DocumentPipeline {
        DocumentPipeline::new(
            Arc::new(PatternRegistry::builtin().unwrap()),
            Arc::new(ProcessKeywords::builtin().unwrap()),
        )
    }

    fn value<'a>(record: &'a ExtractedRecord, field: &str) -> &'a str {
        record.value(field).as_str()
    }

    #[test]
    fn end_to_end_labelled_fields() {
        let doc = RawDocument::new(
            "mail-001",
            "名 前: 田中　太郎 (フリガナ) 年 齢: 35 歳 単 金: 70 万円",
        );
        let record = make_pipeline().process(&doc);

        assert_eq!(value(&record, FIELD_NAME), "田中太郎");
        assert_eq!(value(&record, FIELD_AGE), "35");
        assert_eq!(value(&record, FIELD_RATE), "700000");
        assert_eq!(record.fields[FIELD_NAME].confidence_score, 100);
        assert!((record.overall_confidence - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn multi_line_mail_with_attachment() {
        let doc = RawDocument::new(
            "mail-002",
            "お世話になっております。\n■氏名：山田 花子（ヤマダ）\n■年齢：42歳\n■単価：65~70万\n",
        )
        .with_subject("【人材情報】PM/PL")
        .with_attachment(
            "スキル：Java、Python／Go\nOS：Windows, Linux\nDB：Oracle\n業種：金融・保険\n役割：PL\n担当工程：基本設計～結合テスト",
        );
        let record = make_pipeline().process(&doc);

        assert_eq!(value(&record, FIELD_NAME), "山田花子");
        assert_eq!(value(&record, FIELD_AGE), "42");
        assert_eq!(value(&record, FIELD_RATE), "650000");
        assert_eq!(value(&record, FIELD_SKILLS), "Java,Python,Go");
        assert_eq!(value(&record, FIELD_OS), "Windows,Linux");
        assert_eq!(value(&record, FIELD_DATABASE), "Oracle");
        assert_eq!(value(&record, FIELD_INDUSTRY), "金融,保険");
        assert_eq!(value(&record, FIELD_ROLE), "PL");
        assert!(record.flag("basic_design"));
        assert!(record.flag("testing"));
        assert!(!record.flag("requirements_definition"));
    }

    #[test]
    fn bare_values_use_lower_confidence_patterns() {
        let doc = RawDocument::new("mail-003", "T.Tさん 28才 ubuntu/centos MySQL 経験 55万円");
        let record = make_pipeline().process(&doc);

        assert_eq!(value(&record, FIELD_NAME), "T.T");
        assert_eq!(record.fields[FIELD_NAME].confidence_score, 60);
        assert_eq!(value(&record, FIELD_AGE), "28");
        assert_eq!(record.fields[FIELD_AGE].confidence_score, 70);
        assert_eq!(value(&record, FIELD_OS), "ubuntu,centos");
        assert_eq!(value(&record, FIELD_DATABASE), "MySQL");
        assert_eq!(value(&record, FIELD_RATE), "550000");
    }

    #[test]
    fn every_registered_field_is_present() {
        let pipeline = make_pipeline();
        let record = pipeline.process(&RawDocument::new("empty", ""));

        let names: Vec<&str> = pipeline.registry().field_names().collect();
        assert_eq!(record.fields.len(), names.len());
        for name in names {
            assert_eq!(record.fields[name].value, FieldValue::Missing);
            assert_eq!(record.fields[name].confidence_score, 0);
        }
        assert_eq!(record.overall_confidence, 0.0);
        assert_eq!(record.process_flags.len(), 6);
    }

    #[test]
    fn processing_is_deterministic() {
        let pipeline = make_pipeline();
        let doc = RawDocument::new("d", "氏名: 佐藤 健\n年齢: 30\nスキル: Rust, Go\n要件定義")
            .with_subject("案件");
        assert_eq!(pipeline.process(&doc), pipeline.process(&doc));
    }

    #[test]
    fn out_of_range_labelled_age_falls_back_to_bare_age() {
        let doc = RawDocument::new("d", "年齢：150 （実年齢 45歳）");
        let record = make_pipeline().process(&doc);
        assert_eq!(value(&record, FIELD_AGE), "45");
        assert_eq!(record.fields[FIELD_AGE].confidence_score, 70);
    }

    #[test]
    fn rate_below_one_man_is_not_extracted() {
        let record = make_pipeline().process(&RawDocument::new("d", "単価：0.8万 年齢：30"));
        assert!(record.value(FIELD_RATE).is_missing());
        assert_eq!(record.fields[FIELD_RATE].confidence_score, 0);
        assert_eq!(value(&record, FIELD_AGE), "30");
    }

    #[test]
    fn long_documents_are_truncated() {
        let body = format!("{}年齢: 33", "x".repeat(50));
        let pipeline = make_pipeline().with_max_text_chars(20);
        let record = pipeline.process(&RawDocument::new("d", body));
        assert!(record.value(FIELD_AGE).is_missing());
    }
}
