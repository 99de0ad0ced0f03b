//! Value normalization from raw captured substrings to canonical field values.
//!
//! Every function here is pure and total: unexpected input maps to
//! `FieldValue::Missing`, never to a panic or an error.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::types::{FieldValue, MISSING};

/// Valid candidate ages, inclusive.
pub const AGE_RANGE: std::ops::RangeInclusive<u32> = 18..=100;

/// Yen per man-yen (万円).
pub const YEN_PER_MAN: u64 = 10_000;

/// Separators inside a name that collapse to a single space.
const NAME_SEPARATORS: &[char] = &['・', '･', '·', '_', '＿'];

const HYPHENS: &[char] = &['-', '‐', '－'];

/// Separators between items of a delimited list.
const LIST_SEPARATORS: &[char] = &['、', '､', '/', '／', '\\', '＼', '|', '｜', ',', '，', '・'];

/// Bracketed or parenthetical annotation, matched non-greedily across any of
/// the ASCII, full-width and lenticular bracket pairs.
static ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\(（\[【].*?[\)）\]】]").expect("Invalid annotation regex")
});

/// Leading bracket label such as `【言語】` or `[OS]`.
static LEADING_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:【[^】]*】|\[[^\]]*\])\s*").expect("Invalid label regex")
});

/// Canonicalization rule family applied to a captured value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationKind {
    Name,
    Age,
    Currency,
    DelimitedList,
    FreeText,
}

impl NormalizationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Age => "age",
            Self::Currency => "currency",
            Self::DelimitedList => "delimited_list",
            Self::FreeText => "free_text",
        }
    }
}

impl fmt::Display for NormalizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a raw captured substring according to `kind`.
pub fn normalize(raw: &str, kind: NormalizationKind) -> FieldValue {
    if raw.trim().eq_ignore_ascii_case(MISSING) {
        return FieldValue::Missing;
    }

    match kind {
        NormalizationKind::Name => normalize_name(raw),
        NormalizationKind::Age => normalize_age(raw),
        NormalizationKind::Currency => normalize_currency(raw),
        NormalizationKind::DelimitedList => normalize_list(raw),
        NormalizationKind::FreeText => normalize_free_text(raw),
    }
}

/// Strip annotations and separators from a person name and concatenate.
///
/// Shared with the evaluation engine, which compares names on this form.
pub fn strip_name(raw: &str) -> String {
    let without_annotations = ANNOTATION.replace_all(raw, "");

    let spaced: String = without_annotations
        .chars()
        .map(|c| if NAME_SEPARATORS.contains(&c) { ' ' } else { c })
        .collect();

    spaced
        .trim_end_matches(|c: char| c.is_whitespace() || HYPHENS.contains(&c))
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

fn normalize_name(raw: &str) -> FieldValue {
    FieldValue::from_normalized(strip_name(raw))
}

fn normalize_age(raw: &str) -> FieldValue {
    let digits: String = raw
        .chars()
        .map(fold_digit)
        .filter(char::is_ascii_digit)
        .collect();

    match digits.parse::<u32>() {
        Ok(age) if AGE_RANGE.contains(&age) => FieldValue::Present(age.to_string()),
        _ => FieldValue::Missing,
    }
}

/// Convert a man-yen figure to yen.
///
/// A whole number of at least one man (10,000) is already yen-denominated and
/// passes through unchanged, which keeps canonical values stable on re-entry.
/// Up to four fractional digits are honoured (`65.5` → `655000`).
fn normalize_currency(raw: &str) -> FieldValue {
    let numeric: String = raw
        .chars()
        .map(fold_digit)
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let numeric = numeric.trim_matches('.');

    let (whole, fraction) = numeric.split_once('.').unwrap_or((numeric, ""));
    if whole.is_empty() || fraction.contains('.') {
        return FieldValue::Missing;
    }

    let Ok(whole) = whole.parse::<u64>() else {
        return FieldValue::Missing;
    };

    if fraction.is_empty() && whole >= YEN_PER_MAN {
        return FieldValue::Present(whole.to_string());
    }

    let mut fraction: String = fraction.chars().take(4).collect();
    while fraction.len() < 4 {
        fraction.push('0');
    }
    let Ok(fraction) = fraction.parse::<u64>() else {
        return FieldValue::Missing;
    };

    // Below one man the yen figure would re-enter as man-yen on a second pass.
    whole
        .checked_mul(YEN_PER_MAN)
        .and_then(|yen| yen.checked_add(fraction))
        .filter(|&yen| yen >= YEN_PER_MAN)
        .map(|yen| FieldValue::Present(yen.to_string()))
        .unwrap_or(FieldValue::Missing)
}

fn normalize_list(raw: &str) -> FieldValue {
    let mut rest = raw.trim();
    while let Some(label) = LEADING_LABEL.find(rest) {
        rest = &rest[label.end()..];
    }

    let unified: String = rest
        .chars()
        .map(|c| if LIST_SEPARATORS.contains(&c) { ',' } else { c })
        .collect();

    let items: Vec<&str> = unified
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect();

    FieldValue::from_normalized(items.join(","))
}

fn normalize_free_text(raw: &str) -> FieldValue {
    FieldValue::from_normalized(raw.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Fold full-width digits to ASCII; other characters pass through.
fn fold_digit(c: char) -> char {
    match c {
        '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
        '．' => '.',
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(raw: &str, kind: NormalizationKind) -> String {
        normalize(raw, kind).to_string()
    }

    // =================================================================
    // NAME
    // =================================================================

    #[test]
    fn name_strips_annotation_and_spaces() {
        assert_eq!(norm("田中　太郎 (フリガナ)", NormalizationKind::Name), "田中太郎");
        assert_eq!(norm("山田 花子（ヤマダ ハナコ）", NormalizationKind::Name), "山田花子");
        assert_eq!(norm("【確定】鈴木 一郎", NormalizationKind::Name), "鈴木一郎");
        assert_eq!(norm("佐藤[男性] 健", NormalizationKind::Name), "佐藤健");
    }

    #[test]
    fn name_annotation_removal_is_non_greedy() {
        assert_eq!(norm("(A)田中(B)太郎(C)", NormalizationKind::Name), "田中太郎");
    }

    #[test]
    fn name_separators_and_trailing_hyphens() {
        assert_eq!(norm("John・Smith", NormalizationKind::Name), "JohnSmith");
        assert_eq!(norm("taro_tanaka", NormalizationKind::Name), "tarotanaka");
        assert_eq!(norm("田中 太郎 ---", NormalizationKind::Name), "田中太郎");
        assert_eq!(norm("田中-太郎", NormalizationKind::Name), "田中-太郎");
        assert_eq!(norm("田中 太郎 - -", NormalizationKind::Name), "田中太郎");
        assert_eq!(norm("田中 太郎 －　‐ ", NormalizationKind::Name), "田中太郎");
    }

    #[test]
    fn name_only_annotation_is_missing() {
        assert!(normalize("(未定)", NormalizationKind::Name).is_missing());
        assert!(normalize("  ", NormalizationKind::Name).is_missing());
    }

    // =================================================================
    // AGE
    // =================================================================

    #[test]
    fn age_boundaries() {
        assert!(normalize("17", NormalizationKind::Age).is_missing());
        assert_eq!(norm("18", NormalizationKind::Age), "18");
        assert_eq!(norm("100", NormalizationKind::Age), "100");
        assert!(normalize("101", NormalizationKind::Age).is_missing());
    }

    #[test]
    fn age_strips_units_and_folds_width() {
        assert_eq!(norm("35歳", NormalizationKind::Age), "35");
        assert_eq!(norm("３５才", NormalizationKind::Age), "35");
        assert_eq!(norm("035", NormalizationKind::Age), "35");
    }

    #[test]
    fn age_non_numeric_is_missing() {
        assert!(normalize("三十五", NormalizationKind::Age).is_missing());
        assert!(normalize("", NormalizationKind::Age).is_missing());
        assert!(normalize("99999999999999999999", NormalizationKind::Age).is_missing());
    }

    // =================================================================
    // CURRENCY
    // =================================================================

    #[test]
    fn currency_man_yen_to_yen() {
        assert_eq!(norm("70", NormalizationKind::Currency), "700000");
        assert_eq!(norm("70万円", NormalizationKind::Currency), "700000");
        assert_eq!(norm("７５万", NormalizationKind::Currency), "750000");
    }

    #[test]
    fn currency_fractional_man_yen() {
        assert_eq!(norm("65.5", NormalizationKind::Currency), "655000");
        assert_eq!(norm("62.25万", NormalizationKind::Currency), "622500");
    }

    #[test]
    fn currency_yen_denominated_passes_through() {
        assert_eq!(norm("700,000円", NormalizationKind::Currency), "700000");
        assert_eq!(norm("700000", NormalizationKind::Currency), "700000");
    }

    #[test]
    fn currency_non_numeric_is_missing() {
        assert!(normalize("応相談", NormalizationKind::Currency).is_missing());
        assert!(normalize("1.2.3", NormalizationKind::Currency).is_missing());
        assert!(normalize(".", NormalizationKind::Currency).is_missing());
    }

    #[test]
    fn currency_below_one_man_is_missing() {
        assert!(normalize("0.5", NormalizationKind::Currency).is_missing());
        assert!(normalize("単価0.8万", NormalizationKind::Currency).is_missing());
        assert!(normalize("0", NormalizationKind::Currency).is_missing());
        assert_eq!(norm("1", NormalizationKind::Currency), "10000");
    }

    // =================================================================
    // DELIMITED LIST / FREE TEXT
    // =================================================================

    #[test]
    fn list_collapses_separators() {
        assert_eq!(
            norm("Java、Python / Go | C#,  SQL・Shell", NormalizationKind::DelimitedList),
            "Java,Python,Go,C#,SQL,Shell"
        );
    }

    #[test]
    fn list_strips_leading_label_and_redundant_commas() {
        assert_eq!(
            norm("【OS】 Windows, , Linux,", NormalizationKind::DelimitedList),
            "Windows,Linux"
        );
        assert_eq!(
            norm("[DB][必須] Oracle／MySQL", NormalizationKind::DelimitedList),
            "Oracle,MySQL"
        );
    }

    #[test]
    fn list_of_only_separators_is_missing() {
        assert!(normalize(" 、 / , ", NormalizationKind::DelimitedList).is_missing());
    }

    #[test]
    fn free_text_collapses_whitespace() {
        assert_eq!(
            norm("  PL   /  PM\t補佐 ", NormalizationKind::FreeText),
            "PL / PM 補佐"
        );
        assert!(normalize(" \n ", NormalizationKind::FreeText).is_missing());
    }

    // =================================================================
    // CROSS-KIND PROPERTIES
    // =================================================================

    #[test]
    fn sentinel_input_is_missing_for_every_kind() {
        for kind in [
            NormalizationKind::Name,
            NormalizationKind::Age,
            NormalizationKind::Currency,
            NormalizationKind::DelimitedList,
            NormalizationKind::FreeText,
        ] {
            assert!(normalize("N/A", kind).is_missing(), "{kind}");
            assert!(normalize(" n/a ", kind).is_missing(), "{kind}");
        }
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples: &[(&str, NormalizationKind)] = &[
            ("田中　太郎 (フリガナ)", NormalizationKind::Name),
            ("John・Smith --", NormalizationKind::Name),
            ("35歳", NormalizationKind::Age),
            ("18", NormalizationKind::Age),
            ("70万円", NormalizationKind::Currency),
            ("65.5", NormalizationKind::Currency),
            ("1", NormalizationKind::Currency),
            ("0.5", NormalizationKind::Currency),
            ("単価0.8万", NormalizationKind::Currency),
            ("田中 太郎 - -", NormalizationKind::Name),
            ("【スキル】Java、Python / Go", NormalizationKind::DelimitedList),
            ("  PL   /  PM ", NormalizationKind::FreeText),
        ];

        for (raw, kind) in samples {
            let once = normalize(raw, *kind);
            let twice = normalize(once.as_str(), *kind);
            assert_eq!(once, twice, "not idempotent for {raw:?} ({kind})");
        }
    }

    #[test]
    fn kind_round_trips_through_serde() {
        let kind: NormalizationKind = serde_json::from_str(r#""delimited_list""#).unwrap();
        assert_eq!(kind, NormalizationKind::DelimitedList);
        assert!(serde_json::from_str::<NormalizationKind>(r#""phone""#).is_err());
    }
}
