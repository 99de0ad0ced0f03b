use super::types::ComparisonRule;
use crate::pipeline::extraction::normalize::{strip_name, YEN_PER_MAN};
use crate::pipeline::extraction::FieldValue;

/// Characters removed from both sides before a plain comparison.
const PLAIN_IGNORED: &[char] = &[
    '\u{200B}', // zero-width space
    ',', '，', '、', '-', '‐', '－', '−', '歳', '万',
];

/// Bring a value to the form two sides are compared on.
pub fn comparison_key(value: &str, rule: ComparisonRule) -> String {
    match rule {
        ComparisonRule::Name => strip_name(value).to_lowercase(),
        ComparisonRule::Plain => value
            .chars()
            .filter(|c| !c.is_whitespace() && !PLAIN_IGNORED.contains(c))
            .collect::<String>()
            .to_lowercase(),
    }
}

/// Man-yen display value of a yen-denominated field (integer division).
pub fn man_yen(value: &FieldValue) -> Option<String> {
    let digits: String = value
        .present()?
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    let yen = digits.parse::<u64>().ok()?;
    Some((yen / YEN_PER_MAN).to_string())
}
