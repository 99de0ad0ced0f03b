use std::fmt::Write;

use super::types::EvaluationReport;

const HEADER: [&str; 7] = [
    "id",
    "field",
    "extracted",
    "reference",
    "extracted (万)",
    "reference (万)",
    "match",
];

/// Render the report as a pipe-separated text table followed by the summary.
pub fn render_table(report: &EvaluationReport) -> String {
    let mut out = String::new();
    push_row(&mut out, HEADER.iter().map(|s| s.to_string()));
    push_row(&mut out, HEADER.iter().map(|_| "---".to_string()));

    for row in &report.rows {
        for check in &row.checks {
            push_row(
                &mut out,
                [
                    row.id.clone(),
                    check.field.clone(),
                    check.extracted.to_string(),
                    check.reference.to_string(),
                    check.extracted_man_yen.clone().unwrap_or_default(),
                    check.reference_man_yen.clone().unwrap_or_default(),
                    check.outcome.marker().to_string(),
                ],
            );
        }
    }

    out.push('\n');
    let _ = writeln!(out, "accuracy: {}", report.summary);
    for field in &report.per_field {
        let _ = writeln!(out, "  {}: {}", field.field, field.accuracy);
    }
    let join = &report.join;
    let _ = writeln!(
        out,
        "joined: {}, extracted only: {}, reference only: {}, duplicate ids: {}",
        join.joined, join.extracted_only, join.reference_only, join.duplicate_ids
    );
    out
}

fn push_row(out: &mut String, cells: impl IntoIterator<Item = String>) {
    let cells: Vec<String> = cells.into_iter().map(|c| c.replace('|', "/")).collect();
    let _ = writeln!(out, "| {} |", cells.join(" | "));
}
