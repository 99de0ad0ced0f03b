//! JSON Lines input and output for batch runs.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::pipeline::extraction::{ExtractedRecord, ExtractionError, RawDocument};

/// Load documents from a JSONL file, one [`RawDocument`] per non-blank line.
pub fn load_documents(path: &Path) -> Result<Vec<RawDocument>, ExtractionError> {
    let file = File::open(path)?;
    let documents = parse_documents(BufReader::new(file))?;
    tracing::info!(
        path = %path.display(),
        documents = documents.len(),
        "Loaded documents"
    );
    Ok(documents)
}

/// Parse JSONL documents. Line numbers in errors are 1-based.
pub fn parse_documents<R: BufRead>(reader: R) -> Result<Vec<RawDocument>, ExtractionError> {
    let mut documents = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let document = serde_json::from_str::<RawDocument>(&line).map_err(|e| {
            ExtractionError::MalformedInput {
                line: i + 1,
                reason: e.to_string(),
            }
        })?;
        documents.push(document);
    }
    Ok(documents)
}

/// Write records as JSONL, one record per line, in the given order.
pub fn write_records<W: Write>(writer: W, records: &[ExtractedRecord]) -> Result<(), ExtractionError> {
    let mut writer = BufWriter::new(writer);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Write records to a JSONL file, replacing any existing content.
pub fn save_records(path: &Path, records: &[ExtractedRecord]) -> Result<(), ExtractionError> {
    write_records(File::create(path)?, records)?;
    tracing::info!(path = %path.display(), records = records.len(), "Wrote records");
    Ok(())
}
