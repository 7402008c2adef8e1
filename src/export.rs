use crate::types::{BenchmarkRow, DocumentStats, NslRow};
use anyhow::{Context, Result};
use csv::{Writer, WriterBuilder};
use std::fs::File;
use std::path::Path;
use tracing::debug;

pub const CSV_DELIMITER: u8 = b';';

const HEAVY_COLUMNS: [&str; 4] = ["Text", "Words", "Tokens", "Tokens split"];

const BENCHMARK_HEADERS: [&str; 14] = [
    "Tokenizer",
    "Document index",
    "Text",
    "Text characters",
    "Words",
    "Words count",
    "AVG words length",
    "Tokens",
    "Tokens split",
    "Tokens count",
    "Tokens characters",
    "AVG tokens length",
    "Tokens to words ratio",
    "Bytes per token",
];

fn open_writer(path: &Path) -> Result<Writer<File>> {
    WriterBuilder::new()
        .delimiter(CSV_DELIMITER)
        .from_path(path)
        .context(format!("Failed to create CSV file {}", path.display()))
}

/// Header row of a benchmark table; reduced tables omit the heavy columns
fn benchmark_headers(reduced: bool) -> Vec<&'static str> {
    BENCHMARK_HEADERS
        .into_iter()
        .filter(|header| !reduced || !HEAVY_COLUMNS.contains(header))
        .collect()
}

fn benchmark_record(row: &BenchmarkRow, reduced: bool) -> Result<Vec<String>> {
    let mut record = vec![row.tokenizer.clone(), row.document_index.to_string()];
    if !reduced {
        record.push(row.text.clone().unwrap_or_default());
    }
    record.push(row.text_characters.to_string());
    if !reduced {
        record.push(serde_json::to_string(&row.words)?);
    }
    record.push(row.words_count.to_string());
    record.push(row.avg_words_length.to_string());
    if !reduced {
        record.push(row.tokens.clone().unwrap_or_default());
        record.push(serde_json::to_string(&row.tokens_split)?);
    }
    record.extend([
        row.tokens_count.to_string(),
        row.tokens_characters.to_string(),
        row.avg_tokens_length.to_string(),
        row.tokens_to_words_ratio.to_string(),
        row.bytes_per_token.to_string(),
    ]);
    Ok(record)
}

pub fn write_dataset_statistics(path: &Path, stats: &[DocumentStats]) -> Result<()> {
    let mut writer = open_writer(path)?;
    writer.write_record(["Text", "Words count", "Words length"])?;
    for doc in stats {
        writer.write_record([
            doc.text.clone(),
            doc.words_count.to_string(),
            serde_json::to_string(&doc.words_length)?,
        ])?;
    }
    writer.flush()?;
    debug!(path = %path.display(), "Wrote {} row(s)", stats.len());
    Ok(())
}

pub fn write_benchmark_results(path: &Path, rows: &[BenchmarkRow]) -> Result<()> {
    let reduced = rows.first().is_some_and(BenchmarkRow::is_reduced);
    let mut writer = open_writer(path)?;
    writer.write_record(benchmark_headers(reduced))?;
    for row in rows {
        writer.write_record(benchmark_record(row, reduced)?)?;
    }
    writer.flush()?;
    debug!(path = %path.display(), "Wrote {} row(s)", rows.len());
    Ok(())
}

pub fn write_nsl_results(path: &Path, rows: &[NslRow]) -> Result<()> {
    let reduced = rows.first().is_some_and(|r| r.row.is_reduced());
    let mut writer = open_writer(path)?;
    let mut headers = benchmark_headers(reduced);
    headers.push("NSL");
    writer.write_record(headers)?;
    for NslRow { row, nsl } in rows {
        let mut record = benchmark_record(row, reduced)?;
        record.push(nsl.to_string());
        writer.write_record(record)?;
    }
    writer.flush()?;
    debug!(path = %path.display(), "Wrote {} row(s)", rows.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{benchmark_row, document_stats};
    use crate::tokenizer::TokenizedText;

    fn sample_row() -> BenchmarkRow {
        benchmark_row(
            "tiktoken/gpt2",
            0,
            "a; b",
            TokenizedText::from_split(vec!["a".into(), ";".into(), " b".into()]),
        )
    }

    #[test]
    fn test_dataset_statistics_csv() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("dataset_statistics.csv");

        write_dataset_statistics(&path, &[document_stats("hi there")]).expect("Failed to write");

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "Text;Words count;Words length\nhi there;2;[2,5]\n");
    }

    #[test]
    fn test_benchmark_csv_quotes_delimiter() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("tiktoken_gpt2_benchmark.csv");

        write_benchmark_results(&path, &[sample_row()]).expect("Failed to write");

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(CSV_DELIMITER)
            .from_path(&path)
            .unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 14);
        assert_eq!(&headers[0], "Tokenizer");

        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[2], "a; b");
        assert_eq!(&record[9], "3");
    }

    #[test]
    fn test_reduced_benchmark_csv() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("NSL_benchmark.csv");
        let mut row = sample_row();
        row.reduce();

        write_nsl_results(&path, &[NslRow { row, nsl: 1.5 }]).expect("Failed to write");

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Tokenizer;Document index;Text characters;Words count;AVG words length;\
             Tokens count;Tokens characters;AVG tokens length;Tokens to words ratio;\
             Bytes per token;NSL"
        );
        assert_eq!(
            lines.next().unwrap(),
            "tiktoken/gpt2;0;4;2;1.5;3;6;1.3333333333333333;1.5;1.3333333333333333;1.5"
        );
    }
}
