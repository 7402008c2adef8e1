use crate::types::{BenchmarkRow, DocumentStats, NslRow};
use anyhow::{Context, Result};
use duckdb::{Connection, params};

pub const DATASET_STATISTICS_TABLE: &str = "DATASET_STATISTICS";
pub const OVERALL_BENCHMARK_TABLE: &str = "OVERALL_BENCHMARK_RESULTS";
pub const NSL_TABLE: &str = "NSL";

const BENCHMARK_COLUMNS: &str = r#"
    tokenizer VARCHAR,
    document_index BIGINT,
    text VARCHAR,
    text_characters BIGINT,
    words VARCHAR,
    words_count BIGINT,
    avg_words_length DOUBLE,
    tokens VARCHAR,
    tokens_split VARCHAR,
    tokens_count BIGINT,
    tokens_characters BIGINT,
    avg_tokens_length DOUBLE,
    tokens_to_words_ratio DOUBLE,
    bytes_per_token DOUBLE
"#;

/// Quote a table name so tokenizer names like `bert-base-uncased` are valid SQL
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// List columns are stored as JSON arrays
fn to_json_column<T: serde::Serialize>(value: Option<&T>) -> Result<Option<String>> {
    value
        .map(|v| serde_json::to_string(v).context("Failed to encode list column"))
        .transpose()
}

fn from_json_column(value: Option<String>) -> Result<Option<Vec<String>>> {
    value
        .map(|v| serde_json::from_str(&v).context("Failed to decode list column"))
        .transpose()
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path`; `:memory:` gives a throwaway store
    pub fn init(path: &str) -> Result<Self> {
        let conn =
            Connection::open(path).context(format!("Failed to open database at {}", path))?;
        Ok(Self { conn })
    }

    /// Replace the dataset statistics table
    pub fn save_dataset_statistics(&self, stats: &[DocumentStats]) -> Result<()> {
        let table = quote_identifier(DATASET_STATISTICS_TABLE);
        self.conn.execute(
            &format!(
                "CREATE OR REPLACE TABLE {} (text VARCHAR, words_count BIGINT, words_length VARCHAR)",
                table
            ),
            [],
        )?;

        let mut appender = self.conn.appender(DATASET_STATISTICS_TABLE)?;
        for doc in stats {
            appender.append_row(params![
                &doc.text,
                doc.words_count as i64,
                serde_json::to_string(&doc.words_length)?,
            ])?;
        }
        appender.flush()?;
        Ok(())
    }

    /// Replace `table` with `rows` using the Appender API
    pub fn save_benchmark_results(&self, rows: &[BenchmarkRow], table: &str) -> Result<()> {
        self.conn
            .execute(
                &format!(
                    "CREATE OR REPLACE TABLE {} ({})",
                    quote_identifier(table),
                    BENCHMARK_COLUMNS
                ),
                [],
            )
            .context(format!("Failed to create table {}", table))?;

        let mut appender = self.conn.appender(table)?;
        for row in rows {
            appender.append_row(params![
                &row.tokenizer,
                row.document_index as i64,
                row.text.as_deref(),
                row.text_characters as i64,
                to_json_column(row.words.as_ref())?,
                row.words_count as i64,
                row.avg_words_length,
                row.tokens.as_deref(),
                to_json_column(row.tokens_split.as_ref())?,
                row.tokens_count as i64,
                row.tokens_characters as i64,
                row.avg_tokens_length,
                row.tokens_to_words_ratio,
                row.bytes_per_token,
            ])?;
        }
        appender.flush()?;
        Ok(())
    }

    /// Replace the NSL table: benchmark columns followed by the NSL value
    pub fn save_nsl_results(&self, rows: &[NslRow]) -> Result<()> {
        self.conn
            .execute(
                &format!(
                    "CREATE OR REPLACE TABLE {} ({}, nsl DOUBLE)",
                    quote_identifier(NSL_TABLE),
                    BENCHMARK_COLUMNS
                ),
                [],
            )
            .context("Failed to create NSL table")?;

        let mut appender = self.conn.appender(NSL_TABLE)?;
        for NslRow { row, nsl } in rows {
            appender.append_row(params![
                &row.tokenizer,
                row.document_index as i64,
                row.text.as_deref(),
                row.text_characters as i64,
                to_json_column(row.words.as_ref())?,
                row.words_count as i64,
                row.avg_words_length,
                row.tokens.as_deref(),
                to_json_column(row.tokens_split.as_ref())?,
                row.tokens_count as i64,
                row.tokens_characters as i64,
                row.avg_tokens_length,
                row.tokens_to_words_ratio,
                row.bytes_per_token,
                *nsl,
            ])?;
        }
        appender.flush()?;
        Ok(())
    }

    /// Load benchmark rows from `table` in insertion order
    pub fn load_benchmark_results(&self, table: &str) -> Result<Vec<BenchmarkRow>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT tokenizer, document_index, text, text_characters, words, words_count, \
                 avg_words_length, tokens, tokens_split, tokens_count, tokens_characters, \
                 avg_tokens_length, tokens_to_words_ratio, bytes_per_token \
                 FROM {} ORDER BY rowid",
                quote_identifier(table)
            ))
            .context(format!("Failed to query table {}", table))?;

        let raw = stmt
            .query_map([], |row| {
                let words: Option<String> = row.get(4)?;
                let tokens_split: Option<String> = row.get(8)?;
                let benchmark = BenchmarkRow {
                    tokenizer: row.get(0)?,
                    document_index: row.get::<_, i64>(1)? as usize,
                    text: row.get(2)?,
                    text_characters: row.get::<_, i64>(3)? as usize,
                    words: None,
                    words_count: row.get::<_, i64>(5)? as usize,
                    avg_words_length: row.get(6)?,
                    tokens: row.get(7)?,
                    tokens_split: None,
                    tokens_count: row.get::<_, i64>(9)? as usize,
                    tokens_characters: row.get::<_, i64>(10)? as usize,
                    avg_tokens_length: row.get(11)?,
                    tokens_to_words_ratio: row.get(12)?,
                    bytes_per_token: row.get(13)?,
                };
                Ok((benchmark, words, tokens_split))
            })?
            .collect::<duckdb::Result<Vec<_>>>()?;

        raw.into_iter()
            .map(|(mut row, words, tokens_split)| {
                row.words = from_json_column(words)?;
                row.tokens_split = from_json_column(tokens_split)?;
                Ok(row)
            })
            .collect()
    }

    pub fn drop_table(&self, table: &str) -> Result<()> {
        self.conn
            .execute(&format!("DROP TABLE IF EXISTS {}", quote_identifier(table)), [])
            .context(format!("Failed to drop table {}", table))?;
        Ok(())
    }

    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?")?;
        let count: i64 = stmt.query_row(params![table], |row| row.get(0))?;
        Ok(count > 0)
    }

    pub fn count_rows(&self, table: &str) -> Result<usize> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT COUNT(*) FROM {}", quote_identifier(table)))?;
        let count: i64 = stmt.query_row([], |row| row.get(0))?;
        Ok(count as usize)
    }
}
