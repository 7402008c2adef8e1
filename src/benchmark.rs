use crate::config::{BenchmarkSettings, ResourcePaths};
use crate::database::{Database, NSL_TABLE, OVERALL_BENCHMARK_TABLE};
use crate::export;
use crate::metrics;
use crate::tokenizer::{Tokenizer, sanitize_name};
use crate::types::{BenchmarkRow, DocumentStats, NslRow};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

/// Runs every configured tokenizer over a corpus and persists the measurements
pub struct BenchmarkTokenizers {
    settings: BenchmarkSettings,
    paths: ResourcePaths,
    database: Database,
    tokenizers: Vec<Box<dyn Tokenizer>>,
}

impl BenchmarkTokenizers {
    pub fn new(
        settings: BenchmarkSettings,
        paths: ResourcePaths,
        database: Database,
        tokenizers: Vec<Box<dyn Tokenizer>>,
    ) -> Self {
        Self {
            settings,
            paths,
            database,
            tokenizers,
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    fn truncate<'a>(&self, documents: &'a [String]) -> &'a [String] {
        let documents = metrics::truncate_documents(documents, self.settings.max_num_docs);
        debug!("Processing {} document(s)", documents.len());
        documents
    }

    fn progress_bar(&self, len: usize, tokenizer: &str) -> Result<ProgressBar> {
        let progress = ProgressBar::new(len as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} docs | {msg}")?
                .progress_chars("#>-"),
        );
        progress.set_message(tokenizer.to_string());
        Ok(progress)
    }

    /// Word counts and word lengths of every document
    pub fn aggregate_dataset_stats(&self, documents: &[String]) -> Result<Vec<DocumentStats>> {
        let documents = self.truncate(documents);
        let stats: Vec<DocumentStats> = documents
            .iter()
            .map(|doc| metrics::document_stats(doc))
            .collect();

        if self.settings.save_csv {
            info!("Export to CSV requested. Now saving dataset statistics to CSV file");
            let path = self.paths.datasets.join("dataset_statistics.csv");
            export::write_dataset_statistics(&path, &stats)?;
        }

        self.database
            .save_dataset_statistics(&stats)
            .context("Failed to save dataset statistics")?;
        Ok(stats)
    }

    /// Tokenize every document with every tokenizer.
    ///
    /// Each tokenizer's rows go to their own table, then all rows are saved together to
    /// the overall results table. Returns the merged rows.
    pub fn run_tokenizer_benchmarks(&self, documents: &[String]) -> Result<Vec<BenchmarkRow>> {
        let documents = self.truncate(documents);
        let mut merged = Vec::with_capacity(documents.len() * self.tokenizers.len());
        let mut seen: Vec<&str> = Vec::with_capacity(self.tokenizers.len());

        for tokenizer in &self.tokenizers {
            let name = tokenizer.name();
            if seen.contains(&name) {
                warn!(tokenizer = name, "Tokenizer already benchmarked; skipping repeat");
                continue;
            }
            seen.push(name);
            let table = sanitize_name(name);
            info!(tokenizer = name, custom = tokenizer.is_custom(), "Tokenizing documents");

            let progress = self.progress_bar(documents.len(), name)?;
            let mut rows = Vec::with_capacity(documents.len());
            for (index, text) in documents.iter().enumerate() {
                let tokenized = tokenizer
                    .tokenize(text)
                    .context(format!("{} failed on document {}", name, index))?;
                let mut row = metrics::benchmark_row(name, index, text, tokenized);
                if self.settings.reduce_csv_size {
                    row.reduce();
                }
                rows.push(row);
                progress.inc(1);
            }
            progress.finish_and_clear();

            if self.settings.save_csv {
                info!("Export to CSV requested. Now saving {} benchmark to CSV file", table);
                let path = self.paths.evaluation.join(format!("{}_benchmark.csv", table));
                export::write_benchmark_results(&path, &rows)?;
            }

            self.database
                .save_benchmark_results(&rows, &table)
                .context(format!("Failed to save {} benchmark", name))?;
            merged.extend(rows);
        }

        if self.settings.save_csv {
            info!("Export to CSV requested. Now saving all benchmarks to CSV file");
            let path = self.paths.evaluation.join("tokenizers_benchmark.csv");
            export::write_benchmark_results(&path, &merged)?;
        }

        self.database
            .save_benchmark_results(&merged, OVERALL_BENCHMARK_TABLE)
            .context("Failed to save overall benchmark results")?;
        Ok(merged)
    }

    /// Token counts of every tokenizer relative to the custom tokenizer.
    ///
    /// Reads the overall results saved by [`Self::run_tokenizer_benchmarks`]. Without
    /// custom tokenizer rows nothing is computed, any NSL table from an earlier run is
    /// dropped and `None` is returned.
    pub fn normalized_sequence_length(&self) -> Result<Option<Vec<NslRow>>> {
        let rows = self
            .database
            .load_benchmark_results(OVERALL_BENCHMARK_TABLE)
            .context("Failed to load benchmark results; run the tokenizer benchmarks first")?;

        let Some(nsl_rows) = metrics::normalized_sequence_lengths(&rows) else {
            warn!("NSL value cannot be calculated without a custom tokenizer as reference");
            self.database
                .drop_table(NSL_TABLE)
                .context("Failed to drop stale NSL results")?;
            return Ok(None);
        };

        for name in metrics::tokenizer_names(&rows) {
            info!("NSL value is calculated for {} versus custom tokenizer", name);
        }

        if self.settings.save_csv {
            info!("Export to CSV requested. Now saving NSL benchmark to CSV file");
            let path = self.paths.evaluation.join("NSL_benchmark.csv");
            export::write_nsl_results(&path, &nsl_rows)?;
        }

        self.database
            .save_nsl_results(&nsl_rows)
            .context("Failed to save NSL results")?;
        Ok(Some(nsl_rows))
    }
}
