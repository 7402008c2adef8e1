use crate::tokenizer::{TokenizedText, is_custom_tokenizer};
use crate::types::{BenchmarkRow, DocumentStats, NslRow, TokenizerSummary};

/// Keep at most `max` documents from the start of the corpus
pub fn truncate_documents(documents: &[String], max: Option<usize>) -> &[String] {
    match max {
        Some(max) if max <= documents.len() => &documents[..max],
        _ => documents,
    }
}

/// Number of characters (not bytes) in `text`
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Mean character length of `items`, 0 when empty
pub fn mean_char_len<S: AsRef<str>>(items: &[S]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    let total: usize = items.iter().map(|item| char_len(item.as_ref())).sum();
    total as f64 / items.len() as f64
}

/// `numerator / denominator`, or 0 when the denominator is 0
pub fn guarded_ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

pub fn split_words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

pub fn document_stats(text: &str) -> DocumentStats {
    let words_length: Vec<usize> = text.split_whitespace().map(char_len).collect();
    DocumentStats {
        text: text.to_string(),
        words_count: words_length.len(),
        words_length,
    }
}

/// Derive every benchmark column for one document and its tokenization
pub fn benchmark_row(
    tokenizer: &str,
    document_index: usize,
    text: &str,
    tokenized: TokenizedText,
) -> BenchmarkRow {
    let words = split_words(text);
    let text_characters = char_len(text);
    let words_count = words.len();
    let tokens_count = tokenized.split.len();

    BenchmarkRow {
        tokenizer: tokenizer.to_string(),
        document_index,
        text: Some(text.to_string()),
        text_characters,
        avg_words_length: mean_char_len(&words),
        words: Some(words),
        words_count,
        tokens_characters: char_len(&tokenized.tokens),
        avg_tokens_length: mean_char_len(&tokenized.split),
        tokens: Some(tokenized.tokens),
        tokens_split: Some(tokenized.split),
        tokens_count,
        tokens_to_words_ratio: guarded_ratio(tokens_count, words_count),
        bytes_per_token: guarded_ratio(text_characters, tokens_count),
    }
}

/// Tokenizer names in order of first appearance
pub fn tokenizer_names(rows: &[BenchmarkRow]) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for row in rows {
        if !names.contains(&row.tokenizer.as_str()) {
            names.push(&row.tokenizer);
        }
    }
    names
}

/// Divide every tokenizer's token counts by the custom tokenizer's, document by document.
///
/// Rows are paired by position within each tokenizer's block, so both blocks must
/// cover the same documents in the same order. A tokenizer row with no baseline
/// counterpart is dropped. Returns `None` if no custom tokenizer rows exist.
pub fn normalized_sequence_lengths(rows: &[BenchmarkRow]) -> Option<Vec<NslRow>> {
    let baseline_name = rows
        .iter()
        .map(|row| row.tokenizer.as_str())
        .find(|name| is_custom_tokenizer(name))?;
    let baseline: Vec<usize> = rows
        .iter()
        .filter(|row| row.tokenizer == baseline_name)
        .map(|row| row.tokens_count)
        .collect();

    let mut nsl_rows = Vec::with_capacity(rows.len());
    for name in tokenizer_names(rows) {
        let chunk = rows.iter().filter(|row| row.tokenizer == name);
        for (row, &reference) in chunk.zip(baseline.iter()) {
            nsl_rows.push(NslRow {
                nsl: guarded_ratio(row.tokens_count, reference),
                row: row.clone(),
            });
        }
    }
    Some(nsl_rows)
}

/// Mean metrics per tokenizer, in order of first appearance
pub fn summarize(rows: &[BenchmarkRow]) -> Vec<TokenizerSummary> {
    tokenizer_names(rows)
        .into_iter()
        .map(|name| {
            let chunk: Vec<&BenchmarkRow> =
                rows.iter().filter(|row| row.tokenizer == name).collect();
            let documents = chunk.len();
            let mean = |value: fn(&BenchmarkRow) -> f64| {
                if documents == 0 {
                    0.0
                } else {
                    chunk.iter().map(|row| value(row)).sum::<f64>() / documents as f64
                }
            };

            TokenizerSummary {
                tokenizer: name.to_string(),
                documents,
                mean_tokens_count: mean(|row| row.tokens_count as f64),
                mean_words_count: mean(|row| row.words_count as f64),
                mean_tokens_to_words_ratio: mean(|row| row.tokens_to_words_ratio),
                mean_bytes_per_token: mean(|row| row.bytes_per_token),
            }
        })
        .collect()
}

/// Mean NSL per tokenizer, in order of first appearance
pub fn mean_nsl(rows: &[NslRow]) -> Vec<(String, f64)> {
    let mut means: Vec<(String, f64, usize)> = Vec::new();
    for NslRow { row, nsl } in rows {
        match means.iter_mut().find(|(name, _, _)| *name == row.tokenizer) {
            Some((_, total, count)) => {
                *total += nsl;
                *count += 1;
            }
            None => means.push((row.tokenizer.clone(), *nsl, 1)),
        }
    }
    means
        .into_iter()
        .map(|(name, total, count)| (name, total / count as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::CUSTOM_TOKENIZER_NAME;

    fn row_with_count(
        tokenizer: &str,
        document_index: usize,
        tokens_count: usize,
    ) -> BenchmarkRow {
        let split: Vec<String> = (0..tokens_count).map(|i| format!("t{}", i)).collect();
        benchmark_row(
            tokenizer,
            document_index,
            "some text",
            TokenizedText::from_split(split),
        )
    }

    #[test]
    fn test_truncate_documents() {
        let documents: Vec<String> = (0..10).map(|i| format!("doc {}", i)).collect();

        assert_eq!(truncate_documents(&documents, Some(3)).len(), 3);
        assert_eq!(truncate_documents(&documents, Some(3))[2], "doc 2");
        assert_eq!(truncate_documents(&documents, Some(10)).len(), 10);
        assert_eq!(truncate_documents(&documents, Some(50)).len(), 10);
        assert_eq!(truncate_documents(&documents, None).len(), 10);
        assert!(truncate_documents(&documents, Some(0)).is_empty());
    }

    #[test]
    fn test_document_stats() {
        let stats = document_stats("  The quick\tbrown\n fox ");
        assert_eq!(stats.words_count, 4);
        assert_eq!(stats.words_length, vec![3, 5, 5, 3]);

        let empty = document_stats("   ");
        assert_eq!(empty.words_count, 0);
        assert!(empty.words_length.is_empty());
    }

    #[test]
    fn test_benchmark_row_metrics() {
        let tokenized = TokenizedText::from_split(vec![
            "héllo".to_string(),
            "wor".to_string(),
            "ld".to_string(),
        ]);
        let row = benchmark_row("tok", 7, "héllo world", tokenized);

        assert_eq!(row.document_index, 7);
        assert_eq!(row.text_characters, 11);
        assert_eq!(row.words_count, 2);
        assert_eq!(row.avg_words_length, 5.0);
        assert_eq!(row.tokens.as_deref(), Some("héllo wor ld"));
        assert_eq!(row.tokens_count, 3);
        assert_eq!(row.tokens_characters, 12);
        assert!((row.avg_tokens_length - 10.0 / 3.0).abs() < 1e-12);
        assert_eq!(row.tokens_to_words_ratio, 1.5);
        assert!((row.bytes_per_token - 11.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_ratio_guard_on_empty_document() {
        let row = benchmark_row("tok", 0, "", TokenizedText::from_split(Vec::new()));

        assert_eq!(row.words_count, 0);
        assert_eq!(row.tokens_count, 0);
        assert_eq!(row.avg_words_length, 0.0);
        assert_eq!(row.avg_tokens_length, 0.0);
        assert_eq!(row.tokens_to_words_ratio, 0.0);
        assert_eq!(row.bytes_per_token, 0.0);
    }

    #[test]
    fn test_ratio_guard_whitespace_only() {
        // Tokens without words, e.g. a tokenizer that keeps whitespace pieces
        let row = benchmark_row("tok", 0, "   ", TokenizedText::from_split(vec!["   ".into()]));
        assert_eq!(row.words_count, 0);
        assert_eq!(row.tokens_to_words_ratio, 0.0);
        assert_eq!(row.bytes_per_token, 3.0);
    }

    #[test]
    fn test_normalized_sequence_lengths() {
        let rows = vec![
            row_with_count("gpt2", 0, 6),
            row_with_count("gpt2", 1, 3),
            row_with_count("gpt2", 2, 5),
            row_with_count(CUSTOM_TOKENIZER_NAME, 0, 3),
            row_with_count(CUSTOM_TOKENIZER_NAME, 1, 0),
            row_with_count(CUSTOM_TOKENIZER_NAME, 2, 2),
        ];

        let nsl = normalized_sequence_lengths(&rows).expect("Baseline should be present");
        let values: Vec<(&str, f64)> = nsl
            .iter()
            .map(|r| (r.row.tokenizer.as_str(), r.nsl))
            .collect();

        assert_eq!(
            values,
            vec![
                ("gpt2", 2.0),
                ("gpt2", 0.0),
                ("gpt2", 2.5),
                (CUSTOM_TOKENIZER_NAME, 1.0),
                (CUSTOM_TOKENIZER_NAME, 0.0),
                (CUSTOM_TOKENIZER_NAME, 1.0),
            ]
        );
    }

    #[test]
    fn test_nsl_without_baseline() {
        let rows = vec![row_with_count("gpt2", 0, 6), row_with_count("bert", 0, 4)];
        assert_eq!(normalized_sequence_lengths(&rows), None);
        assert_eq!(normalized_sequence_lengths(&[]), None);
    }

    #[test]
    fn test_nsl_pairs_positionally() {
        let rows = vec![
            row_with_count("gpt2", 0, 4),
            row_with_count("gpt2", 1, 4),
            row_with_count(CUSTOM_TOKENIZER_NAME, 0, 2),
        ];

        let nsl = normalized_sequence_lengths(&rows).expect("Baseline should be present");
        assert_eq!(nsl.len(), 2);
        assert_eq!(nsl[0].nsl, 2.0);
        assert_eq!(nsl[0].row.document_index, 0);
    }

    #[test]
    fn test_mean_nsl() {
        let rows = vec![
            row_with_count("gpt2", 0, 6),
            row_with_count("gpt2", 1, 2),
            row_with_count(CUSTOM_TOKENIZER_NAME, 0, 3),
            row_with_count(CUSTOM_TOKENIZER_NAME, 1, 2),
        ];
        let nsl = normalized_sequence_lengths(&rows).expect("Baseline should be present");

        assert_eq!(
            mean_nsl(&nsl),
            vec![
                ("gpt2".to_string(), 1.5),
                (CUSTOM_TOKENIZER_NAME.to_string(), 1.0)
            ]
        );
    }

    #[test]
    fn test_summarize() {
        let rows = vec![
            row_with_count("b", 0, 2),
            row_with_count("a", 0, 4),
            row_with_count("b", 1, 6),
        ];

        let summary = summarize(&rows);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].tokenizer, "b");
        assert_eq!(summary[0].documents, 2);
        assert_eq!(summary[0].mean_tokens_count, 4.0);
        assert_eq!(summary[0].mean_words_count, 2.0);
        assert_eq!(summary[0].mean_tokens_to_words_ratio, 2.0);
        assert_eq!(summary[1].tokenizer, "a");
        assert_eq!(summary[1].mean_bytes_per_token, 9.0 / 4.0);
    }
}
