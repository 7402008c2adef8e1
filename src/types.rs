/// Word statistics for a single corpus document
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentStats {
    pub text: String,
    pub words_count: usize,
    pub words_length: Vec<usize>,
}

/// One document measured with one tokenizer.
///
/// The `Option` columns are the heavy ones; they are `None` once the row has been
/// reduced to keep the persisted output small.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkRow {
    pub tokenizer: String,
    pub document_index: usize,
    pub text: Option<String>,
    pub text_characters: usize,
    pub words: Option<Vec<String>>,
    pub words_count: usize,
    pub avg_words_length: f64,
    pub tokens: Option<String>,
    pub tokens_split: Option<Vec<String>>,
    pub tokens_count: usize,
    pub tokens_characters: usize,
    pub avg_tokens_length: f64,
    pub tokens_to_words_ratio: f64,
    pub bytes_per_token: f64,
}

impl BenchmarkRow {
    /// Drop the text and list columns
    pub fn reduce(&mut self) {
        self.text = None;
        self.words = None;
        self.tokens = None;
        self.tokens_split = None;
    }

    pub fn is_reduced(&self) -> bool {
        self.text.is_none()
            && self.words.is_none()
            && self.tokens.is_none()
            && self.tokens_split.is_none()
    }
}

/// A benchmark row paired with its normalized sequence length
#[derive(Debug, Clone, PartialEq)]
pub struct NslRow {
    pub row: BenchmarkRow,
    pub nsl: f64,
}

/// Mean metrics of one tokenizer over every document it processed
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizerSummary {
    pub tokenizer: String,
    pub documents: usize,
    pub mean_tokens_count: f64,
    pub mean_words_count: f64,
    pub mean_tokens_to_words_ratio: f64,
    pub mean_bytes_per_token: f64,
}
