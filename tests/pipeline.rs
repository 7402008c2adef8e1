use tokenbench::benchmark::BenchmarkTokenizers;
use tokenbench::config::{Configuration, ResourcePaths};
use tokenbench::corpus::load_documents;
use tokenbench::database::{DATASET_STATISTICS_TABLE, Database, NSL_TABLE, OVERALL_BENCHMARK_TABLE};
use tokenbench::env::EnvironmentVariables;
use tokenbench::tokenizer::{CUSTOM_TOKENIZER_NAME, load_tokenizers};

const CUSTOM_TOKENIZER_JSON: &str = r#"{
    "version": "1.0",
    "truncation": null,
    "padding": null,
    "added_tokens": [],
    "normalizer": null,
    "pre_tokenizer": { "type": "WhitespaceSplit" },
    "post_processor": null,
    "decoder": null,
    "model": {
        "type": "WordLevel",
        "vocab": { "[UNK]": 0, "the": 1, "cat": 2, "sat": 3, "on": 4, "mat": 5 },
        "unk_token": "[UNK]"
    }
}"#;

const CORPUS: &str = "\
the cat sat on the mat
tokenization benchmarks compare vocabularies
the
an unusually long-winded sentence, with punctuation; and numbers 12345!
";

fn setup_project(config: &str) -> (tempfile::TempDir, ResourcePaths) {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let paths = ResourcePaths::new(root.path());
    paths.ensure_dirs().expect("Failed to create dirs");

    std::fs::create_dir_all(paths.config_file.parent().unwrap()).unwrap();
    std::fs::write(&paths.config_file, config).unwrap();
    std::fs::write(paths.tokenizers.join("custom.json"), CUSTOM_TOKENIZER_JSON).unwrap();
    std::fs::write(root.path().join("corpus.txt"), CORPUS).unwrap();

    (root, paths)
}

fn open(paths: &ResourcePaths) -> BenchmarkTokenizers {
    let configuration = Configuration::load(&paths.config_file).expect("Failed to load config");
    let env = EnvironmentVariables::load(&paths.env_file);
    let tokenizers =
        load_tokenizers(&configuration, paths, &env).expect("Failed to load tokenizers");
    let database = Database::init(paths.database_file.to_str().unwrap())
        .expect("Failed to open database");
    BenchmarkTokenizers::new(configuration.benchmarks, paths.clone(), database, tokenizers)
}

#[test]
fn test_full_run_with_custom_baseline() {
    let (root, paths) = setup_project(
        r#"{
            "TOKENIZERS": ["tiktoken/gpt2", "tiktoken/cl100k_base"],
            "CUSTOM_TOKENIZER": "custom.json",
            "benchmarks": { "MAX_NUM_DOCS": 3, "SAVE_CSV": true }
        }"#,
    );
    let documents = load_documents(&root.path().join("corpus.txt")).expect("Failed to load");
    assert_eq!(documents.len(), 4);

    let bench = open(&paths);
    let stats = bench
        .aggregate_dataset_stats(&documents)
        .expect("Failed to aggregate");
    assert_eq!(stats.len(), 3);

    let merged = bench
        .run_tokenizer_benchmarks(&documents)
        .expect("Failed to run benchmarks");
    assert_eq!(merged.len(), 9);

    // "the cat sat on the mat" is entirely in the custom vocabulary
    let custom: Vec<_> = merged
        .iter()
        .filter(|row| row.tokenizer == CUSTOM_TOKENIZER_NAME)
        .collect();
    assert_eq!(custom[0].tokens.as_deref(), Some("the cat sat on the mat"));
    assert_eq!(custom[0].tokens_count, 6);
    assert_eq!(custom[1].tokens.as_deref(), Some("[UNK] [UNK] [UNK] [UNK]"));

    let nsl = bench
        .normalized_sequence_length()
        .expect("Failed to compute NSL")
        .expect("Custom tokenizer rows should exist");
    assert_eq!(nsl.len(), 9);
    for nsl_row in &nsl {
        let index = nsl_row.row.document_index;
        let expected = nsl_row.row.tokens_count as f64 / custom[index].tokens_count as f64;
        assert_eq!(nsl_row.nsl, expected, "NSL mismatch for {}", nsl_row.row.tokenizer);
    }

    let evaluation = &paths.evaluation;
    for file in [
        "tiktoken_gpt2_benchmark.csv",
        "tiktoken_cl100k_base_benchmark.csv",
        "CUSTOM tokenizer_benchmark.csv",
        "tokenizers_benchmark.csv",
        "NSL_benchmark.csv",
    ] {
        assert!(evaluation.join(file).is_file(), "{} should exist", file);
    }
    assert!(paths.datasets.join("dataset_statistics.csv").is_file());

    // Results survive reopening the database file
    drop(bench);
    let database = Database::init(paths.database_file.to_str().unwrap()).unwrap();
    assert_eq!(database.count_rows(DATASET_STATISTICS_TABLE).unwrap(), 3);
    assert_eq!(database.count_rows(OVERALL_BENCHMARK_TABLE).unwrap(), 9);
    assert_eq!(database.count_rows("tiktoken_gpt2").unwrap(), 3);
    assert_eq!(database.count_rows(NSL_TABLE).unwrap(), 9);
}

#[test]
fn test_run_without_custom_tokenizer_skips_nsl() {
    let (root, paths) = setup_project(
        r#"{ "TOKENIZERS": ["tiktoken/r50k_base"], "benchmarks": { "REDUCE_CSV_SIZE": true } }"#,
    );
    let documents = load_documents(&root.path().join("corpus.txt")).expect("Failed to load");

    let bench = open(&paths);
    let merged = bench
        .run_tokenizer_benchmarks(&documents)
        .expect("Failed to run benchmarks");
    assert_eq!(merged.len(), 4);
    assert!(merged.iter().all(|row| row.is_reduced()));
    assert!(!paths.evaluation.join("tokenizers_benchmark.csv").exists());

    assert!(bench.normalized_sequence_length().unwrap().is_none());
    assert!(!bench.database().table_exists(NSL_TABLE).unwrap());
}
