// Re-export modules for benchmarking and testing
pub mod benchmark;
pub mod config;
pub mod corpus;
pub mod database;
pub mod env;
pub mod export;
pub mod metrics;
pub mod tokenizer;
pub mod types;
