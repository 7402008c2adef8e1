use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Deserialize)]
struct JsonDocument {
    text: String,
}

/// Load the ordered document corpus from `path`.
///
/// - a directory: every `.txt` file is one document, sorted by file name
/// - a `.jsonl` file: the `text` field of each non-empty line
/// - anything else: each non-empty line is a document
pub fn load_documents(path: &Path) -> Result<Vec<String>> {
    let documents = if path.is_dir() {
        load_directory(path)?
    } else if path.extension().is_some_and(|ext| ext == "jsonl") {
        load_json_lines(path)?
    } else {
        load_lines(path)?
    };

    info!(path = %path.display(), "Loaded {} document(s)", documents.len());
    Ok(documents)
}

fn load_directory(dir: &Path) -> Result<Vec<String>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .context(format!("Failed to read corpus directory {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    files.retain(|file| file.is_file() && file.extension().is_some_and(|ext| ext == "txt"));
    files.sort();

    files
        .iter()
        .map(|file| {
            std::fs::read_to_string(file)
                .context(format!("Failed to read document {}", file.display()))
        })
        .collect()
}

fn open_lines(path: &Path) -> Result<impl Iterator<Item = std::io::Result<String>>> {
    let file =
        File::open(path).context(format!("Failed to open corpus file: {}", path.display()))?;
    Ok(BufReader::new(file).lines())
}

fn load_lines(path: &Path) -> Result<Vec<String>> {
    let mut documents = Vec::new();
    for line in open_lines(path)? {
        let line = line?;
        if !line.trim().is_empty() {
            documents.push(line);
        }
    }
    Ok(documents)
}

fn load_json_lines(path: &Path) -> Result<Vec<String>> {
    let mut documents = Vec::new();
    for (line_number, line) in open_lines(path)?.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let document: JsonDocument = serde_json::from_str(&line).context(format!(
            "Invalid JSON document at {}:{}",
            path.display(),
            line_number + 1
        ))?;
        documents.push(document.text);
    }
    Ok(documents)
}
